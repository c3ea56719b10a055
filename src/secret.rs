// =============================================================================
// TIDESWAP v1.2 - Swap Secrets
// =============================================================================
//
// The atomicity primitive: a 32-byte secret whose double-SHA-256 commitment
// is embedded in both contracts. Revealing the secret on one chain lets the
// counterparty redeem on the other.
//
// =============================================================================

use sha2::{Digest, Sha256};

use crate::swap::SwapError;
use crate::{HASH_SIZE, SECRET_SIZE};

/// Generate a random secret from the OS CSPRNG.
///
/// This is the one non-deterministic operation in the engine.
pub fn generate_secret() -> [u8; SECRET_SIZE] {
    rand::random()
}

/// Commitment hash of a secret: double SHA-256
pub fn hash_secret(secret: &[u8; SECRET_SIZE]) -> [u8; HASH_SIZE] {
    let first = Sha256::digest(secret);
    let second = Sha256::digest(first);
    second.into()
}

/// Validate an externally supplied secret (e.g. from a hex argument)
pub fn accept_secret(external: &[u8]) -> Result<[u8; SECRET_SIZE], SwapError> {
    if external.len() != SECRET_SIZE {
        return Err(SwapError::InvalidSecret(external.len()));
    }
    let mut secret = [0u8; SECRET_SIZE];
    secret.copy_from_slice(external);
    Ok(secret)
}

/// Verify a secret against a commitment hash
pub fn verify_secret(secret: &[u8; SECRET_SIZE], hash: &[u8; HASH_SIZE]) -> bool {
    &hash_secret(secret) == hash
}
