// =============================================================================
// TIDESWAP v1.0 - Address Utilities
// =============================================================================
//
// Base58check encoding/decoding for P2PKH and P2SH addresses. Version bytes
// come from the chain parameters, never from a global.
//
// =============================================================================

use secp256k1::PublicKey;
use sha2::{Digest, Sha256};

use crate::chain::ChainParams;
use crate::script::hash160;
use crate::swap::SwapError;

/// Script type behind an address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    PubkeyHash,
    ScriptHash,
}

/// Encodes a 20-byte hash160 as a base58check P2PKH address
pub fn encode_p2pkh(hash: &[u8; 20], params: &ChainParams) -> String {
    base58check(params.p2pkh_version, hash)
}

/// Encodes a 20-byte script hash as a base58check P2SH address
pub fn encode_p2sh(hash: &[u8; 20], params: &ChainParams) -> String {
    base58check(params.p2sh_version, hash)
}

fn base58check(version: u8, hash: &[u8; 20]) -> String {
    let mut versioned = vec![version];
    versioned.extend_from_slice(hash);
    let checksum = Sha256::digest(Sha256::digest(&versioned));
    versioned.extend_from_slice(&checksum[..4]);
    bs58::encode(versioned).into_string()
}

/// Decodes a base58check address, validating length, checksum and the
/// chain's version byte
pub fn decode_address(
    address: &str,
    params: &ChainParams,
) -> Result<(AddressKind, [u8; 20]), SwapError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| SwapError::AddressType(format!("invalid base58: {}", e)))?;

    if decoded.len() != 25 {
        return Err(SwapError::AddressType(format!(
            "invalid address length: {}",
            decoded.len()
        )));
    }

    let payload = &decoded[..21];
    let checksum = &decoded[21..];
    let computed = Sha256::digest(Sha256::digest(payload));
    if &computed[..4] != checksum {
        return Err(SwapError::AddressType("invalid address checksum".to_string()));
    }

    let kind = if decoded[0] == params.p2pkh_version {
        AddressKind::PubkeyHash
    } else if decoded[0] == params.p2sh_version {
        AddressKind::ScriptHash
    } else {
        return Err(SwapError::AddressType(format!(
            "unknown version byte 0x{:02x} for {}",
            decoded[0], params.name
        )));
    };

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&decoded[1..21]);
    Ok((kind, hash))
}

/// Decodes an address and requires it to be P2PKH.
///
/// Contracts only support pay-to-pubkey-hash counterparties: both spending
/// branches of the template end in a single pubkey-hash check.
pub fn decode_p2pkh_address(
    address: &str,
    params: &ChainParams,
) -> Result<[u8; 20], SwapError> {
    match decode_address(address, params)? {
        (AddressKind::PubkeyHash, hash) => Ok(hash),
        (AddressKind::ScriptHash, _) => Err(SwapError::AddressType(
            "expected a P2PKH address, got P2SH".to_string(),
        )),
    }
}

/// Hash160 of a serialized (compressed) public key
pub fn pubkey_hash(pubkey: &PublicKey) -> [u8; 20] {
    hash160(&pubkey.serialize())
}
