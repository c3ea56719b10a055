// =============================================================================
// TIDESWAP v1.0 - Contract Builder
// =============================================================================
//
// Derives the hashed-timelock redeem script and its P2SH address from a swap
// specification. Build is a pure function: identical spec and sender hash
// always yield byte-identical contract and address.
//
// The redeem script is never persisted separately; refund and redeem re-parse
// it from raw contract bytes supplied by the caller, so `parse_contract` is
// the exact inverse of `build_contract` on every shared field.
//
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::address::{decode_p2pkh_address, encode_p2sh};
use crate::chain::ChainParams;
use crate::script::{atomic_swap_script, extract_contract, hash160, ContractPushes};
use crate::swap::SwapError;
use crate::transaction::MsgTx;
use crate::HASH_SIZE;

// =============================================================================
// Swap specification
// =============================================================================

/// Immutable parameters of one side of a swap
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSpec {
    /// Counterparty P2PKH address on this ledger
    pub recipient: String,
    /// Contract value in base units
    pub amount: u64,
    /// Absolute locktime (timestamp or block height per chain params)
    pub locktime: u32,
    /// Double-SHA-256 commitment of the swap secret
    pub secret_hash: [u8; HASH_SIZE],
}

/// Fields recovered by strict-parsing raw contract bytes
pub type ParsedContract = ContractPushes;

/// Parses raw contract bytes against the exact expected template
pub fn parse_contract(raw: &[u8]) -> Result<ParsedContract, SwapError> {
    extract_contract(raw)
}

// =============================================================================
// Built artifacts
// =============================================================================

/// The contract script and its P2SH identity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltContract {
    pub redeem_script: Vec<u8>,
    pub script_hash: [u8; 20],
    pub p2sh_address: String,
}

/// Everything initiation produces. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltSwap {
    pub spec: SwapSpec,
    pub contract: Vec<u8>,
    pub contract_p2sh: String,
    pub contract_tx: MsgTx,
    pub contract_fee: u64,
    pub refund_tx: MsgTx,
    pub refund_fee: u64,
}

// =============================================================================
// Builder
// =============================================================================

/// Builds the redeem script and P2SH address for a spec.
///
/// The sender hash comes from the signing context (a fresh wallet address),
/// not from the spec itself. Fails with AddressType when the recipient is
/// not a P2PKH address for this chain.
pub fn build_contract(
    spec: &SwapSpec,
    sender_hash: &[u8; 20],
    params: &ChainParams,
) -> Result<BuiltContract, SwapError> {
    let recipient_hash = decode_p2pkh_address(&spec.recipient, params)?;
    let redeem_script = atomic_swap_script(
        &spec.secret_hash,
        &recipient_hash,
        sender_hash,
        spec.locktime,
    );
    let script_hash = hash160(&redeem_script);
    let p2sh_address = encode_p2sh(&script_hash, params);
    Ok(BuiltContract {
        redeem_script,
        script_hash,
        p2sh_address,
    })
}
