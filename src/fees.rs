// =============================================================================
// TIDESWAP v1.2 - Fee & Dust Arithmetic
// =============================================================================
//
// Fee rates arrive as units-per-kilobyte from the wallet. Fees are computed
// from estimated serialized sizes BEFORE any signature exists, so the
// estimates use worst-case signature and pubkey sizes.
//
// =============================================================================

use crate::transaction::{varint_size, TxOut};

// =============================================================================
// Constants
// =============================================================================

/// Worst-case DER signature size including the appended hashtype byte
pub const SIGNATURE_SIZE: usize = 73;

/// Serialized compressed public key size
pub const PUBKEY_SIZE: usize = 33;

/// Serialized size of a typical P2PKH-spending input:
/// outpoint (36) + script varint (1) + sigScript (107) + sequence (4)
pub const REDEEM_P2PKH_INPUT_SIZE: usize = 148;

/// Relay-policy multiplier used by the dust rule
pub const DUST_MULTIPLIER: u64 = 3;

// =============================================================================
// Fee rates
// =============================================================================

/// Fee per byte from a per-kilobyte rate, rounded up
pub fn fee_per_byte(fee_per_kb: u64) -> u64 {
    (fee_per_kb + 999) / 1000
}

/// Absolute fee for a serialized size at a per-kilobyte rate.
/// Monotonically non-decreasing in both arguments; zero size is free.
pub fn fee_for_serialize_size(fee_per_kb: u64, size: usize) -> u64 {
    size as u64 * fee_per_byte(fee_per_kb)
}

/// Effective per-kilobyte rate of an absolute fee over a serialized size
/// (report output)
pub fn calc_fee_per_kb(fee: u64, size: usize) -> u64 {
    if size == 0 {
        0
    } else {
        fee * 1000 / size as u64
    }
}

// =============================================================================
// Dust
// =============================================================================

/// An output is dust when its value, scaled to per-kilobyte terms, cannot
/// pay the relay fee for itself plus a typical redeeming input:
///
///   value * 1000 < min_relay_fee_per_kb * 3 * (out_size + 148)
///
/// Strict `<`: a value exactly on the threshold is NOT dust. Values and
/// relay rates come from untrusted transaction hex, so the comparison is
/// done in u128 where neither side can overflow.
pub fn is_dust_output(output: &TxOut, min_relay_fee_per_kb: u64) -> bool {
    let total_size = (output.serialize_size() + REDEEM_P2PKH_INPUT_SIZE) as u128;
    (output.value as u128) * 1000
        < (min_relay_fee_per_kb as u128) * (DUST_MULTIPLIER as u128) * total_size
}

/// Smallest non-dust value for an output's shape under a relay rate,
/// saturating at u64::MAX
pub fn dust_threshold(output: &TxOut, min_relay_fee_per_kb: u64) -> u64 {
    let total_size = (output.serialize_size() + REDEEM_P2PKH_INPUT_SIZE) as u128;
    let scaled = (min_relay_fee_per_kb as u128) * (DUST_MULTIPLIER as u128) * total_size;
    u64::try_from((scaled + 999) / 1000).unwrap_or(u64::MAX)
}

// =============================================================================
// Serialized-size estimation
// =============================================================================

/// Size of a minimal data push including its length prefix
pub fn push_data_size(len: usize) -> usize {
    if len <= 75 {
        1 + len
    } else if len <= 0xff {
        2 + len
    } else if len <= 0xffff {
        3 + len
    } else {
        5 + len
    }
}

/// Signature script size for the redeem branch:
/// <sig> <pubkey> <secret> OP_TRUE <contract>
pub fn redeem_sig_script_size(contract: &[u8]) -> usize {
    push_data_size(SIGNATURE_SIZE)
        + push_data_size(PUBKEY_SIZE)
        + push_data_size(crate::SECRET_SIZE)
        + 1
        + push_data_size(contract.len())
}

/// Signature script size for the refund branch:
/// <sig> <pubkey> OP_FALSE <contract>
pub fn refund_sig_script_size(contract: &[u8]) -> usize {
    push_data_size(SIGNATURE_SIZE) + push_data_size(PUBKEY_SIZE) + 1 + push_data_size(contract.len())
}

fn input_size(sig_script_size: usize) -> usize {
    36 + varint_size(sig_script_size as u64) + sig_script_size + 4
}

fn tx_overhead(n_inputs: usize, n_outputs: usize, has_expiry: bool) -> usize {
    4 + varint_size(n_inputs as u64)
        + varint_size(n_outputs as u64)
        + 4
        + if has_expiry { 4 } else { 0 }
}

fn output_sizes(outputs: &[TxOut]) -> usize {
    outputs.iter().map(|o| o.serialize_size()).sum()
}

/// Estimated size of a redeem transaction spending one contract output
pub fn estimate_redeem_serialize_size(
    contract: &[u8],
    outputs: &[TxOut],
    has_expiry: bool,
) -> usize {
    tx_overhead(1, outputs.len(), has_expiry)
        + input_size(redeem_sig_script_size(contract))
        + output_sizes(outputs)
}

/// Estimated size of a refund transaction spending one contract output
pub fn estimate_refund_serialize_size(
    contract: &[u8],
    outputs: &[TxOut],
    has_expiry: bool,
) -> usize {
    tx_overhead(1, outputs.len(), has_expiry)
        + input_size(refund_sig_script_size(contract))
        + output_sizes(outputs)
}

/// Estimated size of a funding transaction with typical P2PKH inputs
pub fn estimate_contract_serialize_size(
    n_inputs: usize,
    outputs: &[TxOut],
    has_expiry: bool,
) -> usize {
    tx_overhead(n_inputs, outputs.len(), has_expiry)
        + n_inputs * REDEEM_P2PKH_INPUT_SIZE
        + output_sizes(outputs)
}

// =============================================================================
// Tests
// =============================================================================
