// =============================================================================
// TIDESWAP v1.2 - Transaction Assembler
// =============================================================================
//
// Builds the three linked transactions of a swap: the funding transaction
// that pays the P2SH contract, the refund transaction back to the sender,
// and the redeem transaction to the recipient.
//
// Every step returns a new transaction value; nothing is patched in place
// after the fee is known. Every validation (dust, missing output, secret
// mismatch, insufficient value) fires before any signature is produced.
//
// =============================================================================

use crate::address::decode_p2pkh_address;
use crate::chain::{ChainParams, DustPolicy, Utxo};
use crate::contract::{parse_contract, BuiltContract, SwapSpec};
use crate::fees::{
    dust_threshold, estimate_contract_serialize_size, estimate_redeem_serialize_size,
    estimate_refund_serialize_size, fee_for_serialize_size, is_dust_output,
};
use crate::script::{extract_p2sh_hash, hash160, pay_to_pubkey_hash, pay_to_script_hash};
use crate::secret::verify_secret;
use crate::swap::SwapError;
use crate::transaction::{MsgTx, OutPoint, TxIn, TxOut};
use crate::SECRET_SIZE;

/// Sequence value leaving the locktime check enabled (refund path)
const SEQUENCE_LOCKTIME_ENABLED: u32 = 0;

/// Final sequence value (locktime irrelevant, redeem path and funding)
const SEQUENCE_FINAL: u32 = 0xffff_ffff;

// =============================================================================
// Funding
// =============================================================================

/// Builds the contract-funding transaction: `spec.amount` to the contract's
/// P2SH address, remainder back to the change address.
///
/// Returns the unsigned transaction and its fee. The wallet signs the inputs
/// afterwards through the capability.
pub fn build_contract_tx(
    spec: &SwapSpec,
    built: &BuiltContract,
    funding: &[Utxo],
    change_address: &str,
    fee_per_kb: u64,
    min_relay_fee_per_kb: u64,
    dust_policy: DustPolicy,
    params: &ChainParams,
) -> Result<(MsgTx, u64), SwapError> {
    let contract_out = TxOut {
        value: spec.amount,
        pk_script: pay_to_script_hash(&built.script_hash),
    };
    if is_dust_output(&contract_out, min_relay_fee_per_kb) {
        return Err(SwapError::DustOutput {
            value: contract_out.value,
            threshold: dust_threshold(&contract_out, min_relay_fee_per_kb),
        });
    }

    let change_hash = decode_p2pkh_address(change_address, params)?;
    let change_script = pay_to_pubkey_hash(&change_hash);
    let change_shape = TxOut {
        value: 0,
        pk_script: change_script.clone(),
    };

    let size = estimate_contract_serialize_size(
        funding.len(),
        &[contract_out.clone(), change_shape.clone()],
        params.has_expiry,
    );
    let fee = fee_for_serialize_size(fee_per_kb, size);

    let total: u64 = funding.iter().map(|u| u.output.value).sum();
    let need = spec
        .amount
        .checked_add(fee)
        .ok_or_else(|| SwapError::Transaction("amount overflow".to_string()))?;
    if total < need {
        return Err(SwapError::InsufficientFunds { have: total, need });
    }

    let change_value = total - spec.amount - fee;
    let change_out = TxOut {
        value: change_value,
        pk_script: change_script,
    };

    let (outputs, fee) = if is_dust_output(&change_out, min_relay_fee_per_kb) {
        match dust_policy {
            DustPolicy::Reject => {
                return Err(SwapError::DustOutput {
                    value: change_value,
                    threshold: dust_threshold(&change_out, min_relay_fee_per_kb),
                })
            }
            // the whole remainder becomes fee
            DustPolicy::FoldIntoFee => (vec![contract_out], total - spec.amount),
        }
    } else {
        (vec![contract_out, change_out], fee)
    };

    let mut tx = MsgTx::new(params.tx_version, 0, params.has_expiry.then_some(0));
    tx.inputs = funding
        .iter()
        .map(|u| TxIn::new(u.outpoint, SEQUENCE_FINAL))
        .collect();
    tx.outputs = outputs;
    Ok((tx, fee))
}

// =============================================================================
// Locating the contract output
// =============================================================================

/// Finds the output of `contract_tx` whose locking script is the P2SH of
/// HASH160(contract). Returns the first matching index in output order.
pub fn locate_contract_output(contract: &[u8], contract_tx: &MsgTx) -> Result<usize, SwapError> {
    let contract_hash = hash160(contract);
    for (i, out) in contract_tx.outputs.iter().enumerate() {
        if extract_p2sh_hash(&out.pk_script) == Some(contract_hash) {
            return Ok(i);
        }
    }
    Err(SwapError::ContractOutputNotFound)
}

// =============================================================================
// Refund
// =============================================================================

/// Builds the unsigned refund transaction: spends the contract output back
/// to the sender hash embedded in the contract.
///
/// The locktime and sequence fields are set so the refund branch is only
/// satisfiable once the contract's locktime holds; construction itself never
/// checks ledger-side maturity.
pub fn build_refund_tx(
    contract: &[u8],
    contract_tx: &MsgTx,
    fee_per_kb: u64,
    min_relay_fee_per_kb: u64,
    expiry: Option<u32>,
    params: &ChainParams,
) -> Result<(MsgTx, u64), SwapError> {
    let pushes = parse_contract(contract)?;
    let index = locate_contract_output(contract, contract_tx)?;

    let out_script = pay_to_pubkey_hash(&pushes.sender_hash);
    let shape = TxOut {
        value: 0,
        pk_script: out_script.clone(),
    };
    let size = estimate_refund_serialize_size(contract, &[shape], params.has_expiry);
    let fee = fee_for_serialize_size(fee_per_kb, size);

    let contract_value = contract_tx.outputs[index].value;
    let value = contract_value
        .checked_sub(fee)
        .ok_or(SwapError::InsufficientFunds {
            have: contract_value,
            need: fee,
        })?;
    let output = TxOut {
        value,
        pk_script: out_script,
    };
    if is_dust_output(&output, min_relay_fee_per_kb) {
        return Err(SwapError::DustOutput {
            value,
            threshold: dust_threshold(&output, min_relay_fee_per_kb),
        });
    }

    let mut tx = MsgTx::new(params.tx_version, pushes.locktime, expiry);
    tx.inputs = vec![TxIn::new(
        OutPoint {
            txid: contract_tx.txid(),
            index: index as u32,
        },
        SEQUENCE_LOCKTIME_ENABLED,
    )];
    tx.outputs = vec![output];
    Ok((tx, fee))
}

// =============================================================================
// Redeem
// =============================================================================

/// Builds the unsigned redeem transaction: spends the contract output to
/// `out_script` (a fresh wallet address of the recipient).
///
/// The secret is checked against the contract's commitment before anything
/// else. The fee accounts for the redeem branch's larger signature script
/// (it carries the secret push).
pub fn build_redeem_tx(
    contract: &[u8],
    contract_tx: &MsgTx,
    secret: &[u8; SECRET_SIZE],
    out_script: Vec<u8>,
    fee_per_kb: u64,
    min_relay_fee_per_kb: u64,
    expiry: Option<u32>,
    params: &ChainParams,
) -> Result<(MsgTx, u64), SwapError> {
    let pushes = parse_contract(contract)?;
    if !verify_secret(secret, &pushes.secret_hash) {
        return Err(SwapError::SecretMismatch);
    }
    let index = locate_contract_output(contract, contract_tx)?;

    let shape = TxOut {
        value: 0,
        pk_script: out_script.clone(),
    };
    let size = estimate_redeem_serialize_size(contract, &[shape], params.has_expiry);
    let fee = fee_for_serialize_size(fee_per_kb, size);

    let contract_value = contract_tx.outputs[index].value;
    let value = contract_value
        .checked_sub(fee)
        .ok_or(SwapError::InsufficientFunds {
            have: contract_value,
            need: fee,
        })?;
    let output = TxOut {
        value,
        pk_script: out_script,
    };
    if is_dust_output(&output, min_relay_fee_per_kb) {
        return Err(SwapError::DustOutput {
            value,
            threshold: dust_threshold(&output, min_relay_fee_per_kb),
        });
    }

    let mut tx = MsgTx::new(params.tx_version, pushes.locktime, expiry);
    tx.inputs = vec![TxIn::new(
        OutPoint {
            txid: contract_tx.txid(),
            index: index as u32,
        },
        SEQUENCE_FINAL,
    )];
    tx.outputs = vec![output];
    Ok((tx, fee))
}

// =============================================================================
// Tests
// =============================================================================
