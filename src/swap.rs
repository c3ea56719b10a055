// =============================================================================
// TIDESWAP v1.2 - Swap Pipeline
// =============================================================================
//
// The three top-level operations of an atomic swap on one ledger:
//
//   initiate  generate/accept a secret, build the contract, fund it,
//             pre-sign the refund
//   redeem    counterparty claims the contract output with the secret
//   refund    initiator reclaims the contract output after the locktime
//
// Every ledger and wallet interaction goes through the `WalletClient`
// capability. The functions hold no state of their own.
//
// =============================================================================

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::address::{decode_p2pkh_address, encode_p2pkh};
use crate::assembler::{build_contract_tx, build_redeem_tx, build_refund_tx};
use crate::chain::{ChainParams, DustPolicy, LocktimeKind, Utxo, WalletClient};
use crate::contract::{build_contract, parse_contract, BuiltSwap, SwapSpec};
use crate::fees::calc_fee_per_kb;
use crate::script::pay_to_pubkey_hash;
use crate::secret::{accept_secret, generate_secret, hash_secret};
use crate::signer::{sign_contract_input, Branch};
use crate::transaction::{decode_transaction, MsgTx};
use crate::{EXPIRY_WINDOW_BLOCKS, SECRET_SIZE};

// =============================================================================
// Errors
// =============================================================================

/// Everything that can go wrong while building or spending a swap contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapError {
    /// An address decoded to a type the operation cannot use
    AddressType(String),
    /// Contract bytes do not match the swap template exactly
    MalformedContract(String),
    /// No output of the funding transaction pays the contract's P2SH hash
    ContractOutputNotFound,
    /// An output falls below the relay dust threshold
    DustOutput { value: u64, threshold: u64 },
    /// The revealed secret does not hash to the contract's commitment
    SecretMismatch,
    /// A supplied secret has the wrong length
    InvalidSecret(usize),
    /// The wallet cannot cover the contract amount plus fee
    InsufficientFunds { have: u64, need: u64 },
    /// Transaction wire decoding or construction failed
    Transaction(String),
    /// The wallet capability reported a failure
    Wallet(String),
}

impl fmt::Display for SwapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapError::AddressType(msg) => write!(f, "unusable address type: {}", msg),
            SwapError::MalformedContract(msg) => write!(f, "malformed contract: {}", msg),
            SwapError::ContractOutputNotFound => {
                write!(f, "transaction does not contain the contract output")
            }
            SwapError::DustOutput { value, threshold } => write!(
                f,
                "output value {} is dust (threshold {})",
                value, threshold
            ),
            SwapError::SecretMismatch => {
                write!(f, "secret does not hash to the contract commitment")
            }
            SwapError::InvalidSecret(len) => write!(
                f,
                "secret must be {} bytes, got {}",
                SECRET_SIZE, len
            ),
            SwapError::InsufficientFunds { have, need } => {
                write!(f, "insufficient funds: have {}, need {}", have, need)
            }
            SwapError::Transaction(msg) => write!(f, "transaction error: {}", msg),
            SwapError::Wallet(msg) => write!(f, "wallet error: {}", msg),
        }
    }
}

impl std::error::Error for SwapError {}

// =============================================================================
// Helpers
// =============================================================================

fn refund_locktime(wallet: &dyn WalletClient, params: &ChainParams) -> Result<u32, SwapError> {
    let locktime = match params.locktime_kind {
        LocktimeKind::Timestamp => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| SwapError::Transaction(format!("system clock: {}", e)))?
                .as_secs();
            now + params.refund_window_secs
        }
        LocktimeKind::BlockHeight => wallet.chain_height()? + params.refund_window_blocks,
    };
    u32::try_from(locktime)
        .map_err(|_| SwapError::Transaction(format!("locktime {} out of range", locktime)))
}

fn spend_expiry(wallet: &dyn WalletClient, params: &ChainParams) -> Result<Option<u32>, SwapError> {
    if !params.has_expiry {
        return Ok(None);
    }
    let expiry = wallet.chain_height()? + EXPIRY_WINDOW_BLOCKS;
    let expiry = u32::try_from(expiry)
        .map_err(|_| SwapError::Transaction(format!("expiry {} out of range", expiry)))?;
    Ok(Some(expiry))
}

fn decode_contract_hex(contract_hex: &str) -> Result<Vec<u8>, SwapError> {
    hex::decode(contract_hex)
        .map_err(|e| SwapError::MalformedContract(format!("contract hex: {}", e)))
}

fn decode_tx_hex(tx_hex: &str, params: &ChainParams) -> Result<MsgTx, SwapError> {
    Ok(decode_transaction(tx_hex, params)?.into_tx())
}

/// Grows the input set one UTXO at a time until the funding transaction
/// covers amount plus fee at the quoted rate.
fn fund_contract_tx(
    spec: &SwapSpec,
    built: &crate::contract::BuiltContract,
    change_address: &str,
    fee_per_kb: u64,
    min_relay_fee_per_kb: u64,
    dust_policy: DustPolicy,
    wallet: &dyn WalletClient,
    params: &ChainParams,
) -> Result<(MsgTx, u64), SwapError> {
    let mut unspent = wallet.unspent_outputs()?.into_iter();
    let mut selected: Vec<Utxo> = Vec::new();
    loop {
        match build_contract_tx(
            spec,
            built,
            &selected,
            change_address,
            fee_per_kb,
            min_relay_fee_per_kb,
            dust_policy,
            params,
        ) {
            Ok(pair) => return Ok(pair),
            Err(SwapError::InsufficientFunds { have, need }) => match unspent.next() {
                Some(utxo) => selected.push(utxo),
                None => return Err(SwapError::InsufficientFunds { have, need }),
            },
            Err(err) => return Err(err),
        }
    }
}

// =============================================================================
// Initiate
// =============================================================================

/// Starts a swap on this ledger: commits to a secret, builds and funds the
/// contract, and pre-signs the refund transaction.
///
/// `preset_secret` lets the participating side reuse the initiator's secret
/// hash path; when `None` a fresh secret comes from the CSPRNG. Returns the
/// secret alongside every artifact the initiator must persist.
pub fn initiate(
    recipient: &str,
    amount: u64,
    preset_secret: Option<&[u8]>,
    wallet: &dyn WalletClient,
    params: &ChainParams,
    dust_policy: DustPolicy,
) -> Result<([u8; SECRET_SIZE], BuiltSwap), SwapError> {
    let secret = match preset_secret {
        Some(bytes) => accept_secret(bytes)?,
        None => generate_secret(),
    };
    let secret_hash = hash_secret(&secret);

    let locktime = refund_locktime(wallet, params)?;
    let change_address = wallet.change_address()?;
    let sender_hash = decode_p2pkh_address(&change_address, params)?;

    let spec = SwapSpec {
        recipient: recipient.to_string(),
        amount,
        locktime,
        secret_hash,
    };
    let built = build_contract(&spec, &sender_hash, params)?;

    let (fee_per_kb, min_relay) = wallet.fee_rates()?;
    let (contract_tx, contract_fee) = fund_contract_tx(
        &spec,
        &built,
        &change_address,
        fee_per_kb,
        min_relay,
        dust_policy,
        wallet,
        params,
    )?;
    let contract_tx = wallet.sign_transaction(&contract_tx)?;

    let expiry = spend_expiry(wallet, params)?;
    let (refund_tx, refund_fee) = build_refund_tx(
        &built.redeem_script,
        &contract_tx,
        fee_per_kb,
        min_relay,
        expiry,
        params,
    )?;
    let refund_address = encode_p2pkh(&sender_hash, params);
    let refund_sig = sign_contract_input(
        &refund_tx,
        0,
        &built.redeem_script,
        Branch::Refund,
        None,
        &refund_address,
        wallet,
        params,
    )?;
    let refund_tx = refund_tx.with_input_sig_script(0, refund_sig);

    log::info!(
        "swap initiated: contract {} funded with {} {} (fee {}), refund ready (fee {})",
        built.p2sh_address,
        crate::format_amount(amount, params.decimals),
        params.unit,
        contract_fee,
        refund_fee
    );

    let swap = BuiltSwap {
        spec,
        contract: built.redeem_script,
        contract_p2sh: built.p2sh_address,
        contract_tx,
        contract_fee,
        refund_tx,
        refund_fee,
    };
    Ok((secret, swap))
}

// =============================================================================
// Redeem
// =============================================================================

/// Claims a contract output with the revealed secret. Pays a fresh wallet
/// address; signs with the key behind the contract's recipient hash.
///
/// Returns the fully signed redeem transaction and its fee, plus the actual
/// fee rate for reporting.
pub fn redeem(
    contract_hex: &str,
    contract_tx_hex: &str,
    secret_hex: &str,
    wallet: &dyn WalletClient,
    params: &ChainParams,
) -> Result<(MsgTx, u64), SwapError> {
    let contract = decode_contract_hex(contract_hex)?;
    let contract_tx = decode_tx_hex(contract_tx_hex, params)?;
    let secret_bytes = hex::decode(secret_hex)
        .map_err(|e| SwapError::Transaction(format!("secret hex: {}", e)))?;
    let secret = accept_secret(&secret_bytes)?;

    let pushes = parse_contract(&contract)?;
    let change_address = wallet.change_address()?;
    let out_hash = decode_p2pkh_address(&change_address, params)?;
    let out_script = pay_to_pubkey_hash(&out_hash);

    let (fee_per_kb, min_relay) = wallet.fee_rates()?;
    let expiry = spend_expiry(wallet, params)?;
    let (tx, fee) = build_redeem_tx(
        &contract,
        &contract_tx,
        &secret,
        out_script,
        fee_per_kb,
        min_relay,
        expiry,
        params,
    )?;

    let sign_address = encode_p2pkh(&pushes.recipient_hash, params);
    let sig_script = sign_contract_input(
        &tx,
        0,
        &contract,
        Branch::Redeem,
        Some(&secret),
        &sign_address,
        wallet,
        params,
    )?;
    let tx = tx.with_input_sig_script(0, sig_script);

    log::info!(
        "redeem transaction {} built (fee {}, {} per kB)",
        tx.txid_hex(),
        fee,
        actual_fee_per_kb(&tx, fee)
    );
    Ok((tx, fee))
}

// =============================================================================
// Refund
// =============================================================================

/// Reclaims a contract output through the locktime branch. Never needs or
/// touches the secret. Pays the sender hash embedded in the contract; the
/// transaction only confirms once the contract's locktime holds.
pub fn refund(
    contract_hex: &str,
    contract_tx_hex: &str,
    wallet: &dyn WalletClient,
    params: &ChainParams,
) -> Result<(MsgTx, u64), SwapError> {
    let contract = decode_contract_hex(contract_hex)?;
    let contract_tx = decode_tx_hex(contract_tx_hex, params)?;
    let pushes = parse_contract(&contract)?;

    let (fee_per_kb, min_relay) = wallet.fee_rates()?;
    let expiry = spend_expiry(wallet, params)?;
    let (tx, fee) = build_refund_tx(
        &contract,
        &contract_tx,
        fee_per_kb,
        min_relay,
        expiry,
        params,
    )?;

    let sign_address = encode_p2pkh(&pushes.sender_hash, params);
    let sig_script = sign_contract_input(
        &tx,
        0,
        &contract,
        Branch::Refund,
        None,
        &sign_address,
        wallet,
        params,
    )?;
    let tx = tx.with_input_sig_script(0, sig_script);

    // the refund path never sees the secret, so nothing secret can leak here
    log::info!(
        "refund transaction {} built (fee {}, locktime {})",
        tx.txid_hex(),
        fee,
        tx.locktime
    );
    Ok((tx, fee))
}

/// Actual fee rate of a built transaction, for operator reporting
pub fn actual_fee_per_kb(tx: &MsgTx, fee: u64) -> u64 {
    calc_fee_per_kb(fee, tx.serialize_size())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::pubkey_hash;
    use crate::assembler::locate_contract_output;
    use crate::script::{OpCode, Script};
    use crate::signer::{signature_hash, SIG_HASH_ALL};
    use crate::transaction::{OutPoint, TxOut};
    use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

    /// In-memory wallet with one fixed key and configurable UTXOs.
    /// Signs with real ECDSA over the legacy SIGHASH_ALL digest.
    struct MockWallet {
        key: SecretKey,
        utxos: Vec<Utxo>,
        height: u64,
    }

    impl MockWallet {
        fn new(seed: u8, values: &[u64]) -> Self {
            let key = SecretKey::from_slice(&[seed; 32]).unwrap();
            let hash = pubkey_hash(&PublicKey::from_secret_key(&Secp256k1::new(), &key));
            let utxos = values
                .iter()
                .enumerate()
                .map(|(i, &value)| Utxo {
                    outpoint: OutPoint {
                        txid: [seed.wrapping_add(i as u8); 32],
                        index: i as u32,
                    },
                    output: TxOut {
                        value,
                        pk_script: pay_to_pubkey_hash(&hash),
                    },
                })
                .collect();
            MockWallet {
                key,
                utxos,
                height: 650_000,
            }
        }

        fn own_hash(&self) -> [u8; 20] {
            pubkey_hash(&PublicKey::from_secret_key(&Secp256k1::new(), &self.key))
        }
    }

    impl WalletClient for MockWallet {
        fn unspent_outputs(&self) -> Result<Vec<Utxo>, SwapError> {
            Ok(self.utxos.clone())
        }

        fn change_address(&self) -> Result<String, SwapError> {
            Ok(encode_p2pkh(&self.own_hash(), &ChainParams::bitcoin()))
        }

        fn fee_rates(&self) -> Result<(u64, u64), SwapError> {
            Ok((10_000, 1_000))
        }

        fn chain_height(&self) -> Result<u64, SwapError> {
            Ok(self.height)
        }

        fn sign_input(
            &self,
            tx: &MsgTx,
            index: usize,
            script: &[u8],
            _address: &str,
        ) -> Result<(Vec<u8>, Vec<u8>), SwapError> {
            let digest = signature_hash(tx, index, script);
            let secp = Secp256k1::new();
            let msg = Message::from_digest(digest);
            let mut sig = secp.sign_ecdsa(&msg, &self.key).serialize_der().to_vec();
            sig.push(SIG_HASH_ALL as u8);
            let pubkey = PublicKey::from_secret_key(&secp, &self.key);
            Ok((sig, pubkey.serialize().to_vec()))
        }

        fn sign_transaction(&self, tx: &MsgTx) -> Result<MsgTx, SwapError> {
            // placeholder scripts keep the size honest without full P2PKH logic
            let mut signed = tx.clone();
            for input in &mut signed.inputs {
                input.sig_script = vec![0x00; 106];
            }
            Ok(signed)
        }
    }

    const AMOUNT: u64 = 100_000_000;

    fn initiate_swap(wallet: &MockWallet) -> ([u8; 32], BuiltSwap) {
        let recipient = encode_p2pkh(&[0x11; 20], &ChainParams::bitcoin());
        initiate(
            &recipient,
            AMOUNT,
            Some(&[0x5a; 32]),
            wallet,
            &ChainParams::bitcoin(),
            DustPolicy::Reject,
        )
        .unwrap()
    }

    #[test]
    fn test_initiate_builds_consistent_artifacts() {
        let wallet = MockWallet::new(0x42, &[150_000_000]);
        let (secret, swap) = initiate_swap(&wallet);

        assert_eq!(secret, [0x5a; 32]);
        assert_eq!(swap.spec.secret_hash, hash_secret(&secret));

        // contract output present and funded with the full amount
        let index = locate_contract_output(&swap.contract, &swap.contract_tx).unwrap();
        assert_eq!(swap.contract_tx.outputs[index].value, AMOUNT);

        // refund spends that exact outpoint back to the wallet
        assert_eq!(
            swap.refund_tx.inputs[0].outpoint,
            OutPoint {
                txid: swap.contract_tx.txid(),
                index: index as u32,
            }
        );
        assert_eq!(
            swap.refund_tx.outputs[0].pk_script,
            pay_to_pubkey_hash(&wallet.own_hash())
        );
        assert_eq!(swap.refund_tx.outputs[0].value, AMOUNT - swap.refund_fee);

        // locktime fields armed for the refund branch
        let pushes = parse_contract(&swap.contract).unwrap();
        assert_eq!(swap.refund_tx.locktime, pushes.locktime);
        assert_eq!(swap.refund_tx.inputs[0].sequence, 0);

        // refund sig script already attached: <sig> <pubkey> OP_FALSE <contract>
        let sig_script = Script::from_bytes(&swap.refund_tx.inputs[0].sig_script).unwrap();
        assert_eq!(sig_script.ops.len(), 4);
        assert_eq!(sig_script.ops[2], OpCode::Op0);
        assert_eq!(sig_script.ops[3], OpCode::OpPushData(swap.contract.clone()));
    }

    #[test]
    fn test_initiate_selects_across_multiple_utxos() {
        let wallet = MockWallet::new(0x42, &[40_000_000, 40_000_000, 40_000_000]);
        let (_, swap) = initiate_swap(&wallet);
        assert_eq!(swap.contract_tx.inputs.len(), 3);
        let input_sum: u64 = wallet.utxos.iter().map(|u| u.output.value).sum();
        assert_eq!(
            swap.contract_tx.output_sum() + swap.contract_fee,
            input_sum
        );
    }

    #[test]
    fn test_initiate_insufficient_funds() {
        let wallet = MockWallet::new(0x42, &[50_000_000]);
        let recipient = encode_p2pkh(&[0x11; 20], &ChainParams::bitcoin());
        let result = initiate(
            &recipient,
            AMOUNT,
            None,
            &wallet,
            &ChainParams::bitcoin(),
            DustPolicy::Reject,
        );
        assert!(matches!(result, Err(SwapError::InsufficientFunds { .. })));
    }

    #[test]
    fn test_initiate_rejects_short_preset_secret() {
        let wallet = MockWallet::new(0x42, &[150_000_000]);
        let recipient = encode_p2pkh(&[0x11; 20], &ChainParams::bitcoin());
        let result = initiate(
            &recipient,
            AMOUNT,
            Some(&[0x5a; 16]),
            &wallet,
            &ChainParams::bitcoin(),
            DustPolicy::Reject,
        );
        assert_eq!(result.unwrap_err(), SwapError::InvalidSecret(16));
    }

    #[test]
    fn test_initiate_rejects_p2sh_recipient() {
        let wallet = MockWallet::new(0x42, &[150_000_000]);
        let recipient = crate::address::encode_p2sh(&[0x11; 20], &ChainParams::bitcoin());
        let result = initiate(
            &recipient,
            AMOUNT,
            None,
            &wallet,
            &ChainParams::bitcoin(),
            DustPolicy::Reject,
        );
        assert!(matches!(result, Err(SwapError::AddressType(_))));
    }

    #[test]
    fn test_redeem_spends_contract_output() {
        let initiator = MockWallet::new(0x42, &[150_000_000]);
        let (secret, swap) = initiate_swap(&initiator);

        // the counterparty redeems with a different wallet
        let redeemer = MockWallet::new(0x43, &[]);
        let contract_hex = hex::encode(&swap.contract);
        let tx_hex = hex::encode(swap.contract_tx.serialize());
        let secret_hex = hex::encode(secret);

        let (tx, fee) = redeem(
            &contract_hex,
            &tx_hex,
            &secret_hex,
            &redeemer,
            &ChainParams::bitcoin(),
        )
        .unwrap();

        let index = locate_contract_output(&swap.contract, &swap.contract_tx).unwrap();
        assert_eq!(
            tx.inputs[0].outpoint,
            OutPoint {
                txid: swap.contract_tx.txid(),
                index: index as u32,
            }
        );
        assert_eq!(tx.outputs[0].value, AMOUNT - fee);
        assert_eq!(
            tx.outputs[0].pk_script,
            pay_to_pubkey_hash(&redeemer.own_hash())
        );

        // <sig> <pubkey> <secret> OP_TRUE <contract>
        let sig_script = Script::from_bytes(&tx.inputs[0].sig_script).unwrap();
        assert_eq!(sig_script.ops.len(), 5);
        assert_eq!(sig_script.ops[2], OpCode::OpPushData(secret.to_vec()));
        assert_eq!(sig_script.ops[3], OpCode::OpTrue);
        assert_eq!(sig_script.ops[4], OpCode::OpPushData(swap.contract.clone()));

        // fee was computed from a worst-case size estimate
        assert!(actual_fee_per_kb(&tx, fee) >= 10_000);
    }

    #[test]
    fn test_redeem_rejects_wrong_secret() {
        let initiator = MockWallet::new(0x42, &[150_000_000]);
        let (_, swap) = initiate_swap(&initiator);

        let redeemer = MockWallet::new(0x43, &[]);
        let result = redeem(
            &hex::encode(&swap.contract),
            &hex::encode(swap.contract_tx.serialize()),
            &hex::encode([0x5b; 32]),
            &redeemer,
            &ChainParams::bitcoin(),
        );
        assert_eq!(result.unwrap_err(), SwapError::SecretMismatch);
    }

    #[test]
    fn test_redeem_rejects_bad_contract_hex() {
        let wallet = MockWallet::new(0x42, &[]);
        let result = redeem(
            "zz",
            "00",
            &hex::encode([0x5a; 32]),
            &wallet,
            &ChainParams::bitcoin(),
        );
        assert!(matches!(result, Err(SwapError::MalformedContract(_))));
    }

    #[test]
    fn test_refund_constructible_before_maturity() {
        let initiator = MockWallet::new(0x42, &[150_000_000]);
        let (_, swap) = initiate_swap(&initiator);

        // construction consults only the transactions, never the clock
        let (tx, fee) = refund(
            &hex::encode(&swap.contract),
            &hex::encode(swap.contract_tx.serialize()),
            &initiator,
            &ChainParams::bitcoin(),
        )
        .unwrap();

        let pushes = parse_contract(&swap.contract).unwrap();
        assert_eq!(tx.locktime, pushes.locktime);
        assert_eq!(tx.inputs[0].sequence, 0);
        assert_eq!(tx.outputs[0].value, AMOUNT - fee);
        assert_eq!(
            tx.outputs[0].pk_script,
            pay_to_pubkey_hash(&pushes.sender_hash)
        );
    }

    #[test]
    fn test_refund_missing_contract_output() {
        let initiator = MockWallet::new(0x42, &[150_000_000]);
        let (_, swap) = initiate_swap(&initiator);

        // an unrelated transaction carries no contract output
        let mut other = swap.contract_tx.clone();
        for out in &mut other.outputs {
            out.pk_script = pay_to_pubkey_hash(&[0x99; 20]);
        }
        let result = refund(
            &hex::encode(&swap.contract),
            &hex::encode(other.serialize()),
            &initiator,
            &ChainParams::bitcoin(),
        );
        assert_eq!(result.unwrap_err(), SwapError::ContractOutputNotFound);
    }

    #[test]
    fn test_height_locked_ledger_uses_chain_height() {
        let params = ChainParams::height_locked("blockstack", "BLK");
        let wallet = MockWallet::new(0x42, &[150_000_000]);
        // change address must carry this ledger's version byte
        struct VersionedWallet(MockWallet, ChainParams);
        impl WalletClient for VersionedWallet {
            fn unspent_outputs(&self) -> Result<Vec<Utxo>, SwapError> {
                self.0.unspent_outputs()
            }
            fn change_address(&self) -> Result<String, SwapError> {
                Ok(encode_p2pkh(&self.0.own_hash(), &self.1))
            }
            fn fee_rates(&self) -> Result<(u64, u64), SwapError> {
                self.0.fee_rates()
            }
            fn chain_height(&self) -> Result<u64, SwapError> {
                self.0.chain_height()
            }
            fn sign_input(
                &self,
                tx: &MsgTx,
                index: usize,
                script: &[u8],
                address: &str,
            ) -> Result<(Vec<u8>, Vec<u8>), SwapError> {
                self.0.sign_input(tx, index, script, address)
            }
            fn sign_transaction(&self, tx: &MsgTx) -> Result<MsgTx, SwapError> {
                self.0.sign_transaction(tx)
            }
        }
        let wallet = VersionedWallet(wallet, params.clone());

        let recipient = encode_p2pkh(&[0x11; 20], &params);
        let (_, swap) = initiate(
            &recipient,
            AMOUNT,
            Some(&[0x5a; 32]),
            &wallet,
            &params,
            DustPolicy::Reject,
        )
        .unwrap();

        let pushes = parse_contract(&swap.contract).unwrap();
        assert_eq!(
            u64::from(pushes.locktime),
            650_000 + params.refund_window_blocks
        );
        // expiry window rides on the same height
        assert_eq!(
            swap.refund_tx.expiry,
            Some((650_000 + EXPIRY_WINDOW_BLOCKS) as u32)
        );
        assert_eq!(swap.contract_tx.expiry, Some(0));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SwapError::InvalidSecret(16).to_string(),
            "secret must be 32 bytes, got 16"
        );
        assert_eq!(
            SwapError::DustOutput {
                value: 100,
                threshold: 546
            }
            .to_string(),
            "output value 100 is dust (threshold 546)"
        );
        assert_eq!(
            SwapError::InsufficientFunds {
                have: 5,
                need: 10
            }
            .to_string(),
            "insufficient funds: have 5, need 10"
        );
    }
}
