// =============================================================================
// TIDESWAP v1.0 - Contract Input Signer
// =============================================================================
//
// Produces the P2SH signature scripts that satisfy one branch of a swap
// contract. The private key never enters this module: the wallet capability
// returns (signature, pubkey) for a digest both sides compute identically
// through `signature_hash`.
//
// =============================================================================

use crate::chain::{ChainParams, WalletClient};
use crate::script::{hash256, mix_sig_script, OpCode, Script};
use crate::swap::SwapError;
use crate::transaction::MsgTx;
use crate::SECRET_SIZE;

/// SIGHASH_ALL, the only hash type the swap transactions use
pub const SIG_HASH_ALL: u32 = 0x01;

/// Which contract branch a signature script satisfies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    Redeem,
    Refund,
}

/// Legacy SIGHASH_ALL digest for input `index` of `tx`, signing against
/// `script` (the full contract for P2SH spends).
///
/// All other inputs' signature scripts are cleared, the signed input's is
/// set to `script`, and the transaction is serialized without witness data
/// followed by the 4-byte little-endian hash type.
pub fn signature_hash(tx: &MsgTx, index: usize, script: &[u8]) -> [u8; 32] {
    let mut stripped = tx.clone();
    for input in &mut stripped.inputs {
        input.sig_script.clear();
        input.witness.clear();
    }
    let signing = stripped.with_input_sig_script(index, script.to_vec());

    let mut preimage = signing.serialize();
    preimage.extend_from_slice(&SIG_HASH_ALL.to_le_bytes());
    hash256(&preimage)
}

/// `<sig> <pubkey> <secret> OP_TRUE <contract>`
pub fn redeem_sig_script(
    contract: &[u8],
    sig: &[u8],
    pubkey: &[u8],
    secret: &[u8; SECRET_SIZE],
) -> Script {
    let mut script = Script::new();
    script.ops.push(OpCode::OpPushData(sig.to_vec()));
    script.ops.push(OpCode::OpPushData(pubkey.to_vec()));
    script.ops.push(OpCode::OpPushData(secret.to_vec()));
    script.ops.push(OpCode::OpTrue);
    script.ops.push(OpCode::OpPushData(contract.to_vec()));
    script
}

/// `<sig> <pubkey> OP_FALSE <contract>`
pub fn refund_sig_script(contract: &[u8], sig: &[u8], pubkey: &[u8]) -> Script {
    let mut script = Script::new();
    script.ops.push(OpCode::OpPushData(sig.to_vec()));
    script.ops.push(OpCode::OpPushData(pubkey.to_vec()));
    script.ops.push(OpCode::Op0);
    script.ops.push(OpCode::OpPushData(contract.to_vec()));
    script
}

/// Signs input `index` of `tx` against `contract` through the wallet
/// capability and returns the serialized signature script for `branch`.
///
/// The redeem branch requires the secret; on ledgers with
/// `swapped_sig_order` the discriminator pair is mixed into wire order.
pub fn sign_contract_input(
    tx: &MsgTx,
    index: usize,
    contract: &[u8],
    branch: Branch,
    secret: Option<&[u8; SECRET_SIZE]>,
    address: &str,
    wallet: &dyn WalletClient,
    params: &ChainParams,
) -> Result<Vec<u8>, SwapError> {
    if branch == Branch::Redeem && secret.is_none() {
        return Err(SwapError::Transaction(
            "redeem branch requires a secret".to_string(),
        ));
    }

    let (sig, pubkey) = wallet.sign_input(tx, index, contract, address)?;

    let script = match (branch, secret) {
        (Branch::Redeem, Some(secret)) => redeem_sig_script(contract, &sig, &pubkey, secret),
        _ => refund_sig_script(contract, &sig, &pubkey),
    };

    let script = if params.swapped_sig_order {
        mix_sig_script(script)?
    } else {
        script
    };
    Ok(script.to_bytes())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{encode_p2pkh, pubkey_hash};
    use crate::script::{atomic_swap_script, pay_to_pubkey_hash, unmix_sig_script};
    use crate::secret::hash_secret;
    use crate::transaction::{OutPoint, TxIn, TxOut};
    use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

    struct KeyWallet {
        key: SecretKey,
    }

    impl KeyWallet {
        fn new() -> Self {
            KeyWallet {
                key: SecretKey::from_slice(&[0x42; 32]).unwrap(),
            }
        }

        fn pubkey(&self) -> PublicKey {
            PublicKey::from_secret_key(&Secp256k1::new(), &self.key)
        }
    }

    impl WalletClient for KeyWallet {
        fn unspent_outputs(&self) -> Result<Vec<crate::chain::Utxo>, SwapError> {
            Ok(vec![])
        }

        fn change_address(&self) -> Result<String, SwapError> {
            Ok(encode_p2pkh(
                &pubkey_hash(&self.pubkey()),
                &ChainParams::bitcoin(),
            ))
        }

        fn fee_rates(&self) -> Result<(u64, u64), SwapError> {
            Ok((10_000, 1_000))
        }

        fn chain_height(&self) -> Result<u64, SwapError> {
            Ok(0)
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
            Ok((sig, self.pubkey().serialize().to_vec()))
        }

        fn sign_transaction(&self, tx: &MsgTx) -> Result<MsgTx, SwapError> {
            Ok(tx.clone())
        }
    }

    fn sample_tx(contract: &[u8]) -> MsgTx {
        let mut tx = MsgTx::new(2, 0, None);
        tx.inputs.push(TxIn::new(
            OutPoint {
                txid: [0xab; 32],
                index: 0,
            },
            0xffff_ffff,
        ));
        tx.outputs.push(TxOut {
            value: 90_000_000,
            pk_script: pay_to_pubkey_hash(&crate::script::hash160(contract)),
        });
        tx
    }

    fn contract() -> Vec<u8> {
        atomic_swap_script(
            &hash_secret(&[0x5a; 32]),
            &[0x11; 20],
            &[0x22; 20],
            1_700_000_000,
        )
    }

    #[test]
    fn test_signature_hash_ignores_other_sig_scripts() {
        let contract = contract();
        let tx = sample_tx(&contract);
        let dirty = tx.with_input_sig_script(0, vec![0xde, 0xad]);
        assert_eq!(
            signature_hash(&tx, 0, &contract),
            signature_hash(&dirty, 0, &contract)
        );
    }

    #[test]
    fn test_signature_hash_commits_to_script() {
        let contract = contract();
        let tx = sample_tx(&contract);
        assert_ne!(
            signature_hash(&tx, 0, &contract),
            signature_hash(&tx, 0, &contract[1..])
        );
    }

    #[test]
    fn test_redeem_sig_script_layout() {
        let contract = contract();
        let wallet = KeyWallet::new();
        let tx = sample_tx(&contract);
        let secret = [0x5a; 32];
        let address = wallet.change_address().unwrap();

        let raw = sign_contract_input(
            &tx,
            0,
            &contract,
            Branch::Redeem,
            Some(&secret),
            &address,
            &wallet,
            &ChainParams::bitcoin(),
        )
        .unwrap();

        let script = Script::from_bytes(&raw).unwrap();
        assert_eq!(script.ops.len(), 5);
        assert_eq!(script.ops[2], OpCode::OpPushData(secret.to_vec()));
        assert_eq!(script.ops[3], OpCode::OpTrue);
        assert_eq!(script.ops[4], OpCode::OpPushData(contract.clone()));
    }

    #[test]
    fn test_refund_sig_script_layout() {
        let contract = contract();
        let wallet = KeyWallet::new();
        let tx = sample_tx(&contract);
        let address = wallet.change_address().unwrap();

        let raw = sign_contract_input(
            &tx,
            0,
            &contract,
            Branch::Refund,
            None,
            &address,
            &wallet,
            &ChainParams::bitcoin(),
        )
        .unwrap();

        let script = Script::from_bytes(&raw).unwrap();
        assert_eq!(script.ops.len(), 4);
        assert_eq!(script.ops[2], OpCode::Op0);
        assert_eq!(script.ops[3], OpCode::OpPushData(contract.clone()));
    }

    #[test]
    fn test_redeem_requires_secret() {
        let contract = contract();
        let wallet = KeyWallet::new();
        let tx = sample_tx(&contract);
        let result = sign_contract_input(
            &tx,
            0,
            &contract,
            Branch::Redeem,
            None,
            "unused",
            &wallet,
            &ChainParams::bitcoin(),
        );
        assert!(matches!(result, Err(SwapError::Transaction(_))));
    }

    #[test]
    fn test_swapped_sig_order_applies_mix() {
        let contract = contract();
        let wallet = KeyWallet::new();
        let tx = sample_tx(&contract);
        let secret = [0x5a; 32];
        let address = wallet.change_address().unwrap();

        let mut params = ChainParams::bitcoin();
        params.swapped_sig_order = true;
        let mixed = sign_contract_input(
            &tx,
            0,
            &contract,
            Branch::Redeem,
            Some(&secret),
            &address,
            &wallet,
            &params,
        )
        .unwrap();

        let script = Script::from_bytes(&mixed).unwrap();
        // the discriminator now precedes the secret push
        assert_eq!(script.ops[2], OpCode::OpTrue);
        assert_eq!(script.ops[3], OpCode::OpPushData(secret.to_vec()));

        let restored = unmix_sig_script(script).unwrap();
        assert_eq!(restored.ops[2], OpCode::OpPushData(secret.to_vec()));
        assert_eq!(restored.ops[3], OpCode::OpTrue);
    }

    #[test]
    fn test_signature_verifies_against_digest() {
        let contract = contract();
        let wallet = KeyWallet::new();
        let tx = sample_tx(&contract);
        let (mut sig, pubkey) = wallet.sign_input(&tx, 0, &contract, "unused").unwrap();

        assert_eq!(sig.pop(), Some(SIG_HASH_ALL as u8));
        let secp = Secp256k1::new();
        let digest = signature_hash(&tx, 0, &contract);
        let msg = Message::from_digest(digest);
        let signature = secp256k1::ecdsa::Signature::from_der(&sig).unwrap();
        let pk = PublicKey::from_slice(&pubkey).unwrap();
        assert!(secp.verify_ecdsa(&msg, &signature, &pk).is_ok());
    }
}
