// =============================================================================
// TIDESWAP v1.2 - Chain Parameters & Wallet Capability
// =============================================================================
//
// Everything ledger-specific is an explicit value passed into the engine:
// address version bytes, the locktime domain, the expiry field, the relay
// quirks. There is no global chain configuration.
//
// The wallet/node itself is a capability trait. The engine never retries or
// caches its calls; failure policy for that boundary belongs to the caller.
//
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::swap::SwapError;
use crate::transaction::{MsgTx, OutPoint, TxOut};
use crate::LOCKTIME_SAFETY_MARGIN_SECS;

// =============================================================================
// Locktime domain
// =============================================================================

/// The domain of a ledger's locktime values.
///
/// Explicit per chain: the engine never infers the domain from the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocktimeKind {
    /// Absolute unix timestamp (seconds)
    Timestamp,
    /// Absolute block height
    BlockHeight,
}

/// What to do when the change output of a funding transaction would be dust
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DustPolicy {
    /// Fail construction with DustOutput
    Reject,
    /// Drop the change output, folding its value into the fee
    FoldIntoFee,
}

// =============================================================================
// Chain parameters
// =============================================================================

/// Per-ledger configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainParams {
    pub name: &'static str,
    pub unit: &'static str,
    pub decimals: u8,
    pub p2pkh_version: u8,
    pub p2sh_version: u8,
    pub locktime_kind: LocktimeKind,
    /// Refund lock window in seconds (Timestamp domain)
    pub refund_window_secs: u64,
    /// Refund lock window in blocks (BlockHeight domain)
    pub refund_window_blocks: u64,
    /// Ledger serializes an expiry height after the locktime
    pub has_expiry: bool,
    /// Node expects the secret push and branch discriminator swapped in
    /// contract-spending signature scripts
    pub swapped_sig_order: bool,
    pub tx_version: u32,
}

impl ChainParams {
    pub fn bitcoin() -> Self {
        ChainParams {
            name: "bitcoin",
            unit: "BTC",
            decimals: 8,
            p2pkh_version: 0x00,
            p2sh_version: 0x05,
            locktime_kind: LocktimeKind::Timestamp,
            refund_window_secs: LOCKTIME_SAFETY_MARGIN_SECS,
            refund_window_blocks: 288,
            has_expiry: false,
            swapped_sig_order: false,
            tx_version: 2,
        }
    }

    pub fn bitcoin_testnet() -> Self {
        ChainParams {
            name: "bitcoin-testnet",
            unit: "tBTC",
            p2pkh_version: 0x6f,
            p2sh_version: 0xc4,
            ..ChainParams::bitcoin()
        }
    }

    /// Preset for ledgers that lock by block height and carry an expiry
    /// field in the transaction
    pub fn height_locked(name: &'static str, unit: &'static str) -> Self {
        ChainParams {
            name,
            unit,
            locktime_kind: LocktimeKind::BlockHeight,
            has_expiry: true,
            ..ChainParams::bitcoin()
        }
    }
}

// =============================================================================
// Wallet capability
// =============================================================================

/// An unspent output owned by the wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub output: TxOut,
}

/// The ledger/wallet collaborator consumed by the swap pipeline.
///
/// Implementations wrap a node RPC client; tests use an in-memory wallet.
/// Every method is a blocking call and every failure maps to
/// `SwapError::Wallet`.
pub trait WalletClient {
    /// Spendable outputs, in the order the wallet prefers to spend them
    fn unspent_outputs(&self) -> Result<Vec<Utxo>, SwapError>;

    /// A fresh address owned by the wallet
    fn change_address(&self) -> Result<String, SwapError>;

    /// (fee per kilobyte, minimum relay fee per kilobyte)
    fn fee_rates(&self) -> Result<(u64, u64), SwapError>;

    /// Current chain tip height. Only consulted on ledgers whose locktime
    /// domain is block height or that carry an expiry field.
    fn chain_height(&self) -> Result<u64, SwapError>;

    /// Sign one input against the given script with the key behind
    /// `address`. Returns (DER signature + hashtype byte, serialized pubkey).
    fn sign_input(
        &self,
        tx: &MsgTx,
        index: usize,
        script: &[u8],
        address: &str,
    ) -> Result<(Vec<u8>, Vec<u8>), SwapError>;

    /// Sign all wallet-owned inputs of a funding transaction
    fn sign_transaction(&self, tx: &MsgTx) -> Result<MsgTx, SwapError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let btc = ChainParams::bitcoin();
        assert_eq!(btc.locktime_kind, LocktimeKind::Timestamp);
        assert!(!btc.has_expiry);
        assert_eq!(btc.refund_window_secs, 48 * 60 * 60);

        let tn = ChainParams::bitcoin_testnet();
        assert_eq!(tn.p2pkh_version, 0x6f);
        assert_eq!(tn.locktime_kind, btc.locktime_kind);

        let hl = ChainParams::height_locked("example", "EXC");
        assert_eq!(hl.locktime_kind, LocktimeKind::BlockHeight);
        assert!(hl.has_expiry);
    }
}
