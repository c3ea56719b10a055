// =============================================================================
// TIDESWAP v1.2 - Protocol Constants
// Cross-chain atomic swaps on UTXO ledgers (hashed-timelock P2SH contracts)
// =============================================================================

pub mod secret;
pub mod script;
pub mod address;
pub mod transaction;
pub mod fees;
pub mod chain;
pub mod contract;
pub mod assembler;
pub mod signer;
pub mod swap;

pub use chain::{ChainParams, DustPolicy, LocktimeKind, Utxo, WalletClient};
pub use contract::{BuiltContract, BuiltSwap, ParsedContract, SwapSpec};
pub use swap::{initiate, redeem, refund, SwapError};

// --- Swap parameters ---

/// Secret/preimage size in bytes
pub const SECRET_SIZE: usize = 32;

/// Secret commitment hash size in bytes (double SHA-256)
pub const HASH_SIZE: usize = 32;

/// Minimum time the refund path stays locked after initiation (48 hours)
pub const LOCKTIME_SAFETY_MARGIN_SECS: u64 = 48 * 60 * 60;

/// Block window added to the chain tip for ledgers with an expiry field
pub const EXPIRY_WINDOW_BLOCKS: u64 = 20;

// --- Amounts ---

/// Base units per whole coin at 8 decimals
pub const COIN: u64 = 100_000_000;

/// Formats a base-unit amount as a decimal coin string
pub fn format_amount(units: u64, decimals: u8) -> String {
    let scale = 10u64.pow(decimals as u32);
    let whole = units / scale;
    let frac = units % scale;
    if frac == 0 {
        format!("{}", whole)
    } else {
        format!("{}.{:0width$}", whole, frac, width = decimals as usize)
    }
}
