// =============================================================================
// TIDESWAP v1.0 - Script Codec (Bitcoin-style)
// =============================================================================
//
// Stack-based script encoding for the hashed-timelock contract and its
// spending paths.
//
// Contract template:
//   OP_IF
//     OP_SIZE <32> OP_EQUALVERIFY
//     OP_HASH256 <secret_hash> OP_EQUALVERIFY
//     OP_DUP OP_HASH160 <recipient_hash>
//   OP_ELSE
//     <locktime> OP_CHECKLOCKTIMEVERIFY OP_DROP
//     OP_DUP OP_HASH160 <sender_hash>
//   OP_ENDIF
//   OP_EQUALVERIFY OP_CHECKSIG
//
// Redeem scriptSig:  <sig> <pubkey> <secret> OP_TRUE <contract>
// Refund scriptSig:  <sig> <pubkey> OP_FALSE <contract>
//
// =============================================================================

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::swap::SwapError;
use crate::{HASH_SIZE, SECRET_SIZE};

// =============================================================================
// Hash helpers
// =============================================================================

/// SHA-256 then RIPEMD-160 (Bitcoin's HASH160)
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

/// Double SHA-256 (Bitcoin's HASH256)
pub fn hash256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

// =============================================================================
// Opcodes
// =============================================================================

/// The opcode set this engine emits and accepts.
///
/// Anything outside this set fails script decoding, which is what makes the
/// contract parser closed-world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpCode {
    // Constants
    Op0,                 // 0x00 - push empty byte array (false)
    OpPushData(Vec<u8>), // minimal-length data push
    OpTrue,              // 0x51 - push 1 (true)

    // Flow control
    OpIf,    // 0x63
    OpElse,  // 0x67
    OpEndIf, // 0x68

    // Stack operations
    OpDrop, // 0x75
    OpDup,  // 0x76
    OpSize, // 0x82

    // Bitwise logic
    OpEqual,       // 0x87
    OpEqualVerify, // 0x88

    // Crypto
    OpSha256,   // 0xa8
    OpHash160,  // 0xa9
    OpHash256,  // 0xaa
    OpCheckSig, // 0xac

    // Locktime
    OpCheckLockTimeVerify, // 0xb1
}

impl OpCode {
    /// Converts a non-push byte to an OpCode
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(OpCode::Op0),
            0x51 => Some(OpCode::OpTrue),
            0x63 => Some(OpCode::OpIf),
            0x67 => Some(OpCode::OpElse),
            0x68 => Some(OpCode::OpEndIf),
            0x75 => Some(OpCode::OpDrop),
            0x76 => Some(OpCode::OpDup),
            0x82 => Some(OpCode::OpSize),
            0x87 => Some(OpCode::OpEqual),
            0x88 => Some(OpCode::OpEqualVerify),
            0xa8 => Some(OpCode::OpSha256),
            0xa9 => Some(OpCode::OpHash160),
            0xaa => Some(OpCode::OpHash256),
            0xac => Some(OpCode::OpCheckSig),
            0xb1 => Some(OpCode::OpCheckLockTimeVerify),
            _ => None,
        }
    }

    /// Byte value of a non-push opcode
    pub fn to_byte(&self) -> u8 {
        match self {
            OpCode::Op0 => 0x00,
            OpCode::OpPushData(_) => unreachable!("push opcodes have no single byte"),
            OpCode::OpTrue => 0x51,
            OpCode::OpIf => 0x63,
            OpCode::OpElse => 0x67,
            OpCode::OpEndIf => 0x68,
            OpCode::OpDrop => 0x75,
            OpCode::OpDup => 0x76,
            OpCode::OpSize => 0x82,
            OpCode::OpEqual => 0x87,
            OpCode::OpEqualVerify => 0x88,
            OpCode::OpSha256 => 0xa8,
            OpCode::OpHash160 => 0xa9,
            OpCode::OpHash256 => 0xaa,
            OpCode::OpCheckSig => 0xac,
            OpCode::OpCheckLockTimeVerify => 0xb1,
        }
    }
}

// =============================================================================
// Script
// =============================================================================

/// A script as a sequence of opcodes
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    pub ops: Vec<OpCode>,
}

impl Script {
    pub fn new() -> Self {
        Script { ops: Vec::new() }
    }

    /// Serializes the script with minimal push encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for op in &self.ops {
            match op {
                OpCode::OpPushData(data) => push_data(&mut out, data),
                other => out.push(other.to_byte()),
            }
        }
        out
    }

    /// Decodes a script, rejecting unknown opcodes, truncated pushes and
    /// non-minimal push encodings
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SwapError> {
        let mut ops = Vec::new();
        let mut i = 0usize;
        while i < bytes.len() {
            let b = bytes[i];
            i += 1;
            match b {
                0x01..=0x4b => {
                    let len = b as usize;
                    let data = read_push(bytes, &mut i, len)?;
                    ops.push(OpCode::OpPushData(data));
                }
                0x4c => {
                    // OP_PUSHDATA1
                    if i >= bytes.len() {
                        return Err(malformed("truncated OP_PUSHDATA1"));
                    }
                    let len = bytes[i] as usize;
                    i += 1;
                    if len <= 75 {
                        return Err(malformed("non-minimal OP_PUSHDATA1"));
                    }
                    let data = read_push(bytes, &mut i, len)?;
                    ops.push(OpCode::OpPushData(data));
                }
                0x4d => {
                    // OP_PUSHDATA2
                    if i + 2 > bytes.len() {
                        return Err(malformed("truncated OP_PUSHDATA2"));
                    }
                    let len = u16::from_le_bytes([bytes[i], bytes[i + 1]]) as usize;
                    i += 2;
                    if len <= 0xff {
                        return Err(malformed("non-minimal OP_PUSHDATA2"));
                    }
                    let data = read_push(bytes, &mut i, len)?;
                    ops.push(OpCode::OpPushData(data));
                }
                0x4e => {
                    // OP_PUSHDATA4
                    if i + 4 > bytes.len() {
                        return Err(malformed("truncated OP_PUSHDATA4"));
                    }
                    let len =
                        u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
                            as usize;
                    i += 4;
                    if len <= 0xffff {
                        return Err(malformed("non-minimal OP_PUSHDATA4"));
                    }
                    let data = read_push(bytes, &mut i, len)?;
                    ops.push(OpCode::OpPushData(data));
                }
                other => match OpCode::from_byte(other) {
                    Some(op) => ops.push(op),
                    None => {
                        return Err(malformed(&format!("unsupported opcode 0x{:02x}", other)))
                    }
                },
            }
        }
        Ok(Script { ops })
    }
}

fn malformed(msg: &str) -> SwapError {
    SwapError::MalformedContract(msg.to_string())
}

fn read_push(bytes: &[u8], i: &mut usize, len: usize) -> Result<Vec<u8>, SwapError> {
    if *i + len > bytes.len() {
        return Err(malformed("truncated data push"));
    }
    let data = bytes[*i..*i + len].to_vec();
    *i += len;
    Ok(data)
}

/// Appends a minimally encoded data push
fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len <= 75 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(0x4c);
        out.push(len as u8);
    } else if len <= 0xffff {
        out.push(0x4d);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(0x4e);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(data);
}

// =============================================================================
// Script numbers
// =============================================================================

/// Encodes a non-negative integer as a minimal script number (little-endian,
/// sign byte appended when the high bit would be set)
pub fn script_num_encode(n: u64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut v = n;
    while v > 0 {
        out.push((v & 0xff) as u8);
        v >>= 8;
    }
    if out[out.len() - 1] & 0x80 != 0 {
        out.push(0);
    }
    out
}

/// Decodes a minimal, non-negative script number of at most 5 bytes
pub fn script_num_decode(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return Some(0);
    }
    if bytes.len() > 5 {
        return None;
    }
    let last = bytes[bytes.len() - 1];
    if last & 0x80 != 0 {
        // negative numbers never appear in the template
        return None;
    }
    if last == 0 && (bytes.len() < 2 || bytes[bytes.len() - 2] & 0x80 == 0) {
        // non-minimal encoding
        return None;
    }
    let mut v = 0u64;
    for (i, b) in bytes.iter().enumerate() {
        v |= (*b as u64) << (8 * i);
    }
    Some(v)
}

// =============================================================================
// Locking script templates
// =============================================================================

/// P2PKH locking script: OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG
pub fn pay_to_pubkey_hash(hash: &[u8; 20]) -> Vec<u8> {
    Script {
        ops: vec![
            OpCode::OpDup,
            OpCode::OpHash160,
            OpCode::OpPushData(hash.to_vec()),
            OpCode::OpEqualVerify,
            OpCode::OpCheckSig,
        ],
    }
    .to_bytes()
}

/// P2SH locking script: OP_HASH160 <hash> OP_EQUAL
pub fn pay_to_script_hash(hash: &[u8; 20]) -> Vec<u8> {
    Script {
        ops: vec![
            OpCode::OpHash160,
            OpCode::OpPushData(hash.to_vec()),
            OpCode::OpEqual,
        ],
    }
    .to_bytes()
}

/// Extracts the pubkey hash from a P2PKH locking script, if it is one
pub fn extract_p2pkh_hash(pk_script: &[u8]) -> Option<[u8; 20]> {
    if pk_script.len() == 25
        && pk_script[0] == 0x76
        && pk_script[1] == 0xa9
        && pk_script[2] == 0x14
        && pk_script[23] == 0x88
        && pk_script[24] == 0xac
    {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&pk_script[3..23]);
        return Some(hash);
    }
    None
}

/// Extracts the script hash from a P2SH locking script, if it is one
pub fn extract_p2sh_hash(pk_script: &[u8]) -> Option<[u8; 20]> {
    if pk_script.len() == 23
        && pk_script[0] == 0xa9
        && pk_script[1] == 0x14
        && pk_script[22] == 0x87
    {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&pk_script[2..22]);
        return Some(hash);
    }
    None
}

// =============================================================================
// Hashed-timelock contract template
// =============================================================================

/// Data pushes recovered from a contract script
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractPushes {
    pub secret_size: u64,
    pub secret_hash: [u8; HASH_SIZE],
    pub recipient_hash: [u8; 20],
    pub sender_hash: [u8; 20],
    pub locktime: u32,
}

/// Builds the contract redeem script. Deterministic: identical inputs yield
/// byte-identical scripts.
pub fn atomic_swap_script(
    secret_hash: &[u8; HASH_SIZE],
    recipient_hash: &[u8; 20],
    sender_hash: &[u8; 20],
    locktime: u32,
) -> Vec<u8> {
    Script {
        ops: vec![
            OpCode::OpIf,
            OpCode::OpSize,
            OpCode::OpPushData(script_num_encode(SECRET_SIZE as u64)),
            OpCode::OpEqualVerify,
            OpCode::OpHash256,
            OpCode::OpPushData(secret_hash.to_vec()),
            OpCode::OpEqualVerify,
            OpCode::OpDup,
            OpCode::OpHash160,
            OpCode::OpPushData(recipient_hash.to_vec()),
            OpCode::OpElse,
            OpCode::OpPushData(script_num_encode(locktime as u64)),
            OpCode::OpCheckLockTimeVerify,
            OpCode::OpDrop,
            OpCode::OpDup,
            OpCode::OpHash160,
            OpCode::OpPushData(sender_hash.to_vec()),
            OpCode::OpEndIf,
            OpCode::OpEqualVerify,
            OpCode::OpCheckSig,
        ],
    }
    .to_bytes()
}

/// Strict template matcher for contract bytes.
///
/// Closed-world by design: any deviation from the expected opcode sequence,
/// push lengths or number encodings is rejected, so a counterparty cannot
/// substitute a near-match script and have it signed.
pub fn extract_contract(raw: &[u8]) -> Result<ContractPushes, SwapError> {
    let script = Script::from_bytes(raw)?;
    let ops = &script.ops;
    if ops.len() != 20 {
        return Err(malformed("unexpected script length"));
    }

    use OpCode::*;
    let expected_fixed: [(usize, OpCode); 15] = [
        (0, OpIf),
        (1, OpSize),
        (3, OpEqualVerify),
        (4, OpHash256),
        (6, OpEqualVerify),
        (7, OpDup),
        (8, OpHash160),
        (10, OpElse),
        (12, OpCheckLockTimeVerify),
        (13, OpDrop),
        (14, OpDup),
        (15, OpHash160),
        (17, OpEndIf),
        (18, OpEqualVerify),
        (19, OpCheckSig),
    ];
    for (idx, op) in expected_fixed {
        if ops[idx] != op {
            return Err(malformed("unexpected opcode in template"));
        }
    }

    let secret_size = match &ops[2] {
        OpPushData(d) => script_num_decode(d).ok_or_else(|| malformed("bad size operand"))?,
        _ => return Err(malformed("missing size operand")),
    };
    if secret_size != SECRET_SIZE as u64 {
        return Err(malformed("unexpected secret size"));
    }

    let secret_hash = match &ops[5] {
        OpPushData(d) if d.len() == HASH_SIZE => {
            let mut h = [0u8; HASH_SIZE];
            h.copy_from_slice(d);
            h
        }
        _ => return Err(malformed("bad secret hash push")),
    };

    let recipient_hash = push_20(&ops[9]).ok_or_else(|| malformed("bad recipient hash push"))?;
    let sender_hash = push_20(&ops[16]).ok_or_else(|| malformed("bad sender hash push"))?;

    let locktime = match &ops[11] {
        OpPushData(d) if !d.is_empty() => {
            let v = script_num_decode(d).ok_or_else(|| malformed("bad locktime number"))?;
            u32::try_from(v).map_err(|_| malformed("locktime out of range"))?
        }
        _ => return Err(malformed("bad locktime push")),
    };

    Ok(ContractPushes {
        secret_size,
        secret_hash,
        recipient_hash,
        sender_hash,
        locktime,
    })
}

fn push_20(op: &OpCode) -> Option<[u8; 20]> {
    match op {
        OpCode::OpPushData(d) if d.len() == 20 => {
            let mut h = [0u8; 20];
            h.copy_from_slice(d);
            Some(h)
        }
        _ => None,
    }
}

// =============================================================================
// Signature-script push ordering (mix/unmix)
// =============================================================================

/// Swaps the secret push and the branch discriminator of a contract-spending
/// signature script. Some node implementations expect the discriminator
/// before the final data push, others after; this transform converts between
/// the two orders.
///
/// The swap is an involution, so `unmix_sig_script(mix_sig_script(x)) == x`
/// for every script `mix_sig_script` accepts.
pub fn mix_sig_script(script: Script) -> Result<Script, SwapError> {
    swap_discriminator(script)
}

/// Inverse of [`mix_sig_script`]
pub fn unmix_sig_script(script: Script) -> Result<Script, SwapError> {
    swap_discriminator(script)
}

fn swap_discriminator(mut script: Script) -> Result<Script, SwapError> {
    let n = script.ops.len();
    if n < 4 {
        return Err(malformed("signature script too short to reorder"));
    }
    // last element is the serialized contract push
    if !matches!(script.ops[n - 1], OpCode::OpPushData(_)) {
        return Err(malformed("signature script missing contract push"));
    }
    let a = n - 3;
    let b = n - 2;
    let ok = (is_selector(&script.ops[a]) && is_push(&script.ops[b]))
        || (is_push(&script.ops[a]) && is_selector(&script.ops[b]));
    if !ok {
        return Err(malformed("signature script missing discriminator pair"));
    }
    script.ops.swap(a, b);
    Ok(script)
}

fn is_selector(op: &OpCode) -> bool {
    matches!(op, OpCode::OpTrue | OpCode::Op0)
}

fn is_push(op: &OpCode) -> bool {
    matches!(op, OpCode::OpPushData(_))
}

// =============================================================================
// Tests
// =============================================================================
