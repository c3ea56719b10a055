// =============================================================================
// TIDESWAP v1.2 - Transactions (UTXO model, ledger wire format)
// =============================================================================
//
// Byte-exact serialization so constructed transactions interoperate with an
// external full node. Two layouts exist in the wild:
//
//   legacy:  version | inputs | outputs | locktime [| expiry]
//   witness: version | 0x00 0x01 | inputs | outputs | stacks | locktime [| expiry]
//
// Decoding probes the witness layout first (it is the more specific one:
// the marker byte is 0) and returns a tagged result per format instead of
// dispatching on caught errors.
//
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::chain::ChainParams;
use crate::script::hash256;
use crate::swap::SwapError;

// =============================================================================
// Entities
// =============================================================================

/// Reference to a specific output of a prior transaction.
/// The txid is kept in wire (internal) byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: [u8; 32],
    pub index: u32,
}

/// Transaction input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub outpoint: OutPoint,
    pub sig_script: Vec<u8>,
    pub witness: Vec<Vec<u8>>,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(outpoint: OutPoint, sequence: u32) -> Self {
        TxIn {
            outpoint,
            sig_script: Vec::new(),
            witness: Vec::new(),
            sequence,
        }
    }
}

/// Transaction output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: u64,
    pub pk_script: Vec<u8>,
}

impl TxOut {
    /// Serialized size in bytes: value + script length prefix + script
    pub fn serialize_size(&self) -> usize {
        8 + varint_size(self.pk_script.len() as u64) + self.pk_script.len()
    }
}

/// A complete transaction.
///
/// `expiry` is only `Some` on ledgers whose parameters carry an expiry-height
/// field; it is serialized after the locktime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTx {
    pub version: u32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub locktime: u32,
    pub expiry: Option<u32>,
}

impl MsgTx {
    pub fn new(version: u32, locktime: u32, expiry: Option<u32>) -> Self {
        MsgTx {
            version,
            inputs: Vec::new(),
            outputs: Vec::new(),
            locktime,
            expiry,
        }
    }

    /// Sum of output values
    pub fn output_sum(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// Returns a copy with one input's signature script replaced.
    /// Assembly steps produce new values instead of patching in place.
    pub fn with_input_sig_script(&self, index: usize, sig_script: Vec<u8>) -> MsgTx {
        let mut tx = self.clone();
        tx.inputs[index].sig_script = sig_script;
        tx
    }

    /// Legacy serialization (no witness data)
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            write_input(&mut out, input);
        }
        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            write_output(&mut out, output);
        }
        out.extend_from_slice(&self.locktime.to_le_bytes());
        if let Some(expiry) = self.expiry {
            out.extend_from_slice(&expiry.to_le_bytes());
        }
        out
    }

    /// Witness serialization. Identical to the legacy layout when no input
    /// carries witness data.
    pub fn serialize_witness(&self) -> Vec<u8> {
        if !self.has_witness() {
            return self.serialize();
        }
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        out.push(0x00); // marker
        out.push(0x01); // flag
        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            write_input(&mut out, input);
        }
        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            write_output(&mut out, output);
        }
        for input in &self.inputs {
            write_varint(&mut out, input.witness.len() as u64);
            for item in &input.witness {
                write_varint(&mut out, item.len() as u64);
                out.extend_from_slice(item);
            }
        }
        out.extend_from_slice(&self.locktime.to_le_bytes());
        if let Some(expiry) = self.expiry {
            out.extend_from_slice(&expiry.to_le_bytes());
        }
        out
    }

    pub fn serialize_size(&self) -> usize {
        self.serialize().len()
    }

    pub fn serialize_witness_size(&self) -> usize {
        self.serialize_witness().len()
    }

    fn has_witness(&self) -> bool {
        self.inputs.iter().any(|i| !i.witness.is_empty())
    }

    /// Transaction id: double SHA-256 of the legacy serialization, in wire
    /// byte order
    pub fn txid(&self) -> [u8; 32] {
        hash256(&self.serialize())
    }

    /// Transaction id as displayed by node software (byte-reversed hex)
    pub fn txid_hex(&self) -> String {
        let mut txid = self.txid();
        txid.reverse();
        hex::encode(txid)
    }
}

fn write_input(out: &mut Vec<u8>, input: &TxIn) {
    out.extend_from_slice(&input.outpoint.txid);
    out.extend_from_slice(&input.outpoint.index.to_le_bytes());
    write_varint(out, input.sig_script.len() as u64);
    out.extend_from_slice(&input.sig_script);
    out.extend_from_slice(&input.sequence.to_le_bytes());
}

fn write_output(out: &mut Vec<u8>, output: &TxOut) {
    out.extend_from_slice(&output.value.to_le_bytes());
    write_varint(out, output.pk_script.len() as u64);
    out.extend_from_slice(&output.pk_script);
}

// =============================================================================
// Compact-size varints
// =============================================================================

pub fn write_varint(out: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        out.push(n as u8);
    } else if n <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&n.to_le_bytes());
    }
}

/// Encoded size of a varint
pub fn varint_size(n: u64) -> usize {
    if n < 0xfd {
        1
    } else if n <= 0xffff {
        3
    } else if n <= 0xffff_ffff {
        5
    } else {
        9
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// A decoded transaction tagged with the wire layout it used
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedTx {
    Witness(MsgTx),
    Legacy(MsgTx),
}

impl DecodedTx {
    pub fn into_tx(self) -> MsgTx {
        match self {
            DecodedTx::Witness(tx) | DecodedTx::Legacy(tx) => tx,
        }
    }
}

/// Decodes a hex transaction, probing the witness layout first and falling
/// back to legacy. Both probes require the buffer to be fully consumed.
pub fn decode_transaction(hex_str: &str, params: &ChainParams) -> Result<DecodedTx, SwapError> {
    let bytes = hex::decode(hex_str.trim())
        .map_err(|e| SwapError::Transaction(format!("invalid transaction hex: {}", e)))?;
    if let Ok(tx) = parse_tx(&bytes, true, params) {
        return Ok(DecodedTx::Witness(tx));
    }
    let tx = parse_tx(&bytes, false, params)
        .map_err(|e| SwapError::Transaction(format!("undecodable transaction: {}", e)))?;
    Ok(DecodedTx::Legacy(tx))
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| "unexpected end of data".to_string())?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Reads an element count whose elements serialize to at least
    /// `min_size` bytes each; a count the remaining buffer cannot possibly
    /// hold is rejected before anything is allocated
    fn read_count(&mut self, min_size: usize) -> Result<usize, String> {
        let n = self.read_varint()?;
        if n > (self.remaining() / min_size) as u64 {
            return Err(format!("count {} exceeds remaining data", n));
        }
        Ok(n as usize)
    }

    fn read_u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, String> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, String> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_varint(&mut self) -> Result<u64, String> {
        match self.read_u8()? {
            0xfd => {
                let b = self.take(2)?;
                Ok(u16::from_le_bytes([b[0], b[1]]) as u64)
            }
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            n => Ok(n as u64),
        }
    }

    fn done(&self) -> bool {
        self.pos == self.buf.len()
    }
}

fn parse_tx(bytes: &[u8], witness: bool, params: &ChainParams) -> Result<MsgTx, String> {
    let mut r = Reader::new(bytes);
    let version = r.read_u32()?;

    if witness {
        let marker = r.read_u8()?;
        let flag = r.read_u8()?;
        if marker != 0x00 || flag != 0x01 {
            return Err("not a witness transaction".to_string());
        }
    }

    // outpoint + script varint + sequence
    let n_in = r.read_count(32 + 4 + 1 + 4)?;
    if n_in == 0 {
        return Err("transaction has no inputs".to_string());
    }
    let mut inputs = Vec::with_capacity(n_in);
    for _ in 0..n_in {
        let mut txid = [0u8; 32];
        txid.copy_from_slice(r.take(32)?);
        let index = r.read_u32()?;
        let script_len = r.read_varint()? as usize;
        let sig_script = r.take(script_len)?.to_vec();
        let sequence = r.read_u32()?;
        inputs.push(TxIn {
            outpoint: OutPoint { txid, index },
            sig_script,
            witness: Vec::new(),
            sequence,
        });
    }

    // value + script varint
    let n_out = r.read_count(8 + 1)?;
    let mut outputs = Vec::with_capacity(n_out);
    for _ in 0..n_out {
        let value = r.read_u64()?;
        let pk_len = r.read_varint()? as usize;
        let pk_script = r.take(pk_len)?.to_vec();
        outputs.push(TxOut { value, pk_script });
    }

    if witness {
        for input in inputs.iter_mut() {
            // each item carries at least its length varint
            let n_items = r.read_count(1)?;
            let mut stack = Vec::with_capacity(n_items);
            for _ in 0..n_items {
                let len = r.read_varint()? as usize;
                stack.push(r.take(len)?.to_vec());
            }
            input.witness = stack;
        }
    }

    let locktime = r.read_u32()?;
    let expiry = if params.has_expiry {
        Some(r.read_u32()?)
    } else {
        None
    };

    if !r.done() {
        return Err("trailing bytes after transaction".to_string());
    }

    Ok(MsgTx {
        version,
        inputs,
        outputs,
        locktime,
        expiry,
    })
}

// =============================================================================
// Tests
// =============================================================================
