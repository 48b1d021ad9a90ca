//! Canonical serialization of blocks and transactions.
//!
//! The wire and storage format is fixed: integers are little-endian
//! fixed-width, fixed-size byte fields (hashes, addresses, witness data)
//! carry a 4-byte little-endian length prefix stating their exact size,
//! and field order is consensus-critical. Every value has exactly one
//! encoding; decoding rejects anything else and never partially succeeds.
//!
//! Two preimages are derived here besides the wire form:
//!
//! - the 92-byte block header ([`block_header_bytes`]), whose SHA-256d is
//!   the block hash;
//! - the transaction sign preimage ([`tx_sign_preimage`]), the
//!   concatenation of all input headers then all output headers, whose
//!   SHA-256d is the txid. Witness bytes are absent from it, so signing
//!   never moves a txid.

use bytes::{BufMut, BytesMut};

use crate::address::Address;
use crate::constants::{
    ADDRESS_SIZE, BLOCK_HEADER_SIZE, HASH_SIZE, MAX_BLOCK_SIZE, MAX_TX_INPUTS, MAX_TX_OUTPUTS,
    MIN_TX_WIRE_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE, TXIN_SIGN_HEADER_SIZE,
    TXOUT_SIGN_HEADER_SIZE,
};
use crate::error::CodecError;
use crate::types::{Block, Hash256, Transaction, TxIn, TxOut};

/// Wire size of one input: prefixed txid, vout, prefixed witness fields.
pub const TXIN_WIRE_SIZE: usize = 4 + HASH_SIZE + 4 + 4 + SIGNATURE_SIZE + 4 + PUBLIC_KEY_SIZE;
/// Wire size of one output: amount plus prefixed address.
pub const TXOUT_WIRE_SIZE: usize = 8 + 4 + ADDRESS_SIZE;

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

/// Exact wire size of a serialized transaction.
pub fn transaction_wire_size(tx: &Transaction) -> usize {
    MIN_TX_WIRE_SIZE + tx.txins.len() * TXIN_WIRE_SIZE + tx.txouts.len() * TXOUT_WIRE_SIZE
}

/// Exact wire size of a serialized block, transactions included.
pub fn block_wire_size(block: &Block) -> usize {
    4 + 3 * (4 + HASH_SIZE)
        + 4
        + 4
        + 4
        + 8
        + 4
        + block
            .transactions
            .iter()
            .map(transaction_wire_size)
            .sum::<usize>()
}

/// Consensus size of a block: the fixed header plus every transaction's
/// wire size. This is the quantity bounded by `max_block_size`.
pub fn block_consensus_size(block: &Block) -> usize {
    BLOCK_HEADER_SIZE
        + block
            .transactions
            .iter()
            .map(transaction_wire_size)
            .sum::<usize>()
}

// ---------------------------------------------------------------------------
// Preimages
// ---------------------------------------------------------------------------

/// The canonical header preimage: version, timestamp, nonce, bits,
/// cumulative emission, previous hash, merkle root, and the zeroed
/// reserved tail. SHA-256d of these 92 bytes is the block hash.
pub fn block_header_bytes(block: &Block) -> [u8; BLOCK_HEADER_SIZE] {
    let mut out = [0u8; BLOCK_HEADER_SIZE];
    out[0..4].copy_from_slice(&block.version.to_le_bytes());
    out[4..8].copy_from_slice(&block.timestamp.to_le_bytes());
    out[8..12].copy_from_slice(&block.nonce.to_le_bytes());
    out[12..16].copy_from_slice(&block.bits.to_le_bytes());
    out[16..24].copy_from_slice(&block.cumulative_emission.to_le_bytes());
    out[24..56].copy_from_slice(block.previous_hash.as_bytes());
    out[56..88].copy_from_slice(block.merkle_root.as_bytes());
    // Bytes 88..92 stay zero: the reserved tail of the fixed-size header.
    out
}

/// Signed header of one input: previous txid and output index.
pub fn txin_sign_header(txin: &TxIn) -> [u8; TXIN_SIGN_HEADER_SIZE] {
    let mut out = [0u8; TXIN_SIGN_HEADER_SIZE];
    out[..HASH_SIZE].copy_from_slice(txin.prev_txid.as_bytes());
    out[HASH_SIZE..].copy_from_slice(&txin.prev_vout.to_le_bytes());
    out
}

/// Signed header of one output: amount and address, no length prefix.
pub fn txout_sign_header(txout: &TxOut) -> [u8; TXOUT_SIGN_HEADER_SIZE] {
    let mut out = [0u8; TXOUT_SIGN_HEADER_SIZE];
    out[..8].copy_from_slice(&txout.amount.to_le_bytes());
    out[8..].copy_from_slice(txout.address.as_bytes());
    out
}

/// The sign preimage over explicit input and output lists.
pub fn tx_sign_preimage_parts(txins: &[TxIn], txouts: &[TxOut]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        txins.len() * TXIN_SIGN_HEADER_SIZE + txouts.len() * TXOUT_SIGN_HEADER_SIZE,
    );
    for txin in txins {
        out.extend_from_slice(&txin_sign_header(txin));
    }
    for txout in txouts {
        out.extend_from_slice(&txout_sign_header(txout));
    }
    out
}

/// The sign preimage of a transaction: all input headers, then all output
/// headers, in list order.
pub fn tx_sign_preimage(tx: &Transaction) -> Vec<u8> {
    tx_sign_preimage_parts(&tx.txins, &tx.txouts)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn put_length_prefixed(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u32_le(bytes.len() as u32);
    buf.put_slice(bytes);
}

fn encode_txin_into(buf: &mut BytesMut, txin: &TxIn) {
    put_length_prefixed(buf, txin.prev_txid.as_bytes());
    buf.put_u32_le(txin.prev_vout);
    put_length_prefixed(buf, &txin.signature);
    put_length_prefixed(buf, &txin.public_key);
}

fn encode_txout_into(buf: &mut BytesMut, txout: &TxOut) {
    buf.put_u64_le(txout.amount);
    put_length_prefixed(buf, txout.address.as_bytes());
}

fn encode_transaction_into(buf: &mut BytesMut, tx: &Transaction) -> Result<(), CodecError> {
    if tx.txins.len() > MAX_TX_INPUTS {
        return Err(CodecError::TooManyInputs(tx.txins.len()));
    }
    if tx.txouts.len() > MAX_TX_OUTPUTS {
        return Err(CodecError::TooManyOutputs(tx.txouts.len()));
    }
    put_length_prefixed(buf, tx.id.as_bytes());
    buf.put_u8(tx.txins.len() as u8);
    buf.put_u8(tx.txouts.len() as u8);
    for txin in &tx.txins {
        encode_txin_into(buf, txin);
    }
    for txout in &tx.txouts {
        encode_txout_into(buf, txout);
    }
    Ok(())
}

/// Serialize one transaction.
pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>, CodecError> {
    let mut buf = BytesMut::with_capacity(transaction_wire_size(tx));
    encode_transaction_into(&mut buf, tx)?;
    Ok(buf.to_vec())
}

/// Serialize a block, transactions included. This is both the wire form
/// and the storage value keyed by block hash.
pub fn encode_block(block: &Block) -> Result<Vec<u8>, CodecError> {
    let mut buf = BytesMut::with_capacity(block_wire_size(block));
    buf.put_u32_le(block.version);
    put_length_prefixed(&mut buf, block.previous_hash.as_bytes());
    put_length_prefixed(&mut buf, block.hash.as_bytes());
    buf.put_u32_le(block.timestamp);
    buf.put_u32_le(block.nonce);
    buf.put_u32_le(block.bits);
    buf.put_u64_le(block.cumulative_emission);
    put_length_prefixed(&mut buf, block.merkle_root.as_bytes());
    buf.put_u32_le(block.transactions.len() as u32);
    for tx in &block.transactions {
        encode_transaction_into(&mut buf, tx)?;
    }
    Ok(buf.to_vec())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Bounds-checked cursor over an input buffer.
struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64_le(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a length-prefixed field whose length must be exactly
    /// `expected`; canonical encodings admit no other size.
    fn read_fixed(&mut self, field: &'static str, expected: usize) -> Result<&'a [u8], CodecError> {
        let got = self.read_u32_le()? as usize;
        if got != expected {
            return Err(CodecError::LengthMismatch {
                field,
                expected,
                got,
            });
        }
        self.take(expected)
    }

    fn read_hash(&mut self, field: &'static str) -> Result<Hash256, CodecError> {
        let bytes = self.read_fixed(field, HASH_SIZE)?;
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(bytes);
        Ok(Hash256(out))
    }
}

fn decode_txin_from(dec: &mut Decoder<'_>) -> Result<TxIn, CodecError> {
    let prev_txid = dec.read_hash("prev_txid")?;
    let prev_vout = dec.read_u32_le()?;
    let sig = dec.read_fixed("signature", SIGNATURE_SIZE)?;
    let pk = dec.read_fixed("public_key", PUBLIC_KEY_SIZE)?;
    let mut signature = [0u8; SIGNATURE_SIZE];
    signature.copy_from_slice(sig);
    let mut public_key = [0u8; PUBLIC_KEY_SIZE];
    public_key.copy_from_slice(pk);
    Ok(TxIn {
        prev_txid,
        prev_vout,
        signature,
        public_key,
    })
}

fn decode_txout_from(dec: &mut Decoder<'_>) -> Result<TxOut, CodecError> {
    let amount = dec.read_u64_le()?;
    let addr = dec.read_fixed("address", ADDRESS_SIZE)?;
    let mut bytes = [0u8; ADDRESS_SIZE];
    bytes.copy_from_slice(addr);
    Ok(TxOut {
        amount,
        address: Address::from_bytes(bytes),
    })
}

fn decode_transaction_from(dec: &mut Decoder<'_>) -> Result<Transaction, CodecError> {
    let id = dec.read_hash("txid")?;
    let txin_count = dec.read_u8()? as usize;
    let txout_count = dec.read_u8()? as usize;
    let mut txins = Vec::with_capacity(txin_count);
    for _ in 0..txin_count {
        txins.push(decode_txin_from(dec)?);
    }
    let mut txouts = Vec::with_capacity(txout_count);
    for _ in 0..txout_count {
        txouts.push(decode_txout_from(dec)?);
    }
    Ok(Transaction { id, txins, txouts })
}

/// Deserialize one transaction. Rejects trailing bytes.
pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction, CodecError> {
    let mut dec = Decoder::new(bytes);
    let tx = decode_transaction_from(&mut dec)?;
    if dec.remaining() != 0 {
        return Err(CodecError::TrailingBytes(dec.remaining()));
    }
    Ok(tx)
}

/// Deserialize a block, transactions included. Rejects trailing bytes and
/// transaction counts that could not fit a block even at the minimum
/// per-transaction encoding.
pub fn decode_block(bytes: &[u8]) -> Result<Block, CodecError> {
    let mut dec = Decoder::new(bytes);
    let version = dec.read_u32_le()?;
    let previous_hash = dec.read_hash("previous_hash")?;
    let hash = dec.read_hash("hash")?;
    let timestamp = dec.read_u32_le()?;
    let nonce = dec.read_u32_le()?;
    let bits = dec.read_u32_le()?;
    let cumulative_emission = dec.read_u64_le()?;
    let merkle_root = dec.read_hash("merkle_root")?;
    let transaction_count = dec.read_u32_le()?;

    if transaction_count as u64 * MIN_TX_WIRE_SIZE as u64 > MAX_BLOCK_SIZE as u64 {
        return Err(CodecError::OversizedTransactionCount(transaction_count));
    }

    let mut transactions = Vec::with_capacity(transaction_count as usize);
    for _ in 0..transaction_count {
        transactions.push(decode_transaction_from(&mut dec)?);
    }
    if dec.remaining() != 0 {
        return Err(CodecError::TrailingBytes(dec.remaining()));
    }

    Ok(Block {
        version,
        previous_hash,
        hash,
        timestamp,
        nonce,
        bits,
        cumulative_emission,
        merkle_root,
        transactions,
    })
}
