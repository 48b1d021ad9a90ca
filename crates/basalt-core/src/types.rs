//! Core protocol types: transactions, blocks, and their identities.
//!
//! All consensus hashes are SHA-256d. A transaction's id commits to its
//! inputs' outpoints and its outputs only — never to signatures or public
//! keys — so signing cannot perturb the id. Blocks and transactions are
//! treated as immutable once constructed; build blocks through
//! [`BlockBuilder`] so the merkle root and hash are stamped consistently.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::codec;
use crate::constants::{BLOCK_VERSION, COINBASE_VOUT, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::crypto;
use crate::merkle;

/// A 32-byte SHA-256d hash value.
///
/// Used for transaction ids, block hashes, and merkle nodes. Ordering is
/// lexicographic over the bytes, which equals big-endian 256-bit integer
/// order — the comparison proof-of-work relies on.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash. Marks "no previous transaction" on coinbase inputs.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hex serde for fixed-size witness fields (serde has no derive support
/// for byte arrays past 32).
mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("wrong field length"))
    }
}

/// A transaction input.
///
/// The header part (`prev_txid`, `prev_vout`) names the output being spent
/// and is what gets signed; the witness part carries the Ed25519 signature
/// and the public key that unlocks the referenced output. Coinbase inputs
/// use the sentinel outpoint and a zero-filled witness, which validation
/// never inspects but the codec still serializes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxIn {
    pub prev_txid: Hash256,
    pub prev_vout: u32,
    #[serde(with = "hex_array")]
    pub signature: [u8; SIGNATURE_SIZE],
    #[serde(with = "hex_array")]
    pub public_key: [u8; PUBLIC_KEY_SIZE],
}

impl TxIn {
    /// An unsigned input spending the given outpoint.
    pub fn unsigned(prev_txid: Hash256, prev_vout: u32) -> Self {
        Self {
            prev_txid,
            prev_vout,
            signature: [0u8; SIGNATURE_SIZE],
            public_key: [0u8; PUBLIC_KEY_SIZE],
        }
    }

    /// The coinbase input: zero previous txid, sentinel output index.
    pub fn coinbase() -> Self {
        Self::unsigned(Hash256::ZERO, COINBASE_VOUT)
    }

    pub fn is_coinbase(&self) -> bool {
        self.prev_txid.is_zero() && self.prev_vout == COINBASE_VOUT
    }
}

/// A transaction output: an amount locked to an address.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    /// Value in grains.
    pub amount: u64,
    pub address: Address,
}

/// A transfer of value from previous outputs to new outputs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// SHA-256d of the sign preimage. Derived, and revalidated against the
    /// contents during validation.
    pub id: Hash256,
    pub txins: Vec<TxIn>,
    pub txouts: Vec<TxOut>,
}

impl Transaction {
    /// Construct a transaction and stamp its id. Signing afterwards does
    /// not change the id.
    pub fn new(txins: Vec<TxIn>, txouts: Vec<TxOut>) -> Self {
        let preimage = codec::tx_sign_preimage_parts(&txins, &txouts);
        Self {
            id: crypto::sha256d(&preimage),
            txins,
            txouts,
        }
    }

    /// Recompute the id from the current inputs and outputs.
    pub fn compute_id(&self) -> Hash256 {
        crypto::sha256d(&codec::tx_sign_preimage(self))
    }

    /// A coinbase has exactly one input and that input is the sentinel.
    pub fn is_coinbase(&self) -> bool {
        self.txins.len() == 1 && self.txins[0].is_coinbase()
    }

    /// Sum of all output amounts. `None` on u64 overflow.
    pub fn total_output_amount(&self) -> Option<u64> {
        self.txouts
            .iter()
            .try_fold(0u64, |acc, txout| acc.checked_add(txout.amount))
    }
}

/// A block: header fields plus an ordered, non-empty transaction list
/// whose first entry is the coinbase.
///
/// `hash` is SHA-256d of the canonical header bytes and `merkle_root`
/// commits to the transaction ids in list order; both are recomputed and
/// checked by the validator rather than trusted from the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub version: u32,
    pub previous_hash: Hash256,
    pub hash: Hash256,
    /// Unix epoch seconds.
    pub timestamp: u32,
    pub nonce: u32,
    pub bits: u32,
    /// Total coins emitted up to and including this block. Carried and
    /// hashed here, enforced at chain connect.
    pub cumulative_emission: u64,
    pub merkle_root: Hash256,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The coinbase transaction, if the block is non-empty.
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    /// The canonical 92-byte header preimage.
    pub fn header_bytes(&self) -> [u8; crate::constants::BLOCK_HEADER_SIZE] {
        codec::block_header_bytes(self)
    }

    /// SHA-256d of the header bytes.
    pub fn compute_hash(&self) -> Hash256 {
        crypto::sha256d(&self.header_bytes())
    }
}

/// Assembles a block in one shot: set the header fields, hand over the
/// full transaction list, and `build` stamps the merkle root and hash.
#[derive(Clone, Debug)]
pub struct BlockBuilder {
    version: u32,
    previous_hash: Hash256,
    timestamp: u32,
    nonce: u32,
    bits: u32,
    cumulative_emission: u64,
    transactions: Vec<Transaction>,
}

impl BlockBuilder {
    pub fn new(previous_hash: Hash256) -> Self {
        Self {
            version: BLOCK_VERSION,
            previous_hash,
            timestamp: 0,
            nonce: 0,
            bits: 0,
            cumulative_emission: 0,
            transactions: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    pub fn cumulative_emission(mut self, cumulative_emission: u64) -> Self {
        self.cumulative_emission = cumulative_emission;
        self
    }

    pub fn transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    /// Compute the merkle root over the transactions, then the header
    /// hash, and return the finished block.
    pub fn build(self) -> Block {
        let merkle_root = merkle::transactions_merkle_root(&self.transactions);
        let mut block = Block {
            version: self.version,
            previous_hash: self.previous_hash,
            hash: Hash256::ZERO,
            timestamp: self.timestamp,
            nonce: self.nonce,
            bits: self.bits,
            cumulative_emission: self.cumulative_emission,
            merkle_root,
            transactions: self.transactions,
        };
        block.hash = block.compute_hash();
        block
    }
}
