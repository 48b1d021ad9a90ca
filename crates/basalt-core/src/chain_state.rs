//! UTXO view and block storage collaborators.
//!
//! The consensus core performs no I/O of its own: it reads unspent
//! outputs through a caller-supplied [`UtxoView`] snapshot and hands
//! validated blocks to a [`BlockStore`] keyed by block hash. The
//! in-memory implementations here back the test suites and light tooling;
//! a full node wires the same traits to its database.

use std::collections::HashMap;

use crate::codec;
use crate::error::StoreError;
use crate::types::{Block, Hash256, TxOut};

/// Read-only snapshot of the unspent output set.
///
/// Must stay consistent for the duration of one validation call; it may
/// be shared across threads for concurrent readers.
pub trait UtxoView {
    /// The unspent output created by `prev_txid` at `prev_vout`, or
    /// `None` if it never existed or was already spent.
    fn lookup(&self, prev_txid: &Hash256, prev_vout: u32) -> Option<TxOut>;

    /// Whether the referenced output is absent from the view.
    fn is_spent(&self, prev_txid: &Hash256, prev_vout: u32) -> bool {
        self.lookup(prev_txid, prev_vout).is_none()
    }
}

/// In-memory UTXO set.
#[derive(Clone, Debug, Default)]
pub struct MemoryUtxoSet {
    utxos: HashMap<(Hash256, u32), TxOut>,
}

impl MemoryUtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, txid: Hash256, vout: u32, txout: TxOut) {
        self.utxos.insert((txid, vout), txout);
    }

    pub fn remove(&mut self, txid: &Hash256, vout: u32) -> Option<TxOut> {
        self.utxos.remove(&(*txid, vout))
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Apply a validated block: spend every non-coinbase input, then
    /// insert every created output. Outputs created by this block cannot
    /// be spent by it.
    pub fn connect_block(&mut self, block: &Block) -> Result<(), StoreError> {
        for tx in &block.transactions {
            for txin in &tx.txins {
                if txin.is_coinbase() {
                    continue;
                }
                self.remove(&txin.prev_txid, txin.prev_vout).ok_or_else(|| {
                    StoreError::MissingUtxo(format!("{}:{}", txin.prev_txid, txin.prev_vout))
                })?;
            }
        }
        for tx in &block.transactions {
            for (vout, txout) in tx.txouts.iter().enumerate() {
                self.insert(tx.id, vout as u32, txout.clone());
            }
        }
        Ok(())
    }
}

impl UtxoView for MemoryUtxoSet {
    fn lookup(&self, prev_txid: &Hash256, prev_vout: u32) -> Option<TxOut> {
        self.utxos.get(&(*prev_txid, prev_vout)).cloned()
    }
}

/// Content-addressed block storage.
pub trait BlockStore {
    /// Store a block under its hash. The value is the canonical
    /// serialization.
    fn put_block(&mut self, block: &Block) -> Result<(), StoreError>;

    /// Load and decode a block by hash.
    fn get_block(&self, hash: &Hash256) -> Result<Option<Block>, StoreError>;

    fn contains(&self, hash: &Hash256) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory block store holding canonical serialized blocks.
#[derive(Clone, Debug, Default)]
pub struct MemoryBlockStore {
    blocks: HashMap<Hash256, Vec<u8>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw stored bytes for a block, if present.
    pub fn get_bytes(&self, hash: &Hash256) -> Option<&[u8]> {
        self.blocks.get(hash).map(Vec::as_slice)
    }
}

impl BlockStore for MemoryBlockStore {
    fn put_block(&mut self, block: &Block) -> Result<(), StoreError> {
        if self.blocks.contains_key(&block.hash) {
            return Err(StoreError::DuplicateBlock(block.hash.to_string()));
        }
        let bytes = codec::encode_block(block)?;
        self.blocks.insert(block.hash, bytes);
        Ok(())
    }

    fn get_block(&self, hash: &Hash256) -> Result<Option<Block>, StoreError> {
        match self.blocks.get(hash) {
            Some(bytes) => Ok(Some(codec::decode_block(bytes)?)),
            None => Ok(None),
        }
    }

    fn contains(&self, hash: &Hash256) -> bool {
        self.blocks.contains_key(hash)
    }

    fn len(&self) -> usize {
        self.blocks.len()
    }
}
