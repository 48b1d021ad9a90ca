//! SHA-256d merkle commitment over transaction ids.
//!
//! Leaves are the txids themselves — no extra hashing at the leaf level.
//! An internal node is `sha256d(left ‖ right)`. A level with an odd number
//! of nodes pairs its last node with itself, at every level independently.
//! The tree is a transient per-level vector, collapsed bottom-up inside
//! the call; nothing escapes and the odd-level duplicate is a read of the
//! same slot rather than a second owner.

use crate::crypto;
use crate::types::{Hash256, Transaction};

/// Hash of an internal node over its two children.
pub fn node_hash(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(left.as_bytes());
    data[32..].copy_from_slice(right.as_bytes());
    crypto::sha256d(&data)
}

/// The merkle root over leaves in list order.
///
/// A single leaf is its own root. An empty list has no defined root and
/// yields [`Hash256::ZERO`]; blocks are rejected for emptiness before the
/// merkle engine is ever consulted.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return Hash256::ZERO;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

fn next_level(level: &[Hash256]) -> Vec<Hash256> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    let mut i = 0;
    while i < level.len() {
        let left = &level[i];
        let right = if i + 1 < level.len() { &level[i + 1] } else { left };
        next.push(node_hash(left, right));
        i += 2;
    }
    next
}

/// Root over the recomputed ids of `transactions`, in list order.
pub fn transactions_merkle_root(transactions: &[Transaction]) -> Hash256 {
    let txids: Vec<Hash256> = transactions.iter().map(Transaction::compute_id).collect();
    merkle_root(&txids)
}
