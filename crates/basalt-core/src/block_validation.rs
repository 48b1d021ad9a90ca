//! Block validation.
//!
//! [`valid_block`] applies the consensus rule set in a fixed order, cheap
//! checks first; any failure rejects the block with a reason tag. Input
//! signatures are deliberately not part of it — they live in the separate
//! [`validate_block_signatures`] pass so header-first sync can defer the
//! Ed25519 work — and UTXO resolution lives in [`check_block_inputs`],
//! run by the chain-connect logic against a snapshot view.

use std::collections::HashSet;

use tracing::debug;

use crate::chain_state::UtxoView;
use crate::codec;
use crate::crypto;
use crate::error::{BlockError, TransactionError};
use crate::merkle;
use crate::params::NetworkParams;
use crate::pow;
use crate::types::{Block, Hash256};
use crate::validation;

/// SHA-256d of the canonical 92-byte header.
pub fn compute_block_hash(block: &Block) -> Hash256 {
    crypto::sha256d(&codec::block_header_bytes(block))
}

/// The timestamp may run ahead of the wall clock by at most
/// `max_future_block_time` seconds; the boundary itself is accepted.
pub fn valid_block_timestamp(block: &Block, now: u64, params: &NetworkParams) -> bool {
    u64::from(block.timestamp) <= now.saturating_add(params.max_future_block_time)
}

/// The stored hash must match the recomputed header hash and meet the
/// proof-of-work target encoded in `bits`.
pub fn valid_block_hash(block: &Block, params: &NetworkParams) -> bool {
    compute_block_hash(block) == block.hash
        && pow::check_proof_of_work(&block.hash, block.bits, params)
}

/// The stored merkle root must equal the root recomputed over the
/// transaction ids in list order.
pub fn valid_merkle_root(block: &Block) -> bool {
    merkle::transactions_merkle_root(&block.transactions) == block.merkle_root
}

/// Apply the full ordered rule set to one block.
///
/// 1. timestamp within the future window
/// 2. at least one transaction
/// 3. the first transaction is a coinbase
/// 4. every transaction is structurally valid; only the first is a coinbase
/// 5. no two transactions share a txid
/// 6. no two inputs anywhere in the block spend the same outpoint
/// 7. header-plus-transactions size within `max_block_size`
/// 8. stored hash matches the header bytes and meets the target
/// 9. merkle root commits to the transactions
pub fn valid_block(block: &Block, params: &NetworkParams, now: u64) -> Result<(), BlockError> {
    if !valid_block_timestamp(block, now, params) {
        debug!(timestamp = block.timestamp, now, "block timestamp too far in the future");
        return Err(BlockError::TimestampTooFar {
            timestamp: block.timestamp,
            now,
            max_future: params.max_future_block_time,
        });
    }

    if block.transactions.is_empty() {
        return Err(BlockError::NoTransactions);
    }

    if !block.transactions[0].is_coinbase() {
        return Err(BlockError::FirstTxNotCoinbase);
    }

    for (index, tx) in block.transactions.iter().enumerate() {
        validation::valid_transaction_structure(tx)
            .map_err(|source| BlockError::Transaction { index, source })?;
        if index > 0 && tx.is_coinbase() {
            return Err(BlockError::ExtraCoinbase(index));
        }
    }

    let mut txids = HashSet::with_capacity(block.transactions.len());
    for tx in &block.transactions {
        if !txids.insert(tx.id) {
            return Err(BlockError::DuplicateTxid(tx.id.to_string()));
        }
    }

    let mut spent = HashSet::new();
    for tx in &block.transactions {
        for txin in &tx.txins {
            if !spent.insert((txin.prev_txid, txin.prev_vout)) {
                return Err(BlockError::DuplicateSpend(format!(
                    "{}:{}",
                    txin.prev_txid, txin.prev_vout
                )));
            }
        }
    }

    let size = codec::block_consensus_size(block);
    if size > params.max_block_size {
        debug!(size, max = params.max_block_size, "block is oversized");
        return Err(BlockError::OversizedBlock {
            size,
            max: params.max_block_size,
        });
    }

    if compute_block_hash(block) != block.hash {
        debug!(hash = %block.hash, "stored block hash does not match the header bytes");
        return Err(BlockError::HashMismatch);
    }
    if !pow::check_proof_of_work(&block.hash, block.bits, params) {
        return Err(BlockError::InvalidPow);
    }

    if !valid_merkle_root(block) {
        return Err(BlockError::MerkleMismatch);
    }

    Ok(())
}

/// Verify every non-coinbase input signature in the block.
pub fn validate_block_signatures(block: &Block) -> Result<(), BlockError> {
    for (index, tx) in block.transactions.iter().enumerate() {
        if tx.is_coinbase() {
            continue;
        }
        for (input_index, txin) in tx.txins.iter().enumerate() {
            if txin.is_coinbase() {
                continue;
            }
            crypto::verify_txin(tx, input_index).map_err(|_| BlockError::Transaction {
                index,
                source: TransactionError::InvalidSignature { index: input_index },
            })?;
        }
    }
    Ok(())
}

/// Resolve every transaction's inputs against a UTXO snapshot.
///
/// The block-level companion to
/// [`do_txins_reference_unspent_txouts`](crate::validation::do_txins_reference_unspent_txouts),
/// run at connect time. A missing prevout may be transient while syncing;
/// whether to retry is the caller's policy.
pub fn check_block_inputs<V: UtxoView + ?Sized>(
    block: &Block,
    view: &V,
    params: &NetworkParams,
) -> Result<(), BlockError> {
    for (index, tx) in block.transactions.iter().enumerate() {
        validation::do_txins_reference_unspent_txouts(tx, view, params)
            .map_err(|source| BlockError::Transaction { index, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::chain_state::MemoryUtxoSet;
    use crate::constants::COIN;
    use crate::crypto::KeyPair;
    use crate::types::{BlockBuilder, Transaction, TxIn, TxOut};

    const NOW: u64 = 1_767_226_000;

    /// Easiest representable difficulty, so test mining takes a couple of
    /// nonce attempts instead of tens of thousands.
    const EASY_BITS: u32 = 0x207fffff;

    fn params() -> NetworkParams {
        let mut params = NetworkParams::mainnet();
        params.max_target_bits = EASY_BITS;
        params
    }

    fn addr(seed: u8) -> Address {
        Address::from_public_key(&[seed; 32], params().address_version)
    }

    fn coinbase(amount: u64) -> Transaction {
        Transaction::new(
            vec![TxIn::coinbase()],
            vec![TxOut { amount, address: addr(0xAA) }],
        )
    }

    fn signed_tx(kp: &KeyPair, prev_txid: Hash256, prev_vout: u32, amount: u64) -> Transaction {
        let mut tx = Transaction::new(
            vec![TxIn::unsigned(prev_txid, prev_vout)],
            vec![TxOut { amount, address: addr(0xBB) }],
        );
        crypto::sign_txin(&mut tx, 0, kp).unwrap();
        tx
    }

    /// Build a block and grind the nonce until the hash meets its bits.
    fn mined_block(txs: Vec<Transaction>) -> Block {
        let mut nonce = 0u32;
        loop {
            let block = BlockBuilder::new(Hash256([0x01; 32]))
                .timestamp(NOW as u32)
                .bits(EASY_BITS)
                .nonce(nonce)
                .transactions(txs.clone())
                .build();
            if pow::check_proof_of_work(&block.hash, block.bits, &params()) {
                return block;
            }
            nonce += 1;
        }
    }

    // --- sub-predicates ---

    #[test]
    fn timestamp_boundary_is_inclusive() {
        let mut block = BlockBuilder::new(Hash256::ZERO)
            .transactions(vec![coinbase(COIN)])
            .build();
        block.timestamp = (NOW + params().max_future_block_time) as u32;
        assert!(valid_block_timestamp(&block, NOW, &params()));
        block.timestamp += 1;
        assert!(!valid_block_timestamp(&block, NOW, &params()));
    }

    #[test]
    fn block_hash_requires_match_and_pow() {
        let block = mined_block(vec![coinbase(COIN)]);
        assert!(valid_block_hash(&block, &params()));

        let mut stale = block.clone();
        stale.nonce += 1; // hash field no longer matches the header
        assert!(!valid_block_hash(&stale, &params()));

        let mut weak = block.clone();
        weak.bits = 0x03000001; // absurd difficulty: match ok, PoW fails
        weak.hash = weak.compute_hash();
        assert!(!valid_block_hash(&weak, &params()));
    }

    #[test]
    fn merkle_root_predicate() {
        let block = mined_block(vec![coinbase(COIN)]);
        assert!(valid_merkle_root(&block));
        let mut tampered = block;
        tampered.merkle_root = Hash256([0xFF; 32]);
        assert!(!valid_merkle_root(&tampered));
    }

    // --- valid_block, rule by rule ---

    #[test]
    fn accepts_coinbase_only_block() {
        let block = mined_block(vec![coinbase(COIN)]);
        assert_eq!(valid_block(&block, &params(), NOW), Ok(()));
    }

    #[test]
    fn accepts_block_with_regular_transactions() {
        let kp = KeyPair::generate();
        let block = mined_block(vec![
            coinbase(COIN),
            signed_tx(&kp, Hash256([0x22; 32]), 0, 49 * COIN),
        ]);
        assert_eq!(valid_block(&block, &params(), NOW), Ok(()));
    }

    #[test]
    fn rejects_future_timestamp() {
        let mut block = mined_block(vec![coinbase(COIN)]);
        block.timestamp = (NOW + params().max_future_block_time + 1) as u32;
        assert!(matches!(
            valid_block(&block, &params(), NOW),
            Err(BlockError::TimestampTooFar { .. })
        ));
    }

    #[test]
    fn rejects_empty_block() {
        let block = BlockBuilder::new(Hash256::ZERO)
            .timestamp(NOW as u32)
            .transactions(vec![])
            .build();
        assert_eq!(valid_block(&block, &params(), NOW), Err(BlockError::NoTransactions));
    }

    #[test]
    fn rejects_non_coinbase_first() {
        let kp = KeyPair::generate();
        let block = mined_block(vec![signed_tx(&kp, Hash256([0x22; 32]), 0, COIN)]);
        assert_eq!(
            valid_block(&block, &params(), NOW),
            Err(BlockError::FirstTxNotCoinbase)
        );
    }

    #[test]
    fn rejects_second_coinbase() {
        let block = mined_block(vec![coinbase(COIN), coinbase(2 * COIN)]);
        assert_eq!(
            valid_block(&block, &params(), NOW),
            Err(BlockError::ExtraCoinbase(1))
        );
    }

    #[test]
    fn rejects_structurally_bad_transaction_with_index() {
        let kp = KeyPair::generate();
        let mut bad = signed_tx(&kp, Hash256([0x22; 32]), 0, COIN);
        bad.txouts[0].amount = 0;
        bad.id = bad.compute_id();
        let block = mined_block(vec![coinbase(COIN), bad]);
        assert_eq!(
            valid_block(&block, &params(), NOW),
            Err(BlockError::Transaction {
                index: 1,
                source: TransactionError::ZeroAmountOutput(0),
            })
        );
    }

    #[test]
    fn rejects_duplicate_txids() {
        let kp = KeyPair::generate();
        let tx = signed_tx(&kp, Hash256([0x22; 32]), 0, COIN);
        let block = mined_block(vec![coinbase(COIN), tx.clone(), tx]);
        // Identical transactions also collide on the spent outpoint, but
        // the txid dedup runs first.
        assert!(matches!(
            valid_block(&block, &params(), NOW),
            Err(BlockError::DuplicateTxid(_))
        ));
    }

    #[test]
    fn rejects_duplicate_spend_across_transactions() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let outpoint = Hash256([0xAA; 32]);
        // Different keys and amounts → distinct txids, same outpoint.
        let block = mined_block(vec![
            coinbase(COIN),
            signed_tx(&kp1, outpoint, 0, 25 * COIN),
            signed_tx(&kp2, outpoint, 0, 24 * COIN),
        ]);
        assert!(matches!(
            valid_block(&block, &params(), NOW),
            Err(BlockError::DuplicateSpend(_))
        ));
    }

    #[test]
    fn rejects_sentinel_input_colliding_with_coinbase() {
        // A non-coinbase transaction smuggling a sentinel input collides
        // with the coinbase's input in the block-wide spend sweep.
        let kp = KeyPair::generate();
        let mut smuggler = Transaction::new(
            vec![TxIn::unsigned(Hash256([0x22; 32]), 0), TxIn::coinbase()],
            vec![TxOut { amount: COIN, address: addr(0xCC) }],
        );
        crypto::sign_txin(&mut smuggler, 0, &kp).unwrap();
        let block = mined_block(vec![coinbase(COIN), smuggler]);
        assert!(matches!(
            valid_block(&block, &params(), NOW),
            Err(BlockError::DuplicateSpend(_))
        ));
    }

    #[test]
    fn rejects_oversized_block() {
        let block = mined_block(vec![coinbase(COIN)]);
        let mut small = params();
        small.max_block_size = codec::block_consensus_size(&block) - 1;
        assert!(matches!(
            valid_block(&block, &small, NOW),
            Err(BlockError::OversizedBlock { .. })
        ));
    }

    #[test]
    fn rejects_stale_hash() {
        let mut block = mined_block(vec![coinbase(COIN)]);
        block.nonce += 1;
        assert_eq!(valid_block(&block, &params(), NOW), Err(BlockError::HashMismatch));
    }

    #[test]
    fn rejects_insufficient_pow() {
        let mut block = mined_block(vec![coinbase(COIN)]);
        block.bits = 0x03000001;
        block.hash = block.compute_hash();
        assert_eq!(valid_block(&block, &params(), NOW), Err(BlockError::InvalidPow));
    }

    #[test]
    fn rejects_wrong_merkle_root() {
        let base = mined_block(vec![coinbase(COIN)]);
        // Re-mine with a corrupted root so only rule 9 trips.
        let mut nonce = 0u32;
        let block = loop {
            let mut candidate = base.clone();
            candidate.merkle_root = Hash256([0xFF; 32]);
            candidate.nonce = nonce;
            candidate.hash = candidate.compute_hash();
            if pow::check_proof_of_work(&candidate.hash, candidate.bits, &params()) {
                break candidate;
            }
            nonce += 1;
        };
        assert_eq!(valid_block(&block, &params(), NOW), Err(BlockError::MerkleMismatch));
    }

    // --- signatures are a separate pass ---

    #[test]
    fn tampered_signature_passes_valid_block_but_fails_signature_pass() {
        let kp = KeyPair::generate();
        let mut tx = signed_tx(&kp, Hash256([0x22; 32]), 0, 49 * COIN);
        tx.txins[0].signature[0] ^= 0x01; // txid is witness-free, id still valid
        let block = mined_block(vec![coinbase(COIN), tx]);

        assert_eq!(valid_block(&block, &params(), NOW), Ok(()));
        assert_eq!(
            validate_block_signatures(&block),
            Err(BlockError::Transaction {
                index: 1,
                source: TransactionError::InvalidSignature { index: 0 },
            })
        );
    }

    #[test]
    fn signature_pass_accepts_properly_signed_block() {
        let kp = KeyPair::generate();
        let block = mined_block(vec![
            coinbase(COIN),
            signed_tx(&kp, Hash256([0x22; 32]), 0, 49 * COIN),
        ]);
        assert_eq!(validate_block_signatures(&block), Ok(()));
    }

    #[test]
    fn signature_pass_ignores_coinbase_witness() {
        let mut cb = coinbase(COIN);
        cb.txins[0].signature = [0xFF; 64]; // garbage witness, same txid
        let block = mined_block(vec![cb]);
        assert_eq!(validate_block_signatures(&block), Ok(()));
    }

    // --- UTXO sweep ---

    #[test]
    fn block_inputs_resolve_against_view() {
        let kp = KeyPair::generate();
        let prev = Hash256([0x22; 32]);
        let owner = Address::from_public_key(&kp.public_key().to_bytes(), params().address_version);
        let block = mined_block(vec![coinbase(COIN), signed_tx(&kp, prev, 0, 49 * COIN)]);

        let mut utxos = MemoryUtxoSet::new();
        utxos.insert(prev, 0, TxOut { amount: 50 * COIN, address: owner });
        assert_eq!(check_block_inputs(&block, &utxos, &params()), Ok(()));

        let empty = MemoryUtxoSet::new();
        assert!(matches!(
            check_block_inputs(&block, &empty, &params()),
            Err(BlockError::Transaction {
                index: 1,
                source: TransactionError::MissingPrevout(_),
            })
        ));
    }
}
