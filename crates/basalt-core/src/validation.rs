//! Transaction validation.
//!
//! Two levels, used at different trust boundaries:
//!
//! - [`valid_transaction_structure`]: context-free shape checks with no
//!   signature work. This is what block validation runs per transaction,
//!   leaving Ed25519 to the separate block-wide signature pass.
//! - [`valid_transaction`]: structure plus signature verification on every
//!   input of a non-coinbase transaction — the standalone predicate for
//!   mempool-grade acceptance.
//!
//! [`do_txins_reference_unspent_txouts`] is the only operation that
//! touches external state, through the caller-supplied [`UtxoView`].

use std::collections::HashSet;

use crate::address::Address;
use crate::chain_state::UtxoView;
use crate::constants::{MAX_TX_INPUTS, MAX_TX_OUTPUTS};
use crate::crypto;
use crate::error::TransactionError;
use crate::params::NetworkParams;
use crate::types::{Transaction, TxOut};

/// Context-free structural checks.
///
/// - at least one input and one output, at most 255 of each
/// - the stored id matches the recomputed txid
/// - every output amount is non-zero and the total does not overflow
/// - a non-coinbase transaction spends no outpoint twice
pub fn valid_transaction_structure(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.txins.is_empty() || tx.txouts.is_empty() {
        return Err(TransactionError::EmptyInputsOrOutputs);
    }
    if tx.txins.len() > MAX_TX_INPUTS {
        return Err(TransactionError::TooManyInputs(tx.txins.len()));
    }
    if tx.txouts.len() > MAX_TX_OUTPUTS {
        return Err(TransactionError::TooManyOutputs(tx.txouts.len()));
    }

    if tx.compute_id() != tx.id {
        return Err(TransactionError::IdMismatch);
    }

    for (i, txout) in tx.txouts.iter().enumerate() {
        if txout.amount == 0 {
            return Err(TransactionError::ZeroAmountOutput(i));
        }
    }
    if tx.total_output_amount().is_none() {
        return Err(TransactionError::AmountOverflow);
    }

    if !tx.is_coinbase() {
        let mut seen = HashSet::with_capacity(tx.txins.len());
        for txin in &tx.txins {
            if !seen.insert((txin.prev_txid, txin.prev_vout)) {
                return Err(TransactionError::DuplicateSpend(format!(
                    "{}:{}",
                    txin.prev_txid, txin.prev_vout
                )));
            }
        }
    }

    Ok(())
}

/// Full standalone validation: structure plus a signature check on every
/// input of a non-coinbase transaction. Coinbase witness bytes are never
/// inspected.
pub fn valid_transaction(tx: &Transaction) -> Result<(), TransactionError> {
    valid_transaction_structure(tx)?;
    if !tx.is_coinbase() {
        for index in 0..tx.txins.len() {
            crypto::verify_txin(tx, index)
                .map_err(|_| TransactionError::InvalidSignature { index })?;
        }
    }
    Ok(())
}

/// Resolve every input against the UTXO view.
///
/// Each non-coinbase input must reference an unspent output whose address
/// equals the address derived from the input's public key. Returns the
/// referenced outputs in input order so the caller can reason about value
/// conservation. Coinbase inputs are skipped.
///
/// [`TransactionError::MissingPrevout`] may be transient while syncing and
/// is the only error kind worth retrying; everything else is permanent for
/// these bytes.
pub fn do_txins_reference_unspent_txouts<V: UtxoView + ?Sized>(
    tx: &Transaction,
    view: &V,
    params: &NetworkParams,
) -> Result<Vec<TxOut>, TransactionError> {
    let mut referenced = Vec::with_capacity(tx.txins.len());
    for (index, txin) in tx.txins.iter().enumerate() {
        if txin.is_coinbase() {
            continue;
        }
        let txout = view
            .lookup(&txin.prev_txid, txin.prev_vout)
            .ok_or_else(|| {
                TransactionError::MissingPrevout(format!("{}:{}", txin.prev_txid, txin.prev_vout))
            })?;
        let owner = Address::from_public_key(&txin.public_key, params.address_version);
        if txout.address != owner {
            return Err(TransactionError::WrongOwner { index });
        }
        referenced.push(txout);
    }
    Ok(referenced)
}
