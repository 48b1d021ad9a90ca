//! Error types for the Basalt protocol.
use thiserror::Error;

/// Canonical codec failures. Decoding is all-or-nothing: none of these
/// leave a partially constructed value behind, and the same bytes will
/// never decode successfully later.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input: need {needed} bytes, {remaining} left")] UnexpectedEof { needed: usize, remaining: usize },
    #[error("bad length prefix for {field}: expected {expected}, got {got}")] LengthMismatch { field: &'static str, expected: usize, got: usize },
    #[error("transaction count {0} cannot fit in a block")] OversizedTransactionCount(u32),
    #[error("too many inputs: {0}")] TooManyInputs(usize),
    #[error("too many outputs: {0}")] TooManyOutputs(usize),
    #[error("{0} trailing bytes after value")] TrailingBytes(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("empty inputs or outputs")] EmptyInputsOrOutputs,
    #[error("too many inputs: {0}")] TooManyInputs(usize),
    #[error("too many outputs: {0}")] TooManyOutputs(usize),
    #[error("transaction id does not match its contents")] IdMismatch,
    #[error("zero-amount output at index {0}")] ZeroAmountOutput(usize),
    #[error("output amount overflow")] AmountOverflow,
    #[error("invalid signature on input {index}")] InvalidSignature { index: usize },
    #[error("duplicate spend of {0}")] DuplicateSpend(String),
    #[error("unknown or spent output: {0}")] MissingPrevout(String),
    #[error("input {index} does not own the referenced output")] WrongOwner { index: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("timestamp {timestamp} is more than {max_future}s past {now}")] TimestampTooFar { timestamp: u32, now: u64, max_future: u64 },
    #[error("block has no transactions")] NoTransactions,
    #[error("first transaction is not a coinbase")] FirstTxNotCoinbase,
    #[error("coinbase at position {0}")] ExtraCoinbase(usize),
    #[error("invalid transaction {index}: {source}")] Transaction { index: usize, source: TransactionError },
    #[error("duplicate txid {0}")] DuplicateTxid(String),
    #[error("duplicate spend of {0}")] DuplicateSpend(String),
    #[error("oversized block: {size} > {max}")] OversizedBlock { size: usize, max: usize },
    #[error("stored hash does not match the header bytes")] HashMismatch,
    #[error("hash does not meet the proof-of-work target")] InvalidPow,
    #[error("merkle root does not commit to the transactions")] MerkleMismatch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("signature verification failed")] VerificationFailed,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid base58: {0}")] InvalidBase58(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate block: {0}")] DuplicateBlock(String),
    #[error("missing UTXO: {0}")] MissingUtxo(String),
    #[error(transparent)] Codec(#[from] CodecError),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)] Codec(#[from] CodecError),
    #[error(transparent)] Transaction(#[from] TransactionError),
    #[error(transparent)] Block(#[from] BlockError),
    #[error(transparent)] Crypto(#[from] CryptoError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Store(#[from] StoreError),
}
