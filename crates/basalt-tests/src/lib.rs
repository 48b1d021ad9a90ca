//! End-to-end consensus tests for Basalt.
//!
//! The integration suites exercise the core the way a node would: decode,
//! validate, connect to a UTXO view, and store — including the literal
//! scenarios every implementation must agree on byte-for-byte.

pub mod helpers;
