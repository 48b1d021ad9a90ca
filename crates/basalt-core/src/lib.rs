//! # basalt-core
//! Consensus types, canonical codec, and validation for the Basalt
//! protocol.
//!
//! Everything here is a pure function of its arguments: the only external
//! state is reached through the [`chain_state::UtxoView`] snapshot a
//! caller supplies, and network parameters travel as an explicit
//! [`params::NetworkParams`] value. Distinct blocks may be validated on
//! distinct threads concurrently.

pub mod address;
pub mod block_validation;
pub mod chain_state;
pub mod codec;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod genesis;
pub mod merkle;
pub mod params;
pub mod pow;
pub mod types;
pub mod validation;
