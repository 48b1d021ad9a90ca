//! Network parameters.
//!
//! Every consensus entry point takes an explicit [`NetworkParams`] value;
//! there is no process-wide network singleton. All nodes of one network
//! must agree on every field here bit-for-bit.

use serde::{Deserialize, Serialize};

use crate::constants::{BLOCK_VERSION, MAX_BLOCK_SIZE, MAX_FUTURE_BLOCK_TIME, MAX_TARGET_BITS};
use crate::genesis;
use crate::pow;
use crate::types::{Block, Hash256};

/// Which Basalt network a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// The version byte prepended to addresses on this network.
    pub fn address_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x42,
            Network::Testnet => 0x62,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

/// Consensus parameters for one network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkParams {
    pub network: Network,
    pub block_version: u32,
    pub address_version: u8,
    /// Easiest allowed difficulty in compact encoding; decoded targets
    /// clamp to this.
    pub max_target_bits: u32,
    /// Upper bound on [`block_consensus_size`](crate::codec::block_consensus_size).
    pub max_block_size: usize,
    /// Accepted clock drift for block timestamps, in seconds.
    pub max_future_block_time: u64,
}

impl NetworkParams {
    pub fn mainnet() -> Self {
        Self::for_network(Network::Mainnet)
    }

    pub fn testnet() -> Self {
        Self::for_network(Network::Testnet)
    }

    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            block_version: BLOCK_VERSION,
            address_version: network.address_version(),
            max_target_bits: MAX_TARGET_BITS,
            max_block_size: MAX_BLOCK_SIZE,
            max_future_block_time: MAX_FUTURE_BLOCK_TIME,
        }
    }

    /// The decoded maximum target. A misconfigured `max_target_bits`
    /// yields the zero target, which rejects every hash.
    pub fn max_target(&self) -> [u8; 32] {
        pow::decode_compact_target(self.max_target_bits).unwrap_or([0u8; 32])
    }

    /// This network's genesis block.
    pub fn genesis(&self) -> &'static Block {
        genesis::genesis_block(self.network)
    }

    /// Hash of this network's genesis block. A deserialized block starts
    /// the chain when its `previous_hash` equals this.
    pub fn genesis_hash(&self) -> Hash256 {
        genesis::genesis_hash(self.network)
    }
}
