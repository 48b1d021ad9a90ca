//! Genesis blocks for the Basalt networks.
//!
//! Hard-coded and deterministic: every node rebuilds the identical block,
//! recomputes the identical hash, and serializes the identical bytes. The
//! genesis nonces were mined offline so each genesis hash satisfies the
//! block's own bits field.

use std::sync::LazyLock;

use crate::address::Address;
use crate::codec;
use crate::constants::{BLOCK_VERSION, INITIAL_REWARD, MAX_TARGET_BITS};
use crate::crypto;
use crate::merkle;
use crate::params::Network;
use crate::types::{Block, Hash256, Transaction, TxIn, TxOut};

/// Genesis timestamp: January 1, 2026 00:00:00 UTC.
pub const GENESIS_TIMESTAMP: u32 = 1_767_225_600;

/// Message committed into the genesis coinbase output address.
pub const GENESIS_MESSAGE: &[u8] = b"Columns of cooled fire. Basalt genesis 2026.";

const MAINNET_GENESIS_NONCE: u32 = 1933;
const TESTNET_GENESIS_NONCE: u32 = 3751;

struct GenesisData {
    block: Block,
    bytes: Vec<u8>,
}

static MAINNET: LazyLock<GenesisData> =
    LazyLock::new(|| build_genesis(Network::Mainnet, MAINNET_GENESIS_NONCE));
static TESTNET: LazyLock<GenesisData> =
    LazyLock::new(|| build_genesis(Network::Testnet, TESTNET_GENESIS_NONCE));

fn data(network: Network) -> &'static GenesisData {
    match network {
        Network::Mainnet => &MAINNET,
        Network::Testnet => &TESTNET,
    }
}

/// The genesis coinbase pays to an address derived from the hash of the
/// genesis message rather than from a real key, so the first reward is
/// unspendable by construction.
pub fn genesis_address(network: Network) -> Address {
    let pseudo_key = crypto::sha256d(GENESIS_MESSAGE);
    Address::from_public_key(pseudo_key.as_bytes(), network.address_version())
}

fn build_genesis(network: Network, nonce: u32) -> GenesisData {
    let coinbase = Transaction::new(
        vec![TxIn::coinbase()],
        vec![TxOut {
            amount: INITIAL_REWARD,
            address: genesis_address(network),
        }],
    );
    let merkle_root = merkle::merkle_root(&[coinbase.id]);
    let mut block = Block {
        version: BLOCK_VERSION,
        previous_hash: Hash256::ZERO,
        hash: Hash256::ZERO,
        timestamp: GENESIS_TIMESTAMP,
        nonce,
        bits: MAX_TARGET_BITS,
        cumulative_emission: INITIAL_REWARD,
        merkle_root,
        transactions: vec![coinbase],
    };
    block.hash = block.compute_hash();
    let bytes = codec::encode_block(&block).expect("genesis is hardcoded well-formed data");
    GenesisData { block, bytes }
}

/// The genesis block for a network.
pub fn genesis_block(network: Network) -> &'static Block {
    &data(network).block
}

/// The genesis block hash for a network.
pub fn genesis_hash(network: Network) -> Hash256 {
    data(network).block.hash
}

/// The canonical serialized genesis block.
pub fn genesis_bytes(network: Network) -> &'static [u8] {
    &data(network).bytes
}

/// Whether `block` is the genesis block, by recomputed header hash.
pub fn is_genesis(block: &Block, network: Network) -> bool {
    block.compute_hash() == genesis_hash(network)
}
