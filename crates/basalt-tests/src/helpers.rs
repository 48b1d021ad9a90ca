//! Shared test helpers for the integration suites.

use basalt_core::address::Address;
use basalt_core::crypto::{self, KeyPair};
use basalt_core::params::NetworkParams;
use basalt_core::pow;
use basalt_core::types::{Block, BlockBuilder, Hash256, Transaction, TxIn, TxOut};

/// Easiest representable difficulty; test blocks mine in a few attempts.
pub const EASY_BITS: u32 = 0x207fffff;

/// Mainnet parameters relaxed to [`EASY_BITS`] so test mining is cheap.
pub fn easy_params() -> NetworkParams {
    let mut params = NetworkParams::mainnet();
    params.max_target_bits = EASY_BITS;
    params
}

/// An address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address::from_public_key(&[seed; 32], NetworkParams::mainnet().address_version)
}

/// The address owned by a keypair.
pub fn addr_of(kp: &KeyPair) -> Address {
    Address::from_public_key(
        &kp.public_key().to_bytes(),
        NetworkParams::mainnet().address_version,
    )
}

/// A coinbase paying `amount` to `to`. A distinct recipient per block
/// keeps coinbase txids unique across a test chain.
pub fn make_coinbase(amount: u64, to: Address) -> Transaction {
    Transaction::new(vec![TxIn::coinbase()], vec![TxOut { amount, address: to }])
}

/// A signed single-input transaction spending `(prev_txid, prev_vout)`.
pub fn make_signed_tx(
    kp: &KeyPair,
    prev_txid: Hash256,
    prev_vout: u32,
    outputs: Vec<(u64, Address)>,
) -> Transaction {
    let mut tx = Transaction::new(
        vec![TxIn::unsigned(prev_txid, prev_vout)],
        outputs
            .into_iter()
            .map(|(amount, address)| TxOut { amount, address })
            .collect(),
    );
    crypto::sign_txin(&mut tx, 0, kp).unwrap();
    tx
}

/// Assemble a block over `previous_hash` and grind the nonce until the
/// hash meets `EASY_BITS`.
pub fn mine_block(previous_hash: Hash256, timestamp: u32, txs: Vec<Transaction>) -> Block {
    let params = easy_params();
    let mut nonce = 0u32;
    loop {
        let block = BlockBuilder::new(previous_hash)
            .timestamp(timestamp)
            .bits(EASY_BITS)
            .nonce(nonce)
            .transactions(txs.clone())
            .build();
        if pow::check_proof_of_work(&block.hash, block.bits, &params) {
            return block;
        }
        nonce += 1;
    }
}

/// Parse a 64-character hex string into a hash.
pub fn hash_from_hex(s: &str) -> Hash256 {
    let bytes: [u8; 32] = hex::decode(s)
        .expect("test vector is valid hex")
        .try_into()
        .expect("test vector is 32 bytes");
    Hash256(bytes)
}
