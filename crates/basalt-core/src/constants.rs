//! Protocol constants. All monetary values are in grains (1 BSL = 10^8 grains).

pub const COIN: u64 = 100_000_000;
pub const INITIAL_REWARD: u64 = 50 * COIN;

pub const HASH_SIZE: usize = 32;
/// One version byte followed by the SHA-256d of the public key.
pub const ADDRESS_SIZE: usize = 1 + HASH_SIZE;
pub const SIGNATURE_SIZE: usize = 64;
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Reserved tail of the header buffer. Always zero, always hashed.
pub const BLOCK_HEADER_RESERVED: usize = 4;
/// Serialized block header length: four u32 fields, one u64, two hashes,
/// and the reserved tail. These 92 bytes are the block-hash preimage.
pub const BLOCK_HEADER_SIZE: usize = 4 * 4 + 8 + 2 * HASH_SIZE + BLOCK_HEADER_RESERVED;

/// Signed per-input header: previous txid and output index.
pub const TXIN_SIGN_HEADER_SIZE: usize = HASH_SIZE + 4;
/// Signed per-output header: amount and address.
pub const TXOUT_SIGN_HEADER_SIZE: usize = 8 + ADDRESS_SIZE;

pub const BLOCK_VERSION: u32 = 1;
/// Output index sentinel marking a coinbase input.
pub const COINBASE_VOUT: u32 = u32::MAX;

/// Input and output counts travel as a single byte each.
pub const MAX_TX_INPUTS: usize = u8::MAX as usize;
pub const MAX_TX_OUTPUTS: usize = u8::MAX as usize;

pub const MAX_BLOCK_SIZE: usize = 1_048_576;
/// Accepted clock drift for block timestamps, in seconds.
pub const MAX_FUTURE_BLOCK_TIME: u64 = 2 * 60 * 60;
/// Easiest allowed difficulty, in compact encoding.
pub const MAX_TARGET_BITS: u32 = 0x1f00ffff;

/// Smallest possible wire transaction: length-prefixed id plus two count bytes.
pub const MIN_TX_WIRE_SIZE: usize = 4 + HASH_SIZE + 2;
