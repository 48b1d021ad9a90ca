//! Proof-of-work target decoding and checking.
//!
//! The `bits` field compactly encodes a 256-bit big-endian target as
//! `mantissa · 256^(exponent − 3)`, exponent in the top byte and a 23-bit
//! mantissa below it. The mantissa sign bit is forbidden. A block hash,
//! read as a big-endian 256-bit integer, must be less than or equal to
//! the decoded target, which is itself clamped to the network's maximum
//! (easiest) target.

use crate::params::NetworkParams;
use crate::types::Hash256;

const MANTISSA_MASK: u32 = 0x007f_ffff;
const MANTISSA_SIGN_BIT: u32 = 0x0080_0000;

/// Decode a compact target into 32 big-endian bytes.
///
/// `None` when the encoding is invalid: a set mantissa sign bit, a zero
/// mantissa, or an exponent that shifts the mantissa past 256 bits.
pub fn decode_compact_target(bits: u32) -> Option<[u8; 32]> {
    if bits & MANTISSA_SIGN_BIT != 0 {
        return None;
    }
    let exponent = (bits >> 24) as usize;
    let mantissa = bits & MANTISSA_MASK;
    if mantissa == 0 {
        return None;
    }

    let mut target = [0u8; 32];
    if exponent <= 3 {
        let value = mantissa >> (8 * (3 - exponent));
        let be = value.to_be_bytes();
        target[32 - exponent..].copy_from_slice(&be[4 - exponent..]);
    } else {
        if exponent > 32 {
            return None;
        }
        let start = 32 - exponent;
        let be = mantissa.to_be_bytes();
        target[start..start + 3].copy_from_slice(&be[1..4]);
    }
    Some(target)
}

/// The decoded target for a bits field, clamped to the network maximum.
pub fn target_for_bits(bits: u32, params: &NetworkParams) -> Option<[u8; 32]> {
    let target = decode_compact_target(bits)?;
    let limit = params.max_target();
    Some(if target > limit { limit } else { target })
}

/// Whether `hash`, as a big-endian 256-bit integer, meets the target
/// encoded by `bits`. Invalid bits never pass.
pub fn check_proof_of_work(hash: &Hash256, bits: u32, params: &NetworkParams) -> bool {
    match target_for_bits(bits, params) {
        Some(target) => hash.0 <= target,
        None => false,
    }
}
