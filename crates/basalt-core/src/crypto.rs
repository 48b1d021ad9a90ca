//! Hashing and Ed25519 signing for the Basalt protocol.
//!
//! [`sha256d`] is the single hash primitive behind txids, block hashes,
//! merkle nodes, and address derivation. Transaction inputs are signed
//! over the transaction's sign preimage — every input of a transaction
//! shares one preimage, and the preimage excludes signatures and public
//! keys so signing order does not matter.

use ed25519_dalek::{Signer, Verifier};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::codec;
use crate::error::CryptoError;
use crate::types::{Hash256, Transaction};

/// SHA-256 applied twice in sequence.
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    Hash256(Sha256::digest(first).into())
}

/// Ed25519 keypair for signing transaction inputs.
///
/// Wraps [`ed25519_dalek::SigningKey`]; the secret is zeroized on drop by
/// the underlying library.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Deterministic keypair from 32 bytes of secret material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Raw secret key bytes. Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message, returning the raw 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_secret_bytes(self.secret_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key for verifying input signatures.
#[derive(Clone)]
pub struct PublicKey {
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key })
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

/// Sign one input of a transaction in place.
///
/// Computes the sign preimage, signs it, and stamps the input's signature
/// and public key. The preimage excludes witness bytes, so inputs can be
/// signed in any order and the txid is unaffected.
pub fn sign_txin(
    tx: &mut Transaction,
    input_index: usize,
    keypair: &KeyPair,
) -> Result<(), CryptoError> {
    if input_index >= tx.txins.len() {
        return Err(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.txins.len(),
        });
    }
    let preimage = codec::tx_sign_preimage(tx);
    tx.txins[input_index].signature = keypair.sign(&preimage);
    tx.txins[input_index].public_key = keypair.public_key().to_bytes();
    Ok(())
}

/// Verify one input's signature under its stated public key.
pub fn verify_txin(tx: &Transaction, input_index: usize) -> Result<(), CryptoError> {
    let txin = tx
        .txins
        .get(input_index)
        .ok_or(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.txins.len(),
        })?;
    let public_key = PublicKey::from_bytes(&txin.public_key)?;
    let preimage = codec::tx_sign_preimage(tx);
    public_key.verify(&preimage, &txin.signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::constants::COIN;
    use crate::params::Network;
    use crate::types::{TxIn, TxOut};

    fn unsigned_tx() -> Transaction {
        Transaction::new(
            vec![TxIn::unsigned(Hash256([0x11; 32]), 0)],
            vec![TxOut {
                amount: 50 * COIN,
                address: Address::from_public_key(&[0xAA; 32], Network::Mainnet.address_version()),
            }],
        )
    }

    // --- sha256d ---

    #[test]
    fn sha256d_known_vector() {
        // SHA-256d of the empty string.
        assert_eq!(
            sha256d(b"").to_string(),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn sha256d_differs_from_single_sha256() {
        let single: [u8; 32] = Sha256::digest(b"basalt").into();
        assert_ne!(sha256d(b"basalt").0, single);
    }

    // --- KeyPair ---

    #[test]
    fn generate_produces_distinct_keys() {
        assert_ne!(
            KeyPair::generate().public_key(),
            KeyPair::generate().public_key()
        );
    }

    #[test]
    fn from_secret_is_deterministic() {
        let a = KeyPair::from_secret_bytes([7u8; 32]);
        let b = KeyPair::from_secret_bytes([7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn clone_preserves_key_material() {
        let kp = KeyPair::generate();
        let clone = kp.clone();
        assert_eq!(kp.public_key(), clone.public_key());
        assert_eq!(kp.secret_bytes(), clone.secret_bytes());
    }

    #[test]
    fn debug_hides_secret() {
        let kp = KeyPair::generate();
        let debug = format!("{kp:?}");
        assert!(!debug.contains(&hex::encode(kp.secret_bytes())));
    }

    // --- sign / verify messages ---

    #[test]
    fn sign_verify_round_trip() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"hello basalt");
        assert!(kp.public_key().verify(b"hello basalt", &sig).is_ok());
    }

    #[test]
    fn verify_wrong_key_fails() {
        let sig = KeyPair::generate().sign(b"msg");
        assert_eq!(
            KeyPair::generate().public_key().verify(b"msg", &sig),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn verify_wrong_message_fails() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"original");
        assert_eq!(
            kp.public_key().verify(b"tampered", &sig),
            Err(CryptoError::VerificationFailed)
        );
    }

    // --- txin signing ---

    #[test]
    fn sign_txin_stamps_witness_and_verifies() {
        let kp = KeyPair::generate();
        let mut tx = unsigned_tx();
        sign_txin(&mut tx, 0, &kp).unwrap();
        assert_eq!(tx.txins[0].public_key, kp.public_key().to_bytes());
        assert!(verify_txin(&tx, 0).is_ok());
    }

    #[test]
    fn sign_txin_does_not_change_id() {
        let kp = KeyPair::generate();
        let mut tx = unsigned_tx();
        let id = tx.id;
        sign_txin(&mut tx, 0, &kp).unwrap();
        assert_eq!(tx.compute_id(), id);
    }

    #[test]
    fn tampered_output_breaks_signature() {
        let kp = KeyPair::generate();
        let mut tx = unsigned_tx();
        sign_txin(&mut tx, 0, &kp).unwrap();
        tx.txouts[0].amount -= 1;
        assert_eq!(verify_txin(&tx, 0), Err(CryptoError::VerificationFailed));
    }

    #[test]
    fn tampered_outpoint_breaks_signature() {
        let kp = KeyPair::generate();
        let mut tx = unsigned_tx();
        sign_txin(&mut tx, 0, &kp).unwrap();
        tx.txins[0].prev_vout = 1;
        assert_eq!(verify_txin(&tx, 0), Err(CryptoError::VerificationFailed));
    }

    #[test]
    fn inputs_share_one_preimage() {
        // Signing input 1 then input 0 must leave both verifiable, since
        // the preimage ignores witness data entirely.
        let kp0 = KeyPair::generate();
        let kp1 = KeyPair::generate();
        let mut tx = Transaction::new(
            vec![
                TxIn::unsigned(Hash256([0x11; 32]), 0),
                TxIn::unsigned(Hash256([0x22; 32]), 1),
            ],
            vec![TxOut {
                amount: 90 * COIN,
                address: Address::from_public_key(&[0xBB; 32], Network::Mainnet.address_version()),
            }],
        );
        sign_txin(&mut tx, 1, &kp1).unwrap();
        sign_txin(&mut tx, 0, &kp0).unwrap();
        assert!(verify_txin(&tx, 0).is_ok());
        assert!(verify_txin(&tx, 1).is_ok());
    }

    #[test]
    fn zero_filled_witness_does_not_verify() {
        let tx = unsigned_tx();
        assert!(verify_txin(&tx, 0).is_err());
    }

    #[test]
    fn index_out_of_bounds() {
        let mut tx = unsigned_tx();
        let kp = KeyPair::generate();
        assert_eq!(
            sign_txin(&mut tx, 5, &kp),
            Err(CryptoError::InputIndexOutOfBounds { index: 5, len: 1 })
        );
        assert_eq!(
            verify_txin(&tx, 5),
            Err(CryptoError::InputIndexOutOfBounds { index: 5, len: 1 })
        );
    }
}
