// Copyright (c) 2021-2024 The Chroma Foundation

//! Ed25519 key material for signing and verifying transaction essences.
//!
//! The dalek types are wrapped so the rest of the workspace deals in
//! fixed-size byte forms and never touches curve internals. [`Seed`] provides
//! the deterministic indexed derivation the ledger's genesis identity and the
//! test suites rely on: subkey `i` of a seed is the Ed25519 signing key whose
//! secret bytes are `Blake2b-256(seed || i as u64 BE)`.

#![no_std]
#![deny(missing_docs)]

use chr_crypto_hashes::{Blake2b256, Digest};
use chr_util_marshal::{Demarshaler, Marshaler};
use core::fmt;
use displaydoc::Display;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// An error that can occur when handling key material.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum KeyError {
    /// bytes do not encode a valid Ed25519 public key
    InvalidPublicKey,
}

/// An Ed25519 verifying key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ed25519Public(VerifyingKey);

impl Ed25519Public {
    /// The compressed 32-byte form of the key.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Parses a public key from its compressed 32-byte form.
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_LENGTH]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPublicKey)
    }

    /// Returns true iff `signature` is a valid signature by this key over
    /// `data`.
    pub fn verify(&self, data: &[u8], signature: &Ed25519Signature) -> bool {
        self.0.verify(data, &signature.0).is_ok()
    }

    /// Writes the compressed key to a marshaler.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_bytes(&self.to_bytes());
    }

    /// Reads a compressed key from a demarshaler.
    ///
    /// A well-formed buffer that does not decode to a curve point is reported
    /// as a non-canonical encoding.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = demarshaler.read_array()?;
        Self::from_bytes(&bytes)
            .map_err(|_| chr_util_marshal::Error::NonCanonical("invalid Ed25519 public key"))
    }
}

impl fmt::Display for Ed25519Public {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.to_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// An Ed25519 signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ed25519Signature(ed25519_dalek::Signature);

impl Ed25519Signature {
    /// The raw 64-byte form of the signature.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// Builds a signature from its raw 64-byte form.
    ///
    /// Every 64-byte string is structurally a signature; validity is only
    /// decided by [`Ed25519Public::verify`].
    pub fn from_bytes(bytes: &[u8; SIGNATURE_LENGTH]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(bytes))
    }

    /// Writes the raw signature to a marshaler.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_bytes(&self.to_bytes());
    }

    /// Reads a raw signature from a demarshaler.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        Ok(Self::from_bytes(&demarshaler.read_array()?))
    }
}

/// An Ed25519 signing key together with its verifying key.
#[derive(Clone, Debug)]
pub struct Ed25519Pair {
    signing: SigningKey,
    public: Ed25519Public,
}

impl Ed25519Pair {
    /// Builds a key pair from 32 bytes of secret key material.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(bytes);
        let public = Ed25519Public(signing.verifying_key());
        Self { signing, public }
    }

    /// Samples a fresh key pair from a cryptographic rng.
    pub fn from_random<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        let signing = SigningKey::generate(rng);
        let public = Ed25519Public(signing.verifying_key());
        Self { signing, public }
    }

    /// The verifying half of the pair.
    pub fn public(&self) -> Ed25519Public {
        self.public
    }

    /// Signs `data`, returning a detached signature.
    pub fn sign(&self, data: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing.sign(data))
    }
}

/// 32 bytes of entropy from which indexed key pairs are derived.
///
/// Subkeys of the same seed are unrelated as far as an observer is concerned,
/// yet fully reproducible from the seed, which is what lets a test ledger
/// hand out stable identities by index.
#[derive(Clone)]
pub struct Seed([u8; 32]);

impl Seed {
    /// Wraps 32 bytes of entropy.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Samples a fresh seed from a cryptographic rng.
    pub fn from_random<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derives the key pair at `index`.
    ///
    /// The subkey's secret bytes are `Blake2b-256(seed || index as u64 BE)`.
    pub fn key_pair(&self, index: u64) -> Ed25519Pair {
        let mut hasher = Blake2b256::new();
        hasher.update(self.0);
        hasher.update(index.to_be_bytes());
        let mut subseed: [u8; 32] = hasher.finalize().into();
        let pair = Ed25519Pair::from_secret_bytes(&subseed);
        subseed.zeroize();
        pair
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn sign_and_verify() {
        let mut rng = StdRng::seed_from_u64(7);
        let pair = Ed25519Pair::from_random(&mut rng);
        let sig = pair.sign(b"essence bytes");
        assert!(pair.public().verify(b"essence bytes", &sig));
        assert!(!pair.public().verify(b"other bytes", &sig));
    }

    #[test]
    fn wrong_key_does_not_verify() {
        let mut rng = StdRng::seed_from_u64(8);
        let pair = Ed25519Pair::from_random(&mut rng);
        let other = Ed25519Pair::from_random(&mut rng);
        let sig = pair.sign(b"data");
        assert!(!other.public().verify(b"data", &sig));
    }

    #[test]
    fn public_key_round_trip() {
        let mut rng = StdRng::seed_from_u64(9);
        let public = Ed25519Pair::from_random(&mut rng).public();
        let recovered = Ed25519Public::from_bytes(&public.to_bytes()).unwrap();
        assert_eq!(public, recovered);
    }

    #[test]
    fn seed_derivation_is_deterministic() {
        let seed = Seed::new([3u8; 32]);
        let a = seed.key_pair(31415);
        let b = seed.key_pair(31415);
        let c = seed.key_pair(31416);
        assert_eq!(a.public(), b.public());
        assert_ne!(a.public(), c.public());
    }

    #[test]
    fn signature_bytes_round_trip() {
        let mut rng = StdRng::seed_from_u64(10);
        let pair = Ed25519Pair::from_random(&mut rng);
        let sig = pair.sign(b"payload");
        let recovered = Ed25519Signature::from_bytes(&sig.to_bytes());
        assert_eq!(sig, recovered);
        assert!(pair.public().verify(b"payload", &recovered));
    }
}
