// Copyright (c) 2021-2024 The Chroma Foundation

//! Signatures over transaction essences.

use alloc::vec::Vec;
use chr_account_keys::Address;
use chr_crypto_keys::{Ed25519Public, Ed25519Signature};
use chr_util_marshal::{Demarshaler, Error as MarshalError, Marshaler};
use core::fmt;

/// Discriminates the kinds of signatures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum SignatureKind {
    /// An Ed25519 signature.
    Ed25519 = 0,
}

impl SignatureKind {
    fn from_byte(value: u8) -> Result<Self, MarshalError> {
        match value {
            0 => Ok(SignatureKind::Ed25519),
            other => Err(MarshalError::UnknownDiscriminant {
                kind: "SignatureKind",
                value: other,
            }),
        }
    }
}

/// The signature tagged union.
///
/// A signature reveals the public key it was made with, which is what lets
/// [`Signature::address_signature_valid`] tie the signature back to the
/// digest-only address locking the consumed output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Signature {
    /// An Ed25519 signature with its verifying key.
    Ed25519 {
        /// The verifying key the signature was made with.
        public_key: Ed25519Public,
        /// The detached signature.
        signature: Ed25519Signature,
    },
}

impl Signature {
    /// Builds an Ed25519 signature entry.
    pub fn ed25519(public_key: Ed25519Public, signature: Ed25519Signature) -> Self {
        Signature::Ed25519 {
            public_key,
            signature,
        }
    }

    /// The kind of this signature.
    pub fn kind(&self) -> SignatureKind {
        match self {
            Signature::Ed25519 { .. } => SignatureKind::Ed25519,
        }
    }

    /// True iff `address` is derived from this signature's public key and the
    /// signature verifies over `data`.
    pub fn address_signature_valid(&self, address: &Address, data: &[u8]) -> bool {
        match self {
            Signature::Ed25519 {
                public_key,
                signature,
            } => {
                Address::from_public_key(public_key) == *address
                    && public_key.verify(data, signature)
            }
        }
    }

    /// Writes the wire form: kind byte, public key, signature.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u8(self.kind() as u8);
        match self {
            Signature::Ed25519 {
                public_key,
                signature,
            } => {
                public_key.write_to(marshaler);
                signature.write_to(marshaler);
            }
        }
    }

    /// Reads a signature from a demarshaler, dispatching on the kind byte.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let kind = SignatureKind::from_byte(demarshaler.read_u8()?)?;
        match kind {
            SignatureKind::Ed25519 => {
                let public_key = Ed25519Public::read_from(demarshaler)?;
                let signature = Ed25519Signature::read_from(demarshaler)?;
                Ok(Signature::ed25519(public_key, signature))
            }
        }
    }

    /// The wire form as a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut marshaler = Marshaler::new();
        self.write_to(&mut marshaler);
        marshaler.finish()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Ed25519 { public_key, .. } => write!(f, "Ed25519Signature({public_key})"),
        }
    }
}
