// Copyright (c) 2021-2024 The Chroma Foundation

//! The address tagged union and its wire form.

use chr_crypto_hashes::hash32;
use chr_crypto_keys::Ed25519Public;
use chr_util_marshal::{Demarshaler, Error as MarshalError, Marshaler};
use core::fmt;

/// Length of an address on the wire: one kind byte plus a 32-byte digest.
pub const ADDRESS_LENGTH: usize = 33;

/// Discriminates the kinds of addresses that can lock an output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum AddressKind {
    /// An address derived from an Ed25519 verifying key.
    Ed25519 = 0,
}

impl AddressKind {
    fn from_byte(value: u8) -> Result<Self, MarshalError> {
        match value {
            0 => Ok(AddressKind::Ed25519),
            other => Err(MarshalError::UnknownDiscriminant {
                kind: "AddressKind",
                value: other,
            }),
        }
    }
}

/// An address whose outputs are unlocked by an Ed25519 signature.
///
/// The payload is the Blake2b-256 digest of the verifying key, not the key
/// itself; the key is only revealed by the unlock block that spends from the
/// address.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ed25519Address {
    digest: [u8; 32],
}

impl Ed25519Address {
    /// Derives the address of an Ed25519 verifying key.
    pub fn from_public_key(public_key: &Ed25519Public) -> Self {
        Self {
            digest: hash32(&public_key.to_bytes()),
        }
    }

    /// The 32-byte key digest.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

/// The address tagged union.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Address {
    /// An Ed25519 signature-locked address.
    Ed25519(Ed25519Address),
}

impl Address {
    /// Derives the Ed25519 address of a verifying key.
    pub fn from_public_key(public_key: &Ed25519Public) -> Self {
        Address::Ed25519(Ed25519Address::from_public_key(public_key))
    }

    /// The kind of this address.
    pub fn kind(&self) -> AddressKind {
        match self {
            Address::Ed25519(_) => AddressKind::Ed25519,
        }
    }

    /// The full wire form: kind byte followed by the digest.
    pub fn array(&self) -> [u8; ADDRESS_LENGTH] {
        let mut out = [0u8; ADDRESS_LENGTH];
        out[0] = self.kind() as u8;
        match self {
            Address::Ed25519(inner) => out[1..].copy_from_slice(inner.digest()),
        }
        out
    }

    /// Writes the wire form to a marshaler.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_bytes(&self.array());
    }

    /// Reads an address from a demarshaler, dispatching on the kind byte.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let kind = AddressKind::from_byte(demarshaler.read_u8()?)?;
        match kind {
            AddressKind::Ed25519 => {
                let digest: [u8; 32] = demarshaler.read_array()?;
                Ok(Address::Ed25519(Ed25519Address { digest }))
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.array() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
