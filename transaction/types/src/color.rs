// Copyright (c) 2021-2024 The Chroma Foundation

//! Token colors.

use chr_util_marshal::{Demarshaler, Marshaler};
use core::fmt;

/// Length of a color tag in bytes.
pub const COLOR_LENGTH: usize = 32;

/// A 32-byte tag identifying a token class.
///
/// Two tags are reserved: [`Color::IOTA`], the native color every plain
/// amount carries, and [`Color::MINT`], a sentinel that only ever appears in
/// an output at construction time. When the ledger commits an output carrying
/// `MINT`, it replaces the sentinel with a color derived from the output's id,
/// so no live output contains `MINT`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color([u8; COLOR_LENGTH]);

impl Color {
    /// The native color, all-zero bytes.
    pub const IOTA: Color = Color([0u8; COLOR_LENGTH]);

    /// The mint sentinel, all-0xff bytes.
    pub const MINT: Color = Color([0xffu8; COLOR_LENGTH]);

    /// Wraps a raw 32-byte tag.
    pub const fn new(bytes: [u8; COLOR_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The raw tag bytes.
    pub const fn bytes(&self) -> &[u8; COLOR_LENGTH] {
        &self.0
    }

    /// True for the native color.
    pub fn is_iota(&self) -> bool {
        *self == Color::IOTA
    }

    /// True for the mint sentinel.
    pub fn is_mint(&self) -> bool {
        *self == Color::MINT
    }

    /// Writes the raw tag to a marshaler.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_bytes(&self.0);
    }

    /// Reads a raw tag from a demarshaler.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        Ok(Self(demarshaler.read_array()?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_iota() {
            return write!(f, "IOTA");
        }
        if self.is_mint() {
            return write!(f, "MINT");
        }
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; COLOR_LENGTH]> for Color {
    fn from(bytes: [u8; COLOR_LENGTH]) -> Self {
        Self(bytes)
    }
}
