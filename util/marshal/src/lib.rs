// Copyright (c) 2021-2024 The Chroma Foundation

//! Deterministic marshaling primitives for the Chroma wire format.
//!
//! Every on-wire entity in this workspace is encoded through [`Marshaler`]
//! and decoded through [`Demarshaler`]: fixed-width integers are big-endian,
//! variable-length blobs carry a `u16` big-endian length prefix, and decoders
//! fail with a typed [`Error`] instead of panicking on malformed input.
//! Encoders produce exact, minimal byte strings, which is what makes hashes
//! over encoded entities stable identifiers.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

use alloc::vec::Vec;
use displaydoc::Display;

/// An error produced while reading from or seeking in a byte buffer.
///
/// All variants are of the "parse bytes failed" family: the input was
/// truncated, carried an unknown discriminant, or was not in canonical form.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// unexpected end of buffer: needed {needed} more bytes, {remaining} remaining
    UnexpectedEof {
        /// How many bytes the read required.
        needed: usize,
        /// How many bytes were left in the buffer.
        remaining: usize,
    },

    /// seek by {delta} is out of bounds at read offset {offset}
    SeekOutOfBounds {
        /// The requested relative movement.
        delta: isize,
        /// The read offset at the time of the seek.
        offset: usize,
    },

    /// unknown {kind} discriminant: {value:#04x}
    UnknownDiscriminant {
        /// Which tagged union was being decoded.
        kind: &'static str,
        /// The unrecognized type byte.
        value: u8,
    },

    /// non-canonical encoding: {0}
    NonCanonical(&'static str),

    /// {0} trailing bytes after a complete object
    TrailingBytes(usize),

    /// blob of {0} bytes exceeds the u16 length prefix
    BlobTooLong(usize),
}

/// Result alias for marshaling operations.
pub type Result<T> = core::result::Result<T, Error>;

/// A growable write buffer with chainable big-endian primitives.
#[derive(Clone, Debug, Default)]
pub struct Marshaler {
    buf: Vec<u8>,
}

impl Marshaler {
    /// Creates an empty `Marshaler`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `Marshaler` with a pre-allocated buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Appends a single byte.
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    /// Appends a `u16` in big-endian order.
    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends a `u32` in big-endian order.
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends a `u64` in big-endian order.
    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends an `i64` in big-endian order.
    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends raw bytes without a length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Appends a `u16`-length-prefixed blob.
    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let len = u16::try_from(bytes.len()).map_err(|_| Error::BlobTooLong(bytes.len()))?;
        self.write_u16(len);
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the marshaler, returning the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

impl AsRef<[u8]> for Marshaler {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

/// A read cursor over a borrowed byte buffer.
///
/// All reads advance the cursor; [`Demarshaler::read_offset`] reports the
/// total number of bytes consumed, and [`Demarshaler::read_seek`] moves the
/// cursor relative to its current position (negative deltas re-read).
#[derive(Clone, Debug)]
pub struct Demarshaler<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Demarshaler<'a> {
    /// Creates a cursor at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Total bytes consumed so far.
    pub fn read_offset(&self) -> usize {
        self.offset
    }

    /// Bytes left in the buffer.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Moves the cursor by `delta` bytes relative to its current position.
    pub fn read_seek(&mut self, delta: isize) -> Result<()> {
        let target = self.offset as isize + delta;
        if target < 0 || target as usize > self.bytes.len() {
            return Err(Error::SeekOutOfBounds {
                delta,
                offset: self.offset,
            });
        }
        self.offset = target as usize;
        Ok(())
    }

    /// Reads `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    /// Reads a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    /// Reads a `u16`-length-prefixed blob.
    pub fn read_blob(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u16()? as usize;
        self.read_bytes(len)
    }

    /// Fails with [`Error::TrailingBytes`] unless the buffer is exhausted.
    pub fn expect_done(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }
}
