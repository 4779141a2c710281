// Copyright (c) 2021-2024 The Chroma Foundation

//! Unlock blocks: per-input spending authorization.
//!
//! Each input of a transaction is matched, by position, with one unlock
//! block: either a fresh [`Signature`] or a [`UnlockBlock::Reference`] to an
//! earlier signature in the same transaction. A transaction whose inputs are
//! all owned by one key thus carries a single 99-byte signature block and a
//! 3-byte reference per further input.

use crate::signature::Signature;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use chr_util_marshal::{Demarshaler, Error as MarshalError, Marshaler};
use core::fmt;
use displaydoc::Display;

/// Discriminates the kinds of unlock blocks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum UnlockBlockKind {
    /// A block carrying a signature.
    Signature = 0,
    /// A block referencing an earlier signature block.
    Reference = 1,
}

impl UnlockBlockKind {
    fn from_byte(value: u8) -> Result<Self, MarshalError> {
        match value {
            0 => Ok(UnlockBlockKind::Signature),
            1 => Ok(UnlockBlockKind::Reference),
            other => Err(MarshalError::UnknownDiscriminant {
                kind: "UnlockBlockKind",
                value: other,
            }),
        }
    }
}

/// An error constructing an unlock-block sequence.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum UnlockError {
    /// unlock block {index} references block {referenced}, which is not a prior block
    ForwardReference {
        /// Position of the offending block.
        index: usize,
        /// The referenced position.
        referenced: u16,
    },

    /// unlock block {index} references block {referenced}, which is not a signature
    NonSignatureReference {
        /// Position of the offending block.
        index: usize,
        /// The referenced position.
        referenced: u16,
    },
}

/// The unlock-block tagged union.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnlockBlock {
    /// A signature authorizing the input at this position.
    Signature(Signature),
    /// A backward reference to the signature block at the given position.
    Reference(u16),
}

impl UnlockBlock {
    /// The kind of this unlock block.
    pub fn kind(&self) -> UnlockBlockKind {
        match self {
            UnlockBlock::Signature(_) => UnlockBlockKind::Signature,
            UnlockBlock::Reference(_) => UnlockBlockKind::Reference,
        }
    }

    /// True for signature blocks.
    pub fn is_signature(&self) -> bool {
        matches!(self, UnlockBlock::Signature(_))
    }

    /// Writes the wire form: kind byte followed by the payload.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u8(self.kind() as u8);
        match self {
            UnlockBlock::Signature(signature) => signature.write_to(marshaler),
            UnlockBlock::Reference(index) => {
                marshaler.write_u16(*index);
            }
        }
    }

    /// Reads an unlock block from a demarshaler, dispatching on the kind
    /// byte.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let kind = UnlockBlockKind::from_byte(demarshaler.read_u8()?)?;
        match kind {
            UnlockBlockKind::Signature => {
                Ok(UnlockBlock::Signature(Signature::read_from(demarshaler)?))
            }
            UnlockBlockKind::Reference => Ok(UnlockBlock::Reference(demarshaler.read_u16()?)),
        }
    }

    /// The wire form as a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut marshaler = Marshaler::new();
        self.write_to(&mut marshaler);
        marshaler.finish()
    }

    /// Decodes an unlock block from an exact byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> chr_util_marshal::Result<Self> {
        let mut demarshaler = Demarshaler::new(bytes);
        let block = Self::read_from(&mut demarshaler)?;
        demarshaler.expect_done()?;
        Ok(block)
    }
}

impl fmt::Display for UnlockBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlockBlock::Signature(signature) => write!(f, "SignatureUnlockBlock({signature})"),
            UnlockBlock::Reference(index) => write!(f, "ReferenceUnlockBlock({index})"),
        }
    }
}

/// A validated, compacted sequence of unlock blocks.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UnlockBlocks(Vec<UnlockBlock>);

impl UnlockBlocks {
    /// Canonicalizes a candidate sequence.
    ///
    /// Walking the candidates in order, a block whose bytes equal those of an
    /// earlier signature block collapses into a reference to that earlier
    /// position; explicit references must point backward at a signature
    /// block. The result has the same length and unlocks the same inputs.
    /// Applying the constructor to its own output reproduces it byte for
    /// byte.
    pub fn new(candidates: Vec<UnlockBlock>) -> Result<Self, UnlockError> {
        let mut seen_signatures: BTreeMap<Vec<u8>, u16> = BTreeMap::new();
        let mut blocks: Vec<UnlockBlock> = Vec::with_capacity(candidates.len());

        for (index, candidate) in candidates.into_iter().enumerate() {
            if let UnlockBlock::Reference(referenced) = candidate {
                if referenced as usize >= index {
                    return Err(UnlockError::ForwardReference { index, referenced });
                }
                if !blocks[referenced as usize].is_signature() {
                    return Err(UnlockError::NonSignatureReference { index, referenced });
                }
                blocks.push(candidate);
                continue;
            }

            let fingerprint = candidate.to_bytes();
            if let Some(&earlier) = seen_signatures.get(&fingerprint) {
                blocks.push(UnlockBlock::Reference(earlier));
                continue;
            }
            seen_signatures.insert(fingerprint, index as u16);
            blocks.push(candidate);
        }

        Ok(Self(blocks))
    }

    /// Number of unlock blocks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no unlock blocks.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The unlock block at `index`.
    pub fn get(&self, index: usize) -> Option<&UnlockBlock> {
        self.0.get(index)
    }

    /// Iterates blocks in sequence order.
    pub fn iter(&self) -> core::slice::Iter<'_, UnlockBlock> {
        self.0.iter()
    }

    /// Writes the count (`u16` BE) followed by each block.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u16(self.0.len() as u16);
        for block in &self.0 {
            block.write_to(marshaler);
        }
    }

    /// Reads a sequence of unlock blocks, preserving wire order.
    ///
    /// Reference well-formedness is not re-checked here; the ledger verifies
    /// it when resolving signatures.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let count = demarshaler.read_u16()?;
        let mut blocks = Vec::with_capacity(count as usize);
        for _ in 0..count {
            blocks.push(UnlockBlock::read_from(demarshaler)?);
        }
        Ok(Self(blocks))
    }

    /// The wire form as a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut marshaler = Marshaler::new();
        self.write_to(&mut marshaler);
        marshaler.finish()
    }

    /// Decodes a sequence from an exact byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> chr_util_marshal::Result<Self> {
        let mut demarshaler = Demarshaler::new(bytes);
        let blocks = Self::read_from(&mut demarshaler)?;
        demarshaler.expect_done()?;
        Ok(blocks)
    }
}

impl<'a> IntoIterator for &'a UnlockBlocks {
    type Item = &'a UnlockBlock;
    type IntoIter = core::slice::Iter<'a, UnlockBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chr_crypto_keys::Ed25519Pair;
    use rand::{rngs::StdRng, SeedableRng};

    fn signature_block(pair: &Ed25519Pair, data: &[u8]) -> UnlockBlock {
        UnlockBlock::Signature(Signature::ed25519(pair.public(), pair.sign(data)))
    }

    #[test]
    fn repeated_signatures_collapse_into_references() {
        let mut rng = StdRng::seed_from_u64(20);
        let pair = Ed25519Pair::from_random(&mut rng);
        let block = signature_block(&pair, b"essence");

        let blocks = UnlockBlocks::new(alloc::vec![block, block, block]).unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks.get(0).unwrap().is_signature());
        assert_eq!(blocks.get(1), Some(&UnlockBlock::Reference(0)));
        assert_eq!(blocks.get(2), Some(&UnlockBlock::Reference(0)));
    }

    #[test]
    fn distinct_signatures_are_kept() {
        let mut rng = StdRng::seed_from_u64(21);
        let a = Ed25519Pair::from_random(&mut rng);
        let b = Ed25519Pair::from_random(&mut rng);

        let blocks = UnlockBlocks::new(alloc::vec![
            signature_block(&a, b"essence"),
            signature_block(&b, b"essence"),
            signature_block(&a, b"essence"),
        ])
        .unwrap();
        assert!(blocks.get(0).unwrap().is_signature());
        assert!(blocks.get(1).unwrap().is_signature());
        assert_eq!(blocks.get(2), Some(&UnlockBlock::Reference(0)));
    }

    #[test]
    fn compaction_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(22);
        let pair = Ed25519Pair::from_random(&mut rng);
        let block = signature_block(&pair, b"essence");

        let first = UnlockBlocks::new(alloc::vec![block, block, UnlockBlock::Reference(0)]).unwrap();
        let second = UnlockBlocks::new(first.iter().copied().collect()).unwrap();
        assert_eq!(first.to_bytes(), second.to_bytes());
    }

    #[test]
    fn forward_reference_is_rejected() {
        let mut rng = StdRng::seed_from_u64(23);
        let pair = Ed25519Pair::from_random(&mut rng);

        assert_eq!(
            UnlockBlocks::new(alloc::vec![
                signature_block(&pair, b"essence"),
                UnlockBlock::Reference(1),
            ]),
            Err(UnlockError::ForwardReference {
                index: 1,
                referenced: 1
            })
        );
    }

    #[test]
    fn reference_to_reference_is_rejected() {
        let mut rng = StdRng::seed_from_u64(24);
        let pair = Ed25519Pair::from_random(&mut rng);
        let block = signature_block(&pair, b"essence");

        // Index 1 compacts to Reference(0); an explicit reference to it is
        // not a reference to a signature.
        assert_eq!(
            UnlockBlocks::new(alloc::vec![block, block, UnlockBlock::Reference(1)]),
            Err(UnlockError::NonSignatureReference {
                index: 2,
                referenced: 1
            })
        );
    }

    #[test]
    fn wire_round_trip() {
        let mut rng = StdRng::seed_from_u64(25);
        let pair = Ed25519Pair::from_random(&mut rng);
        let blocks = UnlockBlocks::new(alloc::vec![
            signature_block(&pair, b"essence"),
            UnlockBlock::Reference(0),
        ])
        .unwrap();

        let bytes = blocks.to_bytes();
        // count + (kind + 97-byte signature) + (kind + u16 index)
        assert_eq!(bytes.len(), 2 + 98 + 3);
        assert_eq!(UnlockBlocks::from_bytes(&bytes).unwrap(), blocks);
    }
}
