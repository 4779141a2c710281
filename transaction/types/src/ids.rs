// Copyright (c) 2021-2024 The Chroma Foundation

//! Transaction and output identifiers.

use chr_util_marshal::{Demarshaler, Marshaler};
use core::fmt;

/// Length of a transaction id in bytes.
pub const TRANSACTION_ID_LENGTH: usize = 32;

/// Length of an output id in bytes: transaction id plus a `u16` index.
pub const OUTPUT_ID_LENGTH: usize = TRANSACTION_ID_LENGTH + 2;

/// The identifier of a transaction: the 32-byte hash of its canonical bytes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransactionID([u8; TRANSACTION_ID_LENGTH]);

impl TransactionID {
    /// Wraps a raw 32-byte id.
    pub const fn new(bytes: [u8; TRANSACTION_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The raw id bytes.
    pub const fn bytes(&self) -> &[u8; TRANSACTION_ID_LENGTH] {
        &self.0
    }

    /// Writes the raw id to a marshaler.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_bytes(&self.0);
    }

    /// Reads a raw id from a demarshaler.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        Ok(Self(demarshaler.read_array()?))
    }
}

impl fmt::Display for TransactionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// The identifier of an output: the transaction that created it plus the
/// output's index inside that transaction's canonical output list.
///
/// The derived ordering (transaction id first, then index) coincides with the
/// lexicographic order of the 34-byte wire form, because the index is encoded
/// big-endian.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputID {
    transaction_id: TransactionID,
    index: u16,
}

impl OutputID {
    /// Builds an output id from its parts.
    pub const fn new(transaction_id: TransactionID, index: u16) -> Self {
        Self {
            transaction_id,
            index,
        }
    }

    /// The transaction that created the output.
    pub const fn transaction_id(&self) -> &TransactionID {
        &self.transaction_id
    }

    /// The output's index inside the creating transaction.
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// The 34-byte wire form.
    pub fn array(&self) -> [u8; OUTPUT_ID_LENGTH] {
        let mut out = [0u8; OUTPUT_ID_LENGTH];
        out[..TRANSACTION_ID_LENGTH].copy_from_slice(self.transaction_id.bytes());
        out[TRANSACTION_ID_LENGTH..].copy_from_slice(&self.index.to_be_bytes());
        out
    }

    /// Writes the wire form to a marshaler.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        self.transaction_id.write_to(marshaler);
        marshaler.write_u16(self.index);
    }

    /// Reads an output id from a demarshaler.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let transaction_id = TransactionID::read_from(demarshaler)?;
        let index = demarshaler.read_u16()?;
        Ok(Self {
            transaction_id,
            index,
        })
    }
}

impl fmt::Display for OutputID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.index)
    }
}

/// A 32-byte identity tag naming the node a transaction pledges to.
///
/// The pledge subsystem itself lives outside this core; essences carry the
/// tags opaquely so the wire format is complete.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PledgeId([u8; 32]);

impl PledgeId {
    /// Wraps a raw 32-byte tag.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw tag bytes.
    pub const fn bytes(&self) -> &[u8; 32] {
        &self.0
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_id_wire_form() {
        let txid = TransactionID::new([0xaa; 32]);
        let id = OutputID::new(txid, 0x0102);
        let array = id.array();
        assert_eq!(&array[..32], &[0xaa; 32]);
        assert_eq!(&array[32..], &[0x01, 0x02]);
    }

    #[test]
    fn output_id_order_matches_byte_order() {
        let a = OutputID::new(TransactionID::new([1; 32]), 500);
        let b = OutputID::new(TransactionID::new([1; 32]), 501);
        let c = OutputID::new(TransactionID::new([2; 32]), 0);
        assert!(a < b && b < c);
        assert!(a.array() < b.array() && b.array() < c.array());
    }

    #[test]
    fn output_id_round_trip() {
        let id = OutputID::new(TransactionID::new([7; 32]), 42);
        let mut m = Marshaler::new();
        id.write_to(&mut m);
        let bytes = m.finish();
        assert_eq!(bytes.len(), OUTPUT_ID_LENGTH);
        let mut d = Demarshaler::new(&bytes);
        assert_eq!(OutputID::read_from(&mut d).unwrap(), id);
        d.expect_done().unwrap();
    }
}
