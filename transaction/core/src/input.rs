// Copyright (c) 2021-2024 The Chroma Foundation

//! Inputs: references to the outputs a transaction consumes.

use alloc::{vec, vec::Vec};
use chr_transaction_types::OutputID;
use chr_util_marshal::{Demarshaler, Error as MarshalError, Marshaler};
use core::fmt;

/// Discriminates the kinds of inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum InputKind {
    /// A reference to an unspent output.
    Utxo = 0,
}

impl InputKind {
    fn from_byte(value: u8) -> Result<Self, MarshalError> {
        match value {
            0 => Ok(InputKind::Utxo),
            other => Err(MarshalError::UnknownDiscriminant {
                kind: "InputKind",
                value: other,
            }),
        }
    }
}

/// An input referencing an unspent output by id.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct UtxoInput {
    output_id: OutputID,
}

impl UtxoInput {
    /// Builds an input referencing `output_id`.
    pub const fn new(output_id: OutputID) -> Self {
        Self { output_id }
    }

    /// The referenced output id.
    pub const fn output_id(&self) -> &OutputID {
        &self.output_id
    }
}

/// The input tagged union.
///
/// Inputs order by their referenced output id, which (the id's derived order
/// being its byte order) is the wire-byte order the canonical input sequence
/// requires.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Input {
    /// A reference to an unspent output.
    Utxo(UtxoInput),
}

impl Input {
    /// Shorthand for a UTXO input.
    pub const fn utxo(output_id: OutputID) -> Self {
        Input::Utxo(UtxoInput::new(output_id))
    }

    /// The kind of this input.
    pub fn kind(&self) -> InputKind {
        match self {
            Input::Utxo(_) => InputKind::Utxo,
        }
    }

    /// The referenced output id.
    pub fn output_id(&self) -> &OutputID {
        match self {
            Input::Utxo(inner) => inner.output_id(),
        }
    }

    /// Writes the wire form: kind byte followed by the output id.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u8(self.kind() as u8);
        match self {
            Input::Utxo(inner) => inner.output_id.write_to(marshaler),
        }
    }

    /// Reads an input from a demarshaler, dispatching on the kind byte.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let kind = InputKind::from_byte(demarshaler.read_u8()?)?;
        match kind {
            InputKind::Utxo => Ok(Input::utxo(OutputID::read_from(demarshaler)?)),
        }
    }

    /// The wire form as a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut marshaler = Marshaler::new();
        self.write_to(&mut marshaler);
        marshaler.finish()
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Utxo(inner) => write!(f, "UtxoInput({})", inner.output_id()),
        }
    }
}

/// A canonical-ordered sequence of inputs.
///
/// The constructor sorts ascending by referenced output id; decoding
/// preserves the wire order verbatim.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Inputs(Vec<Input>);

impl Inputs {
    /// Builds a canonical-ordered sequence from arbitrary-ordered inputs.
    pub fn new(mut inputs: Vec<Input>) -> Self {
        inputs.sort();
        Self(inputs)
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no inputs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The input at `index`.
    pub fn get(&self, index: usize) -> Option<&Input> {
        self.0.get(index)
    }

    /// Iterates inputs in sequence order.
    pub fn iter(&self) -> core::slice::Iter<'_, Input> {
        self.0.iter()
    }

    /// Writes the count (`u16` BE) followed by each input.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u16(self.0.len() as u16);
        for input in &self.0 {
            input.write_to(marshaler);
        }
    }

    /// Reads a sequence of inputs, preserving wire order.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let count = demarshaler.read_u16()?;
        let mut inputs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            inputs.push(Input::read_from(demarshaler)?);
        }
        Ok(Self(inputs))
    }
}

impl From<Input> for Inputs {
    fn from(input: Input) -> Self {
        Self(vec![input])
    }
}

impl<'a> IntoIterator for &'a Inputs {
    type Item = &'a Input;
    type IntoIter = core::slice::Iter<'a, Input>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
