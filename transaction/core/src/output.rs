// Copyright (c) 2021-2024 The Chroma Foundation

//! Outputs: the units of value the ledger tracks.

use alloc::{vec, vec::Vec};
use chr_account_keys::Address;
use chr_crypto_hashes::hash32;
use chr_transaction_types::{Color, ColoredBalances, OutputID};
use chr_util_marshal::{Demarshaler, Error as MarshalError, Marshaler};
use core::cmp::Ordering;
use core::fmt;

/// Discriminates the kinds of outputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum OutputKind {
    /// A single-color output holding plain IOTA.
    SigLockedSingle = 0,
    /// A multi-color output.
    SigLockedColored = 1,
}

impl OutputKind {
    fn from_byte(value: u8) -> Result<Self, MarshalError> {
        match value {
            0 => Ok(OutputKind::SigLockedSingle),
            1 => Ok(OutputKind::SigLockedColored),
            other => Err(MarshalError::UnknownDiscriminant {
                kind: "OutputKind",
                value: other,
            }),
        }
    }
}

/// An output holding `amount` of the native color, locked to `address`.
#[derive(Clone, Debug)]
pub struct SigLockedSingleOutput {
    amount: u64,
    address: Address,
    id: Option<OutputID>,
}

impl SigLockedSingleOutput {
    /// Builds a single-color output. `amount` must be positive; a zero
    /// amount does not survive encoding.
    pub fn new(amount: u64, address: Address) -> Self {
        Self {
            amount,
            address,
            id: None,
        }
    }

    /// The amount of IOTA held.
    pub fn amount(&self) -> u64 {
        self.amount
    }
}

/// An output holding a multi-color balance map, locked to `address`.
///
/// At construction time the map may carry the [`Color::MINT`] sentinel; the
/// ledger replaces the sentinel with the output-id-derived color on commit,
/// so no committed output contains it.
#[derive(Clone, Debug)]
pub struct SigLockedColoredOutput {
    balances: ColoredBalances,
    address: Address,
    id: Option<OutputID>,
}

impl SigLockedColoredOutput {
    /// Builds a colored output. `balances` must be non-empty; an empty map
    /// does not survive encoding.
    pub fn new(balances: ColoredBalances, address: Address) -> Self {
        Self {
            balances,
            address,
            id: None,
        }
    }

    /// The per-color balances held.
    pub fn balances(&self) -> &ColoredBalances {
        &self.balances
    }
}

/// The output tagged union.
#[derive(Clone, Debug)]
pub enum Output {
    /// A single-color output.
    SigLockedSingle(SigLockedSingleOutput),
    /// A multi-color output.
    SigLockedColored(SigLockedColoredOutput),
}

impl Output {
    /// Shorthand for a single-color output.
    pub fn sig_locked_single(amount: u64, address: Address) -> Self {
        Output::SigLockedSingle(SigLockedSingleOutput::new(amount, address))
    }

    /// Shorthand for a colored output.
    pub fn sig_locked_colored(balances: ColoredBalances, address: Address) -> Self {
        Output::SigLockedColored(SigLockedColoredOutput::new(balances, address))
    }

    /// The kind of this output.
    pub fn kind(&self) -> OutputKind {
        match self {
            Output::SigLockedSingle(_) => OutputKind::SigLockedSingle,
            Output::SigLockedColored(_) => OutputKind::SigLockedColored,
        }
    }

    /// The address the output is locked to.
    pub fn address(&self) -> &Address {
        match self {
            Output::SigLockedSingle(inner) => &inner.address,
            Output::SigLockedColored(inner) => &inner.address,
        }
    }

    /// A per-color view of the value held.
    pub fn balances(&self) -> ColoredBalances {
        match self {
            Output::SigLockedSingle(inner) => ColoredBalances::from_iota(inner.amount),
            Output::SigLockedColored(inner) => inner.balances.clone(),
        }
    }

    /// The output's id, if it has been assigned by a transaction.
    pub fn id(&self) -> Option<OutputID> {
        match self {
            Output::SigLockedSingle(inner) => inner.id,
            Output::SigLockedColored(inner) => inner.id,
        }
    }

    /// Assigns the output's id. Called when a transaction is assembled or
    /// decoded; ids are not part of the wire form.
    pub fn set_id(&mut self, id: OutputID) {
        match self {
            Output::SigLockedSingle(inner) => inner.id = Some(id),
            Output::SigLockedColored(inner) => inner.id = Some(id),
        }
    }

    /// Builder-style variant of [`Output::set_id`].
    pub fn with_id(mut self, id: OutputID) -> Self {
        self.set_id(id);
        self
    }

    /// Replaces a [`Color::MINT`] entry with the color derived from this
    /// output's id (`Blake2b-256(output_id)`). No-op for single-color
    /// outputs and for colored outputs without a mint entry.
    ///
    /// The id must have been assigned first.
    pub fn update_minting_color(&mut self) {
        let Output::SigLockedColored(inner) = self else {
            return;
        };
        let mint_amount = inner.balances.get(&Color::MINT);
        if mint_amount == 0 {
            return;
        }
        debug_assert!(inner.id.is_some(), "minting color needs an assigned id");
        let Some(id) = inner.id else { return };
        let derived = Color::new(hash32(&id.array()));
        inner.balances = inner
            .balances
            .iter()
            .map(|(color, amount)| {
                if color.is_mint() {
                    (derived, *amount)
                } else {
                    (*color, *amount)
                }
            })
            .collect();
    }

    /// Writes the canonical wire form: kind byte, address, then the value.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u8(self.kind() as u8);
        match self {
            Output::SigLockedSingle(inner) => {
                inner.address.write_to(marshaler);
                marshaler.write_u64(inner.amount);
            }
            Output::SigLockedColored(inner) => {
                inner.address.write_to(marshaler);
                inner.balances.write_to(marshaler);
            }
        }
    }

    /// Reads an output from a demarshaler, dispatching on the kind byte.
    ///
    /// The decoded output has no id; callers that know the enclosing
    /// transaction assign one.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let kind = OutputKind::from_byte(demarshaler.read_u8()?)?;
        match kind {
            OutputKind::SigLockedSingle => {
                let address = Address::read_from(demarshaler)?;
                let amount = demarshaler.read_u64()?;
                if amount == 0 {
                    return Err(MarshalError::NonCanonical("zero-amount output"));
                }
                Ok(Output::sig_locked_single(amount, address))
            }
            OutputKind::SigLockedColored => {
                let address = Address::read_from(demarshaler)?;
                let balances = ColoredBalances::read_from(demarshaler)?;
                if balances.is_empty() {
                    return Err(MarshalError::NonCanonical("empty output balance map"));
                }
                Ok(Output::sig_locked_colored(balances, address))
            }
        }
    }

    /// The canonical wire form as a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut marshaler = Marshaler::new();
        self.write_to(&mut marshaler);
        marshaler.finish()
    }

    /// Decodes an output from an exact byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> chr_util_marshal::Result<Self> {
        let mut demarshaler = Demarshaler::new(bytes);
        let output = Self::read_from(&mut demarshaler)?;
        demarshaler.expect_done()?;
        Ok(output)
    }
}

/// Outputs compare by canonical bytes; the assigned id does not take part.
impl PartialEq for Output {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Output {}

impl PartialOrd for Output {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Output {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::SigLockedSingle(inner) => {
                write!(f, "SigLockedSingle({} IOTA -> {})", inner.amount, inner.address)
            }
            Output::SigLockedColored(inner) => {
                write!(f, "SigLockedColored({} -> {})", inner.balances, inner.address)
            }
        }
    }
}

/// A canonical-ordered sequence of outputs.
///
/// The constructor sorts ascending by canonical bytes, so any permutation of
/// the same outputs encodes to the same byte string. Decoding preserves the
/// wire order verbatim.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Outputs(Vec<Output>);

impl Outputs {
    /// Builds a canonical-ordered sequence from arbitrary-ordered outputs.
    pub fn new(mut outputs: Vec<Output>) -> Self {
        outputs.sort();
        Self(outputs)
    }

    /// Number of outputs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no outputs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The output at `index`.
    pub fn get(&self, index: usize) -> Option<&Output> {
        self.0.get(index)
    }

    /// Iterates outputs in sequence order.
    pub fn iter(&self) -> core::slice::Iter<'_, Output> {
        self.0.iter()
    }

    /// Assigns `(transaction_id, index)` ids in sequence order.
    pub(crate) fn assign_ids(&mut self, transaction_id: chr_transaction_types::TransactionID) {
        for (index, output) in self.0.iter_mut().enumerate() {
            output.set_id(OutputID::new(transaction_id, index as u16));
        }
    }

    /// Writes the count (`u16` BE) followed by each output.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u16(self.0.len() as u16);
        for output in &self.0 {
            output.write_to(marshaler);
        }
    }

    /// Reads a sequence of outputs, preserving wire order.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let count = demarshaler.read_u16()?;
        let mut outputs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            outputs.push(Output::read_from(demarshaler)?);
        }
        Ok(Self(outputs))
    }
}

impl From<Output> for Outputs {
    fn from(output: Output) -> Self {
        Self(vec![output])
    }
}

impl<'a> IntoIterator for &'a Outputs {
    type Item = &'a Output;
    type IntoIter = core::slice::Iter<'a, Output>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
