// Copyright (c) 2021-2024 The Chroma Foundation

//! The transaction essence: the signed portion of a transaction.

use crate::{Inputs, Outputs};
use alloc::vec::Vec;
use chr_transaction_types::PledgeId;
use chr_util_marshal::{Demarshaler, Marshaler};

/// Everything a transaction commits to except its unlock blocks.
///
/// Signatures are made over the essence bytes, so every field here is
/// tamper-evident: changing the timestamp, a pledge tag, or any input or
/// output invalidates all signatures.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionEssence {
    version: u8,
    /// Nanoseconds since the Unix epoch.
    timestamp: i64,
    access_pledge_id: PledgeId,
    consensus_pledge_id: PledgeId,
    inputs: Inputs,
    outputs: Outputs,
}

impl TransactionEssence {
    /// Builds an essence from canonical-ordered inputs and outputs.
    pub fn new(
        version: u8,
        timestamp: i64,
        access_pledge_id: PledgeId,
        consensus_pledge_id: PledgeId,
        inputs: Inputs,
        outputs: Outputs,
    ) -> Self {
        Self {
            version,
            timestamp,
            access_pledge_id,
            consensus_pledge_id,
            inputs,
            outputs,
        }
    }

    /// The essence version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Creation time, nanoseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The access-pledge tag.
    pub fn access_pledge_id(&self) -> &PledgeId {
        &self.access_pledge_id
    }

    /// The consensus-pledge tag.
    pub fn consensus_pledge_id(&self) -> &PledgeId {
        &self.consensus_pledge_id
    }

    /// The consumed inputs, in canonical order.
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// The created outputs, in canonical order.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub(crate) fn outputs_mut(&mut self) -> &mut Outputs {
        &mut self.outputs
    }

    /// Writes the fields in declared order.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u8(self.version);
        marshaler.write_i64(self.timestamp);
        self.access_pledge_id.write_to(marshaler);
        self.consensus_pledge_id.write_to(marshaler);
        self.inputs.write_to(marshaler);
        self.outputs.write_to(marshaler);
    }

    /// Reads an essence from a demarshaler.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let version = demarshaler.read_u8()?;
        let timestamp = demarshaler.read_i64()?;
        let access_pledge_id = PledgeId::read_from(demarshaler)?;
        let consensus_pledge_id = PledgeId::read_from(demarshaler)?;
        let inputs = Inputs::read_from(demarshaler)?;
        let outputs = Outputs::read_from(demarshaler)?;
        Ok(Self {
            version,
            timestamp,
            access_pledge_id,
            consensus_pledge_id,
            inputs,
            outputs,
        })
    }

    /// The canonical bytes: what gets signed and hashed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut marshaler = Marshaler::new();
        self.write_to(&mut marshaler);
        marshaler.finish()
    }
}
