// Copyright (c) 2021-2024 The Chroma Foundation

//! The transaction: an essence plus the unlock blocks authorizing it.

use crate::{TransactionEssence, UnlockBlocks};
use alloc::vec::Vec;
use chr_crypto_hashes::hash32;
use chr_transaction_types::TransactionID;
use chr_util_marshal::{Demarshaler, Error as MarshalError, Marshaler};
use core::fmt;
use displaydoc::Display;

/// An error assembling a transaction.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum TxError {
    /// transaction has {inputs} inputs but {unlock_blocks} unlock blocks
    UnlockCountMismatch {
        /// Number of inputs in the essence.
        inputs: usize,
        /// Number of unlock blocks supplied.
        unlock_blocks: usize,
    },
}

/// A signed value transaction.
///
/// The id is the Blake2b-256 digest of the canonical bytes, computed once at
/// construction. Construction also assigns each essence output its
/// `(transaction_id, index)` id, which is how outputs become addressable by
/// the ledger and by later transactions.
#[derive(Clone, Debug)]
pub struct Transaction {
    essence: TransactionEssence,
    unlock_blocks: UnlockBlocks,
    id: TransactionID,
}

impl Transaction {
    /// Assembles a transaction, requiring one unlock block per input.
    pub fn new(
        mut essence: TransactionEssence,
        unlock_blocks: UnlockBlocks,
    ) -> Result<Self, TxError> {
        let inputs = essence.inputs().len();
        if unlock_blocks.len() != inputs {
            return Err(TxError::UnlockCountMismatch {
                inputs,
                unlock_blocks: unlock_blocks.len(),
            });
        }

        let mut marshaler = Marshaler::new();
        essence.write_to(&mut marshaler);
        unlock_blocks.write_to(&mut marshaler);
        let id = TransactionID::new(hash32(marshaler.as_ref()));

        essence.outputs_mut().assign_ids(id);

        Ok(Self {
            essence,
            unlock_blocks,
            id,
        })
    }

    /// The transaction id.
    pub fn id(&self) -> &TransactionID {
        &self.id
    }

    /// The signed portion.
    pub fn essence(&self) -> &TransactionEssence {
        &self.essence
    }

    /// The per-input authorizations.
    pub fn unlock_blocks(&self) -> &UnlockBlocks {
        &self.unlock_blocks
    }

    /// Writes the wire form: essence followed by unlock blocks.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        self.essence.write_to(marshaler);
        self.unlock_blocks.write_to(marshaler);
    }

    /// Reads a transaction from a demarshaler.
    ///
    /// The unlock-count invariant is re-checked and the id recomputed, so a
    /// decoded transaction is indistinguishable from a constructed one.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let essence = TransactionEssence::read_from(demarshaler)?;
        let unlock_blocks = UnlockBlocks::read_from(demarshaler)?;
        Transaction::new(essence, unlock_blocks)
            .map_err(|_| MarshalError::NonCanonical("unlock block count mismatch"))
    }

    /// The canonical wire form as a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut marshaler = Marshaler::new();
        self.write_to(&mut marshaler);
        marshaler.finish()
    }

    /// Decodes a transaction from an exact byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> chr_util_marshal::Result<Self> {
        let mut demarshaler = Demarshaler::new(bytes);
        let tx = Self::read_from(&mut demarshaler)?;
        demarshaler.expect_done()?;
        Ok(tx)
    }
}

/// Transactions are equal iff their ids are equal; the id is a digest of the
/// full canonical bytes.
impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Transaction {}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction({}, {} inputs, {} outputs)",
            self.id,
            self.essence.inputs().len(),
            self.essence.outputs().len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Input, Inputs, Output, Outputs, Signature, UnlockBlock};
    use chr_account_keys::Address;
    use chr_crypto_keys::Ed25519Pair;
    use chr_transaction_types::{OutputID, PledgeId};
    use rand::{rngs::StdRng, SeedableRng};

    fn signed_sample(rng: &mut StdRng) -> Transaction {
        let pair = Ed25519Pair::from_random(rng);
        let address = Address::from_public_key(&pair.public());
        let inputs = Inputs::new(alloc::vec![Input::utxo(OutputID::new(
            TransactionID::new([4; 32]),
            1
        ))]);
        let outputs = Outputs::new(alloc::vec![Output::sig_locked_single(9, address)]);
        let essence = TransactionEssence::new(
            0,
            1_700_000_000_000_000_000,
            PledgeId::default(),
            PledgeId::default(),
            inputs,
            outputs,
        );
        let signature = Signature::ed25519(pair.public(), pair.sign(&essence.to_bytes()));
        let blocks = UnlockBlocks::new(alloc::vec![UnlockBlock::Signature(signature)]).unwrap();
        Transaction::new(essence, blocks).unwrap()
    }

    #[test]
    fn construction_assigns_output_ids() {
        let mut rng = StdRng::seed_from_u64(30);
        let tx = signed_sample(&mut rng);
        let output = tx.essence().outputs().get(0).unwrap();
        assert_eq!(output.id(), Some(OutputID::new(*tx.id(), 0)));
    }

    #[test]
    fn id_is_stable_across_round_trip() {
        let mut rng = StdRng::seed_from_u64(31);
        let tx = signed_sample(&mut rng);
        let recovered = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(tx, recovered);
        assert_eq!(tx.id(), recovered.id());
        assert_eq!(tx.to_bytes(), recovered.to_bytes());
    }

    #[test]
    fn unlock_count_mismatch_is_rejected() {
        let mut rng = StdRng::seed_from_u64(32);
        let tx = signed_sample(&mut rng);
        let essence = tx.essence().clone();
        assert_eq!(
            Transaction::new(essence, UnlockBlocks::default()),
            Err(TxError::UnlockCountMismatch {
                inputs: 1,
                unlock_blocks: 0
            })
        );
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        let mut rng = StdRng::seed_from_u64(33);
        let bytes = signed_sample(&mut rng).to_bytes();
        assert!(Transaction::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }
}
