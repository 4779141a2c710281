// Copyright (c) 2021-2024 The Chroma Foundation

//! Structural transaction checks that need no ledger state beyond the
//! consumed outputs themselves.

use crate::{Output, Transaction, UnlockBlock};
use displaydoc::Display;

/// An error verifying a transaction's unlock blocks.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ValidationError {
    /// expected {expected} consumed outputs, got {actual}
    ConsumedOutputsMismatch {
        /// Number of inputs in the transaction.
        expected: usize,
        /// Number of outputs supplied.
        actual: usize,
    },

    /// unlock block {index} is not backed by a prior signature block
    InvalidUnlockOrder {
        /// Position of the offending block.
        index: usize,
    },

    /// unlock block {index} does not sign the essence for the consumed output's address
    InvalidSignature {
        /// Position of the offending block.
        index: usize,
    },
}

/// Verifies every unlock block of `tx` against the outputs it consumes.
///
/// `consumed` must be parallel to the transaction's canonical input order:
/// `consumed[i]` is the output referenced by input `i`. For each position the
/// signature is resolved (following references backward) and checked against
/// the consumed output's address and the essence bytes.
pub fn verify_unlock_blocks(tx: &Transaction, consumed: &[Output]) -> Result<(), ValidationError> {
    let inputs = tx.essence().inputs().len();
    if consumed.len() != inputs {
        return Err(ValidationError::ConsumedOutputsMismatch {
            expected: inputs,
            actual: consumed.len(),
        });
    }

    let essence_bytes = tx.essence().to_bytes();
    for index in 0..inputs {
        let signature = match tx.unlock_blocks().get(index) {
            Some(UnlockBlock::Signature(signature)) => signature,
            Some(UnlockBlock::Reference(referenced)) => {
                let referenced = *referenced as usize;
                if referenced >= index {
                    return Err(ValidationError::InvalidUnlockOrder { index });
                }
                match tx.unlock_blocks().get(referenced) {
                    Some(UnlockBlock::Signature(signature)) => signature,
                    _ => return Err(ValidationError::InvalidUnlockOrder { index }),
                }
            }
            // Unreachable by the Transaction invariant, kept as a typed
            // failure rather than a panic.
            None => return Err(ValidationError::InvalidUnlockOrder { index }),
        };

        if !signature.address_signature_valid(consumed[index].address(), &essence_bytes) {
            return Err(ValidationError::InvalidSignature { index });
        }
    }

    Ok(())
}

/// True iff the two transactions cannot both be committed: they share an id
/// or consume at least one common output.
pub fn are_conflicting(tx1: &Transaction, tx2: &Transaction) -> bool {
    if tx1.id() == tx2.id() {
        return true;
    }
    tx1.essence().inputs().iter().any(|input1| {
        tx2.essence()
            .inputs()
            .iter()
            .any(|input2| input1.output_id() == input2.output_id())
    })
}
