// Copyright (c) 2021-2024 The Chroma Foundation

use chr_transaction_core::validation::ValidationError;
use chr_transaction_types::{Color, OutputID, TransactionID};
use displaydoc::Display;

/// Reasons a transaction is rejected by the ledger, plus the one
/// non-recoverable invariant channel.
///
/// Every variant except [`LedgerError::InternalInvariantViolated`] is a
/// caller error and leaves the ledger unchanged. `InternalInvariantViolated`
/// means the ledger itself is broken (for example the post-commit supply
/// check failed) and the instance must not be used further.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum LedgerError {
    /// transaction {0} is already committed
    DuplicateTransaction(TransactionID),

    /// input references an unknown or already spent output {0}
    UnknownOrSpentInput(OutputID),

    /// transaction consumes output {0} more than once
    DuplicateInput(OutputID),

    /// an input carries the mint sentinel color
    MintColorInInput,

    /// input total {inputs} does not equal output total {outputs}
    UnbalancedTotals {
        /// Grand total across all input colors.
        inputs: u128,
        /// Grand total across all output colors.
        outputs: u128,
    },

    /// color {0} is inflated: outputs carry more of it than inputs
    ColorInflated(Color),

    /// output {0} carries no value
    EmptyOutput(u16),

    /// unlock block {index} is not backed by a prior signature block
    InvalidUnlockOrder {
        /// Position of the offending block.
        index: usize,
    },

    /// unlock block {index} does not sign for the consumed output's address
    InvalidSignature {
        /// Position of the offending block.
        index: usize,
    },

    /// the faucet needs one genesis output with sufficient funds
    FaucetExhausted,

    /// ledger invariant violated: {0}
    InternalInvariantViolated(String),
}

impl From<ValidationError> for LedgerError {
    fn from(src: ValidationError) -> Self {
        match src {
            ValidationError::InvalidUnlockOrder { index } => {
                LedgerError::InvalidUnlockOrder { index }
            }
            ValidationError::InvalidSignature { index } => LedgerError::InvalidSignature { index },
            ValidationError::ConsumedOutputsMismatch { expected, actual } => {
                LedgerError::InternalInvariantViolated(format!(
                    "consumed outputs mismatch: expected {expected}, got {actual}"
                ))
            }
        }
    }
}
