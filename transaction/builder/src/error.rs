// Copyright (c) 2021-2024 The Chroma Foundation

use chr_transaction_core::{TxError, UnlockError};
use chr_transaction_types::{BalanceError, Color};
use displaydoc::Display;

/// An error that can occur when using the transaction [`Builder`].
///
/// [`Builder`]: crate::Builder
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum BuilderError {
    /// all source outputs must belong to the same sender address
    MixedSenderAddresses,

    /// no source outputs were provided
    NoInputs,

    /// amount must be positive
    ZeroAmount,

    /// minted amount {minted} exceeds the consumable portion {available}
    MintExceedsAmount {
        /// The requested mint amount.
        minted: u64,
        /// The amount it had to fit into.
        available: u64,
    },

    /// transfer amounts must not be empty
    EmptyBalances,

    /// not enough balance of color {color}: needed {needed}, available {available}
    InsufficientBalance {
        /// The color that ran short.
        color: Color,
        /// The requested amount.
        needed: u64,
        /// What the consumables could still cover.
        available: u64,
    },

    /// consumable index {0} is out of range
    BadIndex(usize),

    /// consumable index {0} was already partially consumed
    AlreadyConsumed(usize),

    /// source output has no assigned id
    MissingOutputId,

    /// the signing key does not control the sender address
    KeyAddressMismatch,

    /// invalid balance set: {0}
    Balance(BalanceError),

    /// unlock block construction failed: {0}
    Unlock(UnlockError),

    /// transaction assembly failed: {0}
    Tx(TxError),
}

impl From<BalanceError> for BuilderError {
    fn from(src: BalanceError) -> Self {
        BuilderError::Balance(src)
    }
}

impl From<UnlockError> for BuilderError {
    fn from(src: UnlockError) -> Self {
        BuilderError::Unlock(src)
    }
}

impl From<TxError> for BuilderError {
    fn from(src: TxError) -> Self {
        BuilderError::Tx(src)
    }
}
