// Copyright (c) 2021-2024 The Chroma Foundation

//! Chroma transaction object model.
//!
//! The entities a value transfer is made of: outputs locked to addresses,
//! inputs referencing prior outputs, signatures and the unlock blocks that
//! carry them, the transaction essence (the signed portion), and the
//! transaction itself. Every entity has a canonical byte form produced by
//! `write_to` and a decoding constructor `read_from` that dispatches on a
//! kind byte and fails, never panics, on malformed input. Identifiers are
//! Blake2b-256 digests of those canonical bytes.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

mod essence;
mod input;
mod output;
mod signature;
mod tx;
mod unlock_block;

pub mod validation;

pub use essence::TransactionEssence;
pub use input::{Input, InputKind, Inputs, UtxoInput};
pub use output::{Output, OutputKind, Outputs, SigLockedColoredOutput, SigLockedSingleOutput};
pub use signature::{Signature, SignatureKind};
pub use tx::{Transaction, TxError};
pub use unlock_block::{UnlockBlock, UnlockBlockKind, UnlockBlocks, UnlockError};

// The types that appear in entity signatures, re-exported for callers that
// only depend on this crate.
pub use chr_account_keys::Address;
pub use chr_transaction_types::{Color, ColoredBalances, OutputID, PledgeId, TransactionID};
