// Copyright (c) 2021-2024 The Chroma Foundation

//! Utility for building and signing a value transaction.
//!
//! The builder takes the unspent outputs of a single address, records the
//! intended transfers (plain, colored, or minting), then assembles a
//! canonical essence: inputs sorted by referenced output id, outputs sorted
//! by their byte form, and whatever value was consumed but not sent returned
//! to the sender as an automatic change output. Signing produces one Ed25519
//! signature over the essence and compacts the per-input unlock blocks into
//! one signature block plus backward references.

mod consumable;
mod error;
mod transaction_builder;

pub use consumable::{
    consumable_balance, consume_colored_tokens, consume_iota, consume_remaining,
    make_utxo_inputs, select_consumed, ConsumableOutput,
};
pub use error::BuilderError;
pub use transaction_builder::Builder;
