// Copyright (c) 2021-2024 The Chroma Foundation

//! Value types of the Chroma ledger.
//!
//! These are the plain data types shared across the workspace: token colors,
//! per-color balance maps, transaction and output identifiers, pledge tags,
//! and the compile-time network constants. No crypto, no I/O.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

pub mod constants;

mod color;
mod colored_balances;
mod ids;

pub use color::{Color, COLOR_LENGTH};
pub use colored_balances::{BalanceError, ColoredBalances};
pub use ids::{OutputID, PledgeId, TransactionID, OUTPUT_ID_LENGTH, TRANSACTION_ID_LENGTH};
