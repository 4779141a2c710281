// Copyright (c) 2021-2024 The Chroma Foundation

//! The Chroma UTXO ledger.
//!
//! [`UtxoDb`] keeps the live output set and the committed transactions of a
//! single ledger instance, validates incoming transactions against the
//! conservation rules (no double spend, balanced totals, no color
//! inflation, valid unlock blocks), and applies each one atomically under a
//! single writer lock. Construction seeds a genesis transaction holding the
//! whole supply; [`UtxoDb::request_funds`] is the faucet that breaks it up.
//!
//! Storage is abstracted behind [`OutputStore`]; [`MemoryOutputStore`] is
//! the reference implementation, and nothing here persists.

#![deny(missing_docs)]

mod error;
mod store;
mod utxo_db;

pub use error::LedgerError;
pub use store::{MemoryOutputStore, OutputStore};
pub use utxo_db::UtxoDb;

pub use chr_transaction_core::validation::are_conflicting;

use chr_crypto_keys::{Ed25519Pair, Seed};
use chr_transaction_types::constants::GENESIS_SEED;

/// Derives the deterministic key pair at `index` under the ledger's
/// well-known seed.
///
/// Index [`GENESIS_KEY_INDEX`] is the genesis identity; tests and tooling use
/// other indices for stable user identities.
///
/// [`GENESIS_KEY_INDEX`]: chr_transaction_types::constants::GENESIS_KEY_INDEX
pub fn key_pair_from_seed(index: u64) -> Ed25519Pair {
    Seed::new(GENESIS_SEED).key_pair(index)
}
