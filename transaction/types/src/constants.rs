// Copyright (c) 2021-2024 The Chroma Foundation

//! Chroma network constants.
//!
//! Everything here is fixed at compile time. There is no on-chain governance
//! surface in this core; a node that disagrees on any of these values speaks
//! a different ledger.

/// Total token supply, fixed at genesis.
///
/// Conservation is the ledger's central invariant: after every committed
/// transaction the grand total across all live outputs equals this value.
/// Minting re-labels units, it never creates them.
pub const SUPPLY: u64 = 100_000_000;

/// Amount handed out per faucet request.
pub const REQUEST_FUNDS_AMOUNT: u64 = 1337;

/// The transaction essence version this implementation produces and accepts.
pub const ESSENCE_VERSION: u8 = 0;

/// Seed from which the genesis key pair is derived.
///
/// A fixed ASCII tag rather than entropy: the genesis identity is public by
/// design so that tests and tooling can spend from it deterministically.
pub const GENESIS_SEED: [u8; 32] = *b"chroma-utxodb-genesis-seed-tag-1";

/// Derivation index of the genesis key pair under [`GENESIS_SEED`].
pub const GENESIS_KEY_INDEX: u64 = 31415;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supply_covers_many_faucet_requests() {
        assert_eq!(SUPPLY, 100_000_000);
        assert!(SUPPLY / REQUEST_FUNDS_AMOUNT > 50_000);
    }

    #[test]
    fn genesis_seed_is_32_ascii_bytes() {
        assert_eq!(GENESIS_SEED.len(), 32);
        assert!(GENESIS_SEED.iter().all(u8::is_ascii));
    }
}
