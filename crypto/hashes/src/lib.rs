// Copyright (c) 2021-2024 The Chroma Foundation

//! Hash functions used by the Chroma object model.
//!
//! Every identifier in the workspace is a 32-byte Blake2b-256 digest:
//! transaction ids hash the transaction's canonical bytes, address digests
//! hash the verifying key, and minted colors hash the output id of the
//! output that created them.

#![no_std]
#![deny(missing_docs)]

pub use digest::Digest;

use blake2::Blake2b;
use digest::consts::U32;

/// Blake2b with a 256-bit digest.
pub type Blake2b256 = Blake2b<U32>;

/// Convenience helper hashing `data` to a 32-byte Blake2b-256 digest.
pub fn hash32(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}
