// Copyright (c) 2021-2024 The Chroma Foundation

//! Chroma addresses.
//!
//! An address names the party allowed to spend an output. Addresses are a
//! tagged union over address kinds; the only kind today is [`Ed25519Address`],
//! whose payload is the Blake2b-256 digest of an Ed25519 verifying key.
//! Equality and ordering compare the full wire form (kind byte plus digest),
//! so two addresses are the same iff their byte arrays are the same.

#![no_std]
#![deny(missing_docs)]

mod address;

pub use address::{Address, AddressKind, Ed25519Address, ADDRESS_LENGTH};
