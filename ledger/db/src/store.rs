// Copyright (c) 2021-2024 The Chroma Foundation

//! Data access abstraction for the live output set.

use chr_transaction_core::Output;
use chr_transaction_types::OutputID;
use std::collections::HashMap;

/// Storage for live (unspent) outputs, keyed by output id.
///
/// The ledger owns the store exclusively behind its writer lock, so
/// implementations need no interior synchronization. Values entering the
/// store carry their assigned ids; lookups return clones so callers can
/// never alias ledger-owned state.
pub trait OutputStore {
    /// The output stored under `id`, if any.
    fn get(&self, id: &OutputID) -> Option<Output>;

    /// Stores `output` under `id`, replacing any previous entry.
    fn insert(&mut self, id: OutputID, output: Output);

    /// Removes and returns the output stored under `id`.
    fn remove(&mut self, id: &OutputID) -> Option<Output>;

    /// Visits every stored entry, in unspecified order.
    fn for_each(&self, visit: &mut dyn FnMut(&OutputID, &Output));

    /// Number of stored outputs.
    fn len(&self) -> usize;

    /// True when nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The reference [`OutputStore`]: a plain in-memory map.
#[derive(Debug, Default)]
pub struct MemoryOutputStore {
    outputs: HashMap<OutputID, Output>,
}

impl MemoryOutputStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputStore for MemoryOutputStore {
    fn get(&self, id: &OutputID) -> Option<Output> {
        self.outputs.get(id).cloned()
    }

    fn insert(&mut self, id: OutputID, output: Output) {
        self.outputs.insert(id, output);
    }

    fn remove(&mut self, id: &OutputID) -> Option<Output> {
        self.outputs.remove(id)
    }

    fn for_each(&self, visit: &mut dyn FnMut(&OutputID, &Output)) {
        for (id, output) in &self.outputs {
            visit(id, output);
        }
    }

    fn len(&self) -> usize {
        self.outputs.len()
    }
}
