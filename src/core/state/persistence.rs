// src/core/state/persistence.rs

//! Contains state definitions related to persistence.

use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks how much of the dataset has changed since the last durability
/// checkpoint. Snapshot schedulers read this counter; flush-style commands
/// reset it.
#[derive(Debug, Default)]
pub struct PersistenceState {
    dirty_keys_counter: AtomicU64,
}

impl PersistenceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_dirty_keys(&self, count: u64) {
        self.dirty_keys_counter.fetch_add(count, Ordering::Relaxed);
    }

    pub fn reset_dirty_keys(&self) {
        self.dirty_keys_counter.store(0, Ordering::Relaxed);
    }

    pub fn dirty_keys(&self) -> u64 {
        self.dirty_keys_counter.load(Ordering::Relaxed)
    }
}
