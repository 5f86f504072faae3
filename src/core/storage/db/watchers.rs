// src/core/storage/db/watchers.rs

//! Watcher bookkeeping for optimistic concurrency control.
//!
//! The keyspace keeps a key → watcher-list map; each watching session keeps a
//! mirrored `(db, key)` list. The relation is maintained explicitly by
//! `watch_key` / `unwatch_key` / session teardown. A write to a watched key
//! marks every watcher dirty *before* the mutation is applied; `EXEC` checks
//! the flag after acquiring the keyspace guard, so the ordering is not
//! observable from the outside.

use super::core::Keyspace;
use crate::core::state::client::{ClientHandle, SessionFlags};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

impl Keyspace {
    /// Registers `handle` as a watcher of `key`. Returns `false` (and leaves
    /// the list untouched) if the session already watches the key in this DB.
    pub fn watch_key(&mut self, key: Bytes, handle: &Arc<ClientHandle>) -> bool {
        let watchers = self.watched_keys.entry(key).or_default();
        if watchers
            .iter()
            .any(|w| w.session_id == handle.session_id)
        {
            return false;
        }
        watchers.push(Arc::clone(handle));
        true
    }

    /// Removes `session_id` from the watcher list of `key`, dropping the list
    /// entirely once it becomes empty.
    pub fn unwatch_key(&mut self, key: &Bytes, session_id: u64) {
        if let Some(watchers) = self.watched_keys.get_mut(key) {
            watchers.retain(|w| w.session_id != session_id);
            if watchers.is_empty() {
                self.watched_keys.remove(key);
            }
        }
    }

    /// Marks every session watching `key` as having failed its optimistic
    /// check. Idempotent; a session's own writes never reach this while it is
    /// executing a batch, because `EXEC` unwatches before running.
    pub fn touch_key(&mut self, key: &Bytes) {
        self.mark_watchers_dirty(key);
    }

    pub(crate) fn mark_watchers_dirty(&mut self, key: &Bytes) {
        if let Some(watchers) = self.watched_keys.get(key) {
            for handle in watchers {
                handle.set_flag(SessionFlags::DIRTY_CAS);
                debug!(
                    "Session {}: marked dirty-cas by touch on key {:?}.",
                    handle.session_id, key
                );
            }
        }
    }

    /// Number of sessions watching `key`.
    pub fn watcher_count(&self, key: &Bytes) -> usize {
        self.watched_keys.get(key).map_or(0, Vec::len)
    }

    /// Number of keys with at least one watcher.
    pub fn watched_key_count(&self) -> usize {
        self.watched_keys.len()
    }
}
