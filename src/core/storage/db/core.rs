// src/core/storage/db/core.rs

use crate::core::state::client::ClientHandle;
use crate::core::storage::data_types::{DataValue, StoredValue};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};

/// A single numbered database.
///
/// The entire keyspace of a database sits behind one async mutex. A command
/// holds the guard for the whole of its execution and `EXEC` holds it across
/// an entire batch, which is what makes batches atomic with respect to every
/// other session: nothing else can observe or modify the keyspace between the
/// first and last queued command.
#[derive(Debug)]
pub struct Db {
    /// The database index, also used as the DB selector in propagation records.
    pub index: usize,
    keyspace: Mutex<Keyspace>,
}

impl Db {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            keyspace: Mutex::new(Keyspace::new()),
        }
    }

    /// Acquires the keyspace guard for this database.
    pub async fn lock(&self) -> MutexGuard<'_, Keyspace> {
        self.keyspace.lock().await
    }
}

/// The contents of a single database: the key → value dictionary, the
/// per-key expiry table, and the per-key watcher lists used for optimistic
/// concurrency control.
#[derive(Debug, Default)]
pub struct Keyspace {
    pub(crate) dict: HashMap<Bytes, StoredValue>,
    pub(crate) expires: HashMap<Bytes, Instant>,
    /// Key → ordered list of sessions watching that key. A key may be watched
    /// before it exists; a session appears at most once per list.
    pub(crate) watched_keys: HashMap<Bytes, Vec<Arc<ClientHandle>>>,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored. Keys past their expiry but not yet
    /// lazily purged still count; they disappear on the next lookup.
    pub fn key_count(&self) -> usize {
        self.dict.len()
    }

    /// Looks at a value without purging expired keys or stamping access time.
    pub fn peek(&self, key: &Bytes) -> Option<&StoredValue> {
        if self.is_expired(key) {
            return None;
        }
        self.dict.get(key)
    }

    fn is_expired(&self, key: &Bytes) -> bool {
        self.expires.get(key).is_some_and(|at| *at <= Instant::now())
    }

    /// Removes the key if its expiry has passed. Watchers of the key see the
    /// removal as a modification.
    fn purge_if_expired(&mut self, key: &Bytes) {
        if self.is_expired(key) {
            self.mark_watchers_dirty(key);
            self.dict.remove(key);
            self.expires.remove(key);
        }
    }

    /// Read-path lookup: lazily purges an expired key and stamps access time.
    pub fn lookup_read(&mut self, key: &Bytes) -> Option<&mut StoredValue> {
        self.purge_if_expired(key);
        let value = self.dict.get_mut(key)?;
        value.touch_access();
        Some(value)
    }

    /// Write-path lookup: marks every watcher of the key dirty before handing
    /// the value out for mutation.
    pub fn lookup_write(&mut self, key: &Bytes) -> Option<&mut StoredValue> {
        self.purge_if_expired(key);
        if self.dict.contains_key(key) {
            self.mark_watchers_dirty(key);
        }
        let value = self.dict.get_mut(key)?;
        value.touch_access();
        Some(value)
    }

    /// Inserts or replaces a value. Any existing expiry on the key is left
    /// alone; callers that need `SET`-style expiry reset use [`set_expiry`].
    ///
    /// [`set_expiry`]: Keyspace::set_expiry
    pub fn insert(&mut self, key: Bytes, value: StoredValue) {
        self.mark_watchers_dirty(&key);
        self.dict.insert(key, value);
    }

    /// Convenience for the common "store a string payload" write.
    pub fn insert_string(&mut self, key: Bytes, payload: Bytes) {
        self.insert(key, StoredValue::new(DataValue::String(payload)));
    }

    /// Sets or clears the expiry of a key. Counts as a modification for
    /// watchers when the key exists.
    pub fn set_expiry(&mut self, key: &Bytes, at: Option<Instant>) {
        if self.dict.contains_key(key) {
            self.mark_watchers_dirty(key);
        }
        match at {
            Some(at) => {
                self.expires.insert(key.clone(), at);
            }
            None => {
                self.expires.remove(key);
            }
        }
    }

    pub fn expiry(&self, key: &Bytes) -> Option<Instant> {
        self.expires.get(key).copied()
    }

    /// Deletes a key, returning whether it existed.
    pub fn delete(&mut self, key: &Bytes) -> bool {
        self.purge_if_expired(key);
        if self.dict.contains_key(key) {
            self.mark_watchers_dirty(key);
        }
        self.expires.remove(key);
        self.dict.remove(key).is_some()
    }

    /// Empties the database. Watchers of keys that exist at flush time are
    /// marked dirty; watches on not-yet-existing keys are unaffected, since
    /// the flush did not remove anything they were tracking.
    pub fn clear(&mut self) -> usize {
        let keys_to_touch: Vec<Bytes> = self
            .watched_keys
            .keys()
            .filter(|k| self.dict.contains_key(*k))
            .cloned()
            .collect();
        for key in keys_to_touch {
            self.mark_watchers_dirty(&key);
        }
        let removed = self.dict.len();
        self.dict.clear();
        self.expires.clear();
        removed
    }
}
