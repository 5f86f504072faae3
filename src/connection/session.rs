// src/connection/session.rs

//! Defines the state associated with a single client session.

use crate::core::Command;
use crate::core::commands::command_trait::CommandFlags;
use crate::core::state::client::ClientHandle;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One command held in a session's transaction queue, together with the
/// flags it carried at queue time.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub command: Command,
    pub flags: CommandFlags,
}

/// One `(database, key)` pair a session is watching. A session may watch keys
/// across several databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedKey {
    pub db_index: usize,
    pub key: Bytes,
}

/// Holds the connection-local state of a single client session.
///
/// The shared half — flag word, peer address, client name — lives on the
/// [`ClientHandle`] in the server-wide registry, where other sessions can
/// reach it (a write to a watched key marks the watcher's flag word).
#[derive(Debug)]
pub struct SessionState {
    pub handle: Arc<ClientHandle>,
    /// The index of the database the client is currently using.
    pub current_db_index: usize,
    /// Commands queued since `MULTI`, in arrival order. Empty whenever the
    /// session is not in a transaction.
    pub tx_queue: Vec<QueuedCommand>,
    /// OR of all queued commands' flags, used to detect a write batch on a
    /// read-only replica without walking the queue.
    pub tx_flags: CommandFlags,
    /// The keys this session watches, mirroring the per-keyspace watcher lists.
    pub watched: Vec<WatchedKey>,
    /// The monitor-mode feed, present after a successful `MONITOR`.
    pub monitor_rx: Option<mpsc::UnboundedReceiver<String>>,
}

impl SessionState {
    pub fn new(handle: Arc<ClientHandle>) -> Self {
        Self {
            handle,
            current_db_index: 0,
            tx_queue: Vec::new(),
            tx_flags: CommandFlags::empty(),
            watched: Vec::new(),
            monitor_rx: None,
        }
    }

    /// Whether this session already watches `(db_index, key)`.
    pub fn is_watching(&self, db_index: usize, key: &Bytes) -> bool {
        self.watched
            .iter()
            .any(|w| w.db_index == db_index && &w.key == key)
    }
}
