// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::client::{ClientHandle, ClientMap};
use super::persistence::PersistenceState;
use super::replication::ReplicationState;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::ZirconDBError;
use crate::core::events::{PropagatedRecord, PropagationSink};
use crate::core::monitor::MonitorFeed;
use crate::core::slowlog::SlowLog;
use crate::core::storage::db::Db;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};

/// Contains the initialized shared state plus the channel ends handed to the
/// background persistence task.
pub struct ServerInit {
    /// The fully initialized, shared server state.
    pub state: Arc<ServerState>,
    /// Receives records for the AOF writer task, if AOF is enabled.
    pub aof_event_rx: Option<mpsc::Receiver<PropagatedRecord>>,
}

/// The central struct holding all shared, server-wide state.
///
/// Wrapped in an `Arc` and threaded through every dispatcher and handler; the
/// single source of truth for configuration and dynamic state.
#[derive(Debug)]
pub struct ServerState {
    /// All numbered databases.
    pub dbs: Vec<Arc<Db>>,
    /// All registered client sessions, keyed by session id.
    pub clients: ClientMap,
    /// The runtime configuration, behind a mutex so `CONFIG SET` can change it.
    pub config: Arc<Mutex<Config>>,
    /// Set when propagation can no longer be guaranteed; write commands are
    /// rejected until an operator intervenes.
    pub is_emergency_read_only: AtomicBool,
    /// The ordered hand-off point to AOF and replication.
    pub sink: Arc<PropagationSink>,
    /// The slow-query log.
    pub slowlog: SlowLog,
    /// Fan-out to sessions in monitor mode.
    pub monitors: MonitorFeed,
    /// Persistence bookkeeping (dirty-keys counter).
    pub persistence: PersistenceState,
    /// Replication role and backlog.
    pub replication: ReplicationState,
    /// Server-wide statistics.
    pub stats: StatsState,

    next_session_id: AtomicU64,
}

impl ServerState {
    /// Initializes the entire server state from the given configuration.
    pub fn initialize(config: Config) -> Result<ServerInit, ZirconDBError> {
        let (sink, aof_event_rx) = PropagationSink::new(config.persistence.aof_enabled);

        let dbs = (0..config.databases).map(|i| Arc::new(Db::new(i))).collect();
        let slowlog = SlowLog::new(config.slowlog.log_slower_than, config.slowlog.max_len);

        let state = Arc::new(Self {
            dbs,
            clients: Arc::new(DashMap::new()),
            config: Arc::new(Mutex::new(config)),
            is_emergency_read_only: AtomicBool::new(false),
            sink: Arc::new(sink),
            slowlog,
            monitors: MonitorFeed::new(),
            persistence: PersistenceState::new(),
            replication: ReplicationState::new(),
            stats: StatsState::new(),
            next_session_id: AtomicU64::new(1),
        });

        Ok(ServerInit {
            state,
            aof_event_rx,
        })
    }

    /// Retrieves a reference to a specific database by its index.
    pub fn get_db(&self, db_index: usize) -> Option<Arc<Db>> {
        self.dbs.get(db_index).cloned()
    }

    /// Registers a new client session and returns its shared handle.
    pub fn register_client(&self, addr: String) -> Arc<ClientHandle> {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let handle = Arc::new(ClientHandle::new(session_id, addr));
        self.clients.insert(session_id, Arc::clone(&handle));
        self.stats.increment_total_connections();
        handle
    }

    /// Drops a session from the registry and the monitor feed. Transaction
    /// and watch teardown is the caller's job (see
    /// `TransactionHandler::dissolve_session`), since it needs keyspace guards.
    pub fn unregister_client(&self, session_id: u64) {
        self.clients.remove(&session_id);
        self.monitors.unregister(session_id);
    }
}
