// src/core/state/replication.rs

//! Contains state definitions related to replication: the instance role and
//! the replication backlog.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Default capacity of the replication backlog, in bytes.
const DEFAULT_BACKLOG_CAPACITY: usize = 1024 * 1024;

/// The replication role of this instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationRole {
    Primary,
    Replica { primary_addr: String },
}

/// The central struct holding all replication-related state.
#[derive(Debug)]
pub struct ReplicationState {
    role: RwLock<ReplicationRole>,
    /// Bumped on every role change. `EXEC` snapshots it before running a
    /// batch to detect a demotion that happened between two queued commands.
    role_epoch: AtomicU64,
    pub backlog: ReplicationBacklog,
}

impl ReplicationState {
    pub fn new() -> Self {
        Self {
            role: RwLock::new(ReplicationRole::Primary),
            role_epoch: AtomicU64::new(0),
            backlog: ReplicationBacklog::new(DEFAULT_BACKLOG_CAPACITY),
        }
    }

    pub fn role(&self) -> ReplicationRole {
        self.role.read().clone()
    }

    pub fn is_replica(&self) -> bool {
        matches!(*self.role.read(), ReplicationRole::Replica { .. })
    }

    pub fn role_epoch(&self) -> u64 {
        self.role_epoch.load(Ordering::Acquire)
    }

    /// Switches the role, bumping the epoch so in-flight batches can observe
    /// the transition.
    pub fn set_role(&self, role: ReplicationRole) {
        let mut current = self.role.write();
        if *current == role {
            return;
        }
        warn!("Replication role changing: {:?} -> {:?}", *current, role);
        *current = role;
        self.role_epoch.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for ReplicationState {
    fn default() -> Self {
        Self::new()
    }
}

/// A bounded circular byte buffer of the most recent replication stream, with
/// a monotonically increasing global offset.
#[derive(Debug)]
pub struct ReplicationBacklog {
    buf: Mutex<VecDeque<u8>>,
    capacity: usize,
    offset: AtomicU64,
}

impl ReplicationBacklog {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Mutex::new(VecDeque::with_capacity(capacity.min(64 * 1024))),
            capacity,
            offset: AtomicU64::new(0),
        }
    }

    /// Appends raw stream bytes, evicting from the front once over capacity.
    pub fn feed(&self, data: &[u8]) {
        let mut buf = self.buf.lock();
        buf.extend(data.iter().copied());
        while buf.len() > self.capacity {
            buf.pop_front();
        }
        self.offset.fetch_add(data.len() as u64, Ordering::AcqRel);
    }

    /// The total number of stream bytes ever fed.
    pub fn master_repl_offset(&self) -> u64 {
        self.offset.load(Ordering::Acquire)
    }

    /// A copy of the currently buffered stream tail.
    pub fn snapshot(&self) -> Vec<u8> {
        self.buf.lock().iter().copied().collect()
    }
}
