// src/core/state/client.rs

//! Contains state definitions related to client connections.

use bitflags::bitflags;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

pub type ClientMap = Arc<DashMap<u64, Arc<ClientHandle>>>;

bitflags! {
    /// Session flags visible to every subsystem.
    ///
    /// `DIRTY_CAS` is the only flag set by *other* sessions (a write to a
    /// watched key marks every watcher), which is why the flags live on the
    /// shared handle rather than the connection-local session state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SessionFlags: u32 {
        /// The session is between a successful `MULTI` and its `EXEC`/`DISCARD`.
        const IN_TX      = 1 << 0;
        /// A key watched by this session has been modified since `WATCH`.
        const DIRTY_CAS  = 1 << 1;
        /// A command failed validation while being queued; `EXEC` must abort.
        const DIRTY_EXEC = 1 << 2;
        /// The connection is the link from our primary (replication stream).
        const IS_MASTER  = 1 << 3;
        /// The connection belongs to a replica of this instance.
        const IS_REPLICA = 1 << 4;
        /// The session is in monitor mode.
        const MONITOR    = 1 << 5;
    }
}

/// The shared, registry-visible part of a client session.
///
/// Everything a foreign subsystem may need to reach — the flag word, the peer
/// address and the client name (both captured into slowlog entries) — lives
/// here behind cheap synchronous locks. The connection-local half of the
/// session (queue, watched list, current DB) is in `connection::session`.
#[derive(Debug)]
pub struct ClientHandle {
    pub session_id: u64,
    /// Peer identifier, as an `address:port` string.
    pub addr: String,
    pub created: Instant,
    name: Mutex<Bytes>,
    flags: Mutex<SessionFlags>,
}

impl ClientHandle {
    pub fn new(session_id: u64, addr: String) -> Self {
        Self {
            session_id,
            addr,
            created: Instant::now(),
            name: Mutex::new(Bytes::new()),
            flags: Mutex::new(SessionFlags::empty()),
        }
    }

    pub fn set_flag(&self, flag: SessionFlags) {
        self.flags.lock().insert(flag);
    }

    pub fn clear_flags(&self, mask: SessionFlags) {
        self.flags.lock().remove(mask);
    }

    pub fn has_flag(&self, flag: SessionFlags) -> bool {
        self.flags.lock().contains(flag)
    }

    pub fn flags(&self) -> SessionFlags {
        *self.flags.lock()
    }

    /// The client name, empty until `CLIENT SETNAME`.
    pub fn name(&self) -> Bytes {
        self.name.lock().clone()
    }

    pub fn set_name(&self, name: Bytes) {
        *self.name.lock() = name;
    }
}
