// src/core/events.rs

//! The propagation sink: the single ordered hand-off point between command
//! execution and the durability (AOF) and replication subsystems.

use crate::core::protocol::RespFrame;
use crate::core::state::ServerState;
use bitflags::bitflags;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use tokio::sync::{
    broadcast::{self, Sender as BroadcastSender},
    mpsc::{self, Sender as MpscSender, error::TrySendError},
};
use tracing::{debug, error};

/// The capacity of the broadcast channel for replication.
/// This should be large enough to handle bursts of commands without lagging.
const BROADCAST_BUS_CAPACITY: usize = 16384;

/// The capacity of the MPSC channel for AOF persistence.
/// This is very large to ensure that even if disk I/O is slow, the server
/// does not block or reject write commands.
const AOF_CHANNEL_CAPACITY: usize = 65536;

bitflags! {
    /// Which downstream(s) a record is destined for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SinkTargets: u8 {
        const AOF  = 1 << 0;
        const REPL = 1 << 1;
    }
}

/// One command on the propagation stream: a DB selector plus a full argument
/// vector (command name first).
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatedRecord {
    pub db_index: usize,
    pub argv: Vec<Bytes>,
    pub targets: SinkTargets,
}

impl PropagatedRecord {
    /// A record destined for both downstreams, the overwhelmingly common case.
    pub fn new(db_index: usize, argv: Vec<Bytes>) -> Self {
        Self {
            db_index,
            argv,
            targets: SinkTargets::all(),
        }
    }

    /// The record's wire representation: an array of bulk strings.
    pub fn encode_to_vec(&self) -> Vec<u8> {
        RespFrame::from_argv(&self.argv).encode_to_vec()
    }

    fn select_for(db_index: usize) -> Self {
        PropagatedRecord::new(
            db_index,
            vec![
                Bytes::from_static(b"SELECT"),
                Bytes::from(db_index.to_string()),
            ],
        )
    }
}

/// The `PropagationSink` is the central distribution hub for all write
/// operations. Records are delivered to each downstream in exactly the order
/// they are appended here; a batch is appended as one unit, so a transaction's
/// `MULTI … EXEC` bracket is never interleaved with another session's records.
#[derive(Debug)]
pub struct PropagationSink {
    /// A broadcast sender for replication (one-to-many).
    replication_sender: BroadcastSender<PropagatedRecord>,
    /// An MPSC sender for AOF persistence (one-to-one).
    aof_sender: Option<MpscSender<PropagatedRecord>>,
    /// Serializes appends and tracks the stream's current DB so a selector
    /// record is injected whenever the target DB changes.
    cursor: Mutex<SinkCursor>,
}

#[derive(Debug, Default)]
struct SinkCursor {
    last_db: Option<usize>,
}

impl PropagationSink {
    /// Creates a new `PropagationSink` and returns the receiver for the AOF task.
    pub fn new(aof_enabled: bool) -> (Self, Option<mpsc::Receiver<PropagatedRecord>>) {
        let (replication_sender, _) = broadcast::channel(BROADCAST_BUS_CAPACITY);

        let (aof_sender, aof_receiver) = if aof_enabled {
            let (tx, rx) = mpsc::channel(AOF_CHANNEL_CAPACITY);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let sink = Self {
            replication_sender,
            aof_sender,
            cursor: Mutex::new(SinkCursor::default()),
        };

        (sink, aof_receiver)
    }

    /// Appends a single record.
    pub fn publish(&self, record: PropagatedRecord, state: &ServerState) {
        self.publish_batch(vec![record], state);
    }

    /// Appends a run of records as one unit. The cursor lock is held for the
    /// whole run, so no other session's records can land in the middle.
    pub fn publish_batch(&self, records: Vec<PropagatedRecord>, state: &ServerState) {
        if records.is_empty() {
            return;
        }
        let mut cursor = self.cursor.lock();
        for record in records {
            if cursor.last_db != Some(record.db_index) {
                cursor.last_db = Some(record.db_index);
                self.deliver(PropagatedRecord::select_for(record.db_index), state);
            }
            self.deliver(record, state);
        }
    }

    fn deliver(&self, record: PropagatedRecord, state: &ServerState) {
        if record.targets.contains(SinkTargets::REPL) {
            state.replication.backlog.feed(&record.encode_to_vec());
            // It's okay if there are no active replication subscribers.
            if self.replication_sender.send(record.clone()).is_err() {
                debug!("Published a record with no active replication subscribers.");
            }
        }

        if record.targets.contains(SinkTargets::AOF)
            && let Some(sender) = &self.aof_sender
        {
            match sender.try_send(record) {
                Ok(_) => {}
                Err(TrySendError::Full(_)) => {
                    error!("AOF channel is full. Persistence is lagging behind writes.");
                    state.is_emergency_read_only.store(true, Ordering::Relaxed);
                }
                Err(TrySendError::Closed(_)) => {
                    error!("AOF channel is closed. Persistence has stopped.");
                    state.is_emergency_read_only.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    /// Provides a new receiver for a replication task to subscribe to updates.
    pub fn subscribe_for_replication(&self) -> broadcast::Receiver<PropagatedRecord> {
        self.replication_sender.subscribe()
    }

    /// Checks if the AOF channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.aof_sender.as_ref().is_some_and(|s| s.is_closed())
    }
}
