// src/core/slowlog.rs

//! The slow-query log: a bounded, head-inserted list of commands whose
//! measured execution time crossed the configured threshold.

use crate::core::state::client::ClientHandle;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// At most this many argument slots are retained per entry. When a command
/// has more, the final slot summarizes the overflow.
pub const SLOWLOG_MAX_RETAINED_ARGS: usize = 32;

/// Retained string arguments longer than this are cut and suffixed with a
/// byte-count marker.
pub const SLOWLOG_MAX_ARG_LEN: usize = 128;

/// A single retained slow execution.
#[derive(Debug, Clone)]
pub struct SlowLogEntry {
    /// Server-wide, strictly increasing id.
    pub id: u64,
    /// Wall-clock time the command finished, in Unix seconds.
    pub unix_time_secs: u64,
    /// Measured execution time.
    pub duration_micros: u64,
    /// The (truncated) argument vector, command name first.
    pub argv: Vec<Bytes>,
    /// Peer identifier of the issuing session, as `address:port`.
    pub peer_addr: String,
    /// Client name at observation time; empty if never set.
    pub client_name: Bytes,
}

/// The slow log proper. Entries are inserted at the head and evicted from the
/// tail, so iteration order is newest-first.
///
/// The threshold and retention bound mirror the `slowlog-log-slower-than` and
/// `slowlog-max-len` configuration options; they are kept in atomics here so
/// the per-command observation path never takes the config lock.
#[derive(Debug)]
pub struct SlowLog {
    entries: Mutex<VecDeque<SlowLogEntry>>,
    next_id: AtomicU64,
    threshold_micros: AtomicI64,
    max_len: AtomicUsize,
}

impl SlowLog {
    pub fn new(threshold_micros: i64, max_len: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(0),
            threshold_micros: AtomicI64::new(threshold_micros),
            max_len: AtomicUsize::new(max_len),
        }
    }

    /// Offers one executed command to the log. A negative threshold disables
    /// logging entirely; otherwise the command is retained iff its duration
    /// reached the threshold.
    pub fn observe(&self, handle: &ClientHandle, argv: &[Bytes], duration: Duration) {
        let threshold = self.threshold_micros.load(Ordering::Relaxed);
        if threshold < 0 {
            return;
        }
        let duration_micros = duration.as_micros() as u64;
        if duration_micros < threshold as u64 {
            return;
        }

        let entry = SlowLogEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            unix_time_secs: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            duration_micros,
            argv: truncate_argv(argv),
            peer_addr: handle.addr.clone(),
            client_name: handle.name(),
        };

        let max_len = self.max_len.load(Ordering::Relaxed);
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        while entries.len() > max_len {
            entries.pop_back();
        }
    }

    /// Up to `count` entries from the head (newest first).
    pub fn get(&self, count: usize) -> Vec<SlowLogEntry> {
        self.entries.lock().iter().take(count).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn reset(&self) {
        let mut entries = self.entries.lock();
        while entries.pop_front().is_some() {}
    }

    pub fn threshold_micros(&self) -> i64 {
        self.threshold_micros.load(Ordering::Relaxed)
    }

    pub fn set_threshold_micros(&self, threshold: i64) {
        self.threshold_micros.store(threshold, Ordering::Relaxed);
    }

    pub fn max_len(&self) -> usize {
        self.max_len.load(Ordering::Relaxed)
    }

    /// Updates the retention bound and trims immediately if it shrank.
    pub fn set_max_len(&self, max_len: usize) {
        self.max_len.store(max_len, Ordering::Relaxed);
        let mut entries = self.entries.lock();
        while entries.len() > max_len {
            entries.pop_back();
        }
    }
}

/// Applies the retention rules to an argument vector.
///
/// At most [`SLOWLOG_MAX_RETAINED_ARGS`] slots are kept; when the command has
/// more arguments, the last retained slot is replaced with
/// `"... (K more arguments)"` accounting for itself plus everything dropped.
/// Each retained argument longer than [`SLOWLOG_MAX_ARG_LEN`] bytes is cut at
/// that length and suffixed with `"... (K more bytes)"`.
///
/// Every retained argument is copied into a fresh buffer, so a later
/// asynchronous flush of the keyspace cannot race with slowlog readout.
fn truncate_argv(argv: &[Bytes]) -> Vec<Bytes> {
    let argc = argv.len();
    let mut retained = Vec::with_capacity(argc.min(SLOWLOG_MAX_RETAINED_ARGS));

    let (kept, summarized) = if argc > SLOWLOG_MAX_RETAINED_ARGS {
        (
            SLOWLOG_MAX_RETAINED_ARGS - 1,
            argc - SLOWLOG_MAX_RETAINED_ARGS + 1,
        )
    } else {
        (argc, 0)
    };

    for arg in &argv[..kept] {
        retained.push(truncate_arg(arg));
    }
    if summarized > 0 {
        retained.push(Bytes::from(format!("... ({summarized} more arguments)")));
    }
    retained
}

fn truncate_arg(arg: &Bytes) -> Bytes {
    if arg.len() > SLOWLOG_MAX_ARG_LEN {
        let mut cut = arg[..SLOWLOG_MAX_ARG_LEN].to_vec();
        cut.extend_from_slice(format!("... ({} more bytes)", arg.len() - SLOWLOG_MAX_ARG_LEN).as_bytes());
        Bytes::from(cut)
    } else {
        Bytes::copy_from_slice(arg)
    }
}
