// src/core/monitor.rs

//! The monitor feed: fans every dispatched command out to sessions that have
//! entered monitor mode.

use bytes::Bytes;
use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

/// Registered monitor sessions, keyed by session id. Senders that have gone
/// away are pruned on the next feed.
#[derive(Debug, Default)]
pub struct MonitorFeed {
    monitors: DashMap<u64, mpsc::UnboundedSender<String>>,
}

impl MonitorFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a session into monitor mode, returning its feed receiver.
    pub fn register(&self, session_id: u64) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.monitors.insert(session_id, tx);
        rx
    }

    pub fn unregister(&self, session_id: u64) {
        self.monitors.remove(&session_id);
    }

    pub fn has_monitors(&self) -> bool {
        !self.monitors.is_empty()
    }

    /// Formats one dispatched command and sends it to every monitor.
    pub fn feed(&self, db_index: usize, peer_addr: &str, argv: &[Bytes]) {
        if self.monitors.is_empty() {
            return;
        }
        let line = format_monitor_line(db_index, peer_addr, argv);
        self.monitors
            .retain(|_, sender| sender.send(line.clone()).is_ok());
    }
}

fn format_monitor_line(db_index: usize, peer_addr: &str, argv: &[Bytes]) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let mut line = format!(
        "{}.{:06} [{} {}]",
        now.as_secs(),
        now.subsec_micros(),
        db_index,
        peer_addr
    );
    for arg in argv {
        line.push(' ');
        line.push('"');
        for &byte in arg.iter() {
            match byte {
                b'"' | b'\\' => {
                    line.push('\\');
                    line.push(byte as char);
                }
                b'\n' => line.push_str("\\n"),
                b'\r' => line.push_str("\\r"),
                0x20..=0x7e => line.push(byte as char),
                _ => line.push_str(&format!("\\x{byte:02x}")),
            }
        }
        line.push('"');
    }
    line
}
