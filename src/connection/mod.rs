// src/connection/mod.rs

pub mod session;

pub use session::{QueuedCommand, SessionState, WatchedKey};
