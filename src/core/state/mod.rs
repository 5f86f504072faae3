// src/core/state/mod.rs

//! Server-wide shared state.

pub mod client;
pub mod core;
pub mod persistence;
pub mod replication;
pub mod stats;

pub use core::{ServerInit, ServerState};
