// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests.

use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use zircondb::config::Config;
use zircondb::connection::SessionState;
use zircondb::core::RespValue;
use zircondb::core::ZirconDBError;
use zircondb::core::events::PropagatedRecord;
use zircondb::core::handler::Router;
use zircondb::core::protocol::RespFrame;
use zircondb::core::state::ServerState;

static NEXT_PORT: AtomicU16 = AtomicU16::new(40000);

/// TestContext provides a complete test environment with a real server state,
/// driven through the dispatcher exactly like a connection would.
pub struct TestContext {
    pub state: Arc<ServerState>,
    /// Receives AOF-bound records when the config enables AOF.
    pub aof_rx: Option<mpsc::Receiver<PropagatedRecord>>,
}

impl TestContext {
    /// Creates a new test context with default configuration.
    pub async fn new() -> Self {
        let mut config = Config::default();
        config.databases = 4; // Fewer databases for tests
        Self::with_config(config).await
    }

    /// Creates a new test context with custom configuration.
    pub async fn with_config(config: Config) -> Self {
        // Set up minimal tracing for tests (ignore error if already initialized).
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new("warn"))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();

        let server_init =
            ServerState::initialize(config).expect("Failed to initialize server state");

        Self {
            state: server_init.state,
            aof_rx: server_init.aof_event_rx,
        }
    }

    /// Opens a new client session against this server.
    pub fn session(&self) -> SessionState {
        let port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);
        let handle = self.state.register_client(format!("127.0.0.1:{port}"));
        SessionState::new(handle)
    }

    /// Dispatches one command (given as string parts) on a session.
    pub async fn dispatch(
        &self,
        session: &mut SessionState,
        parts: &[&str],
    ) -> Result<RespValue, ZirconDBError> {
        let frames: Vec<RespFrame> = parts
            .iter()
            .map(|p| RespFrame::BulkString(Bytes::from(p.to_string())))
            .collect();
        Router::new(self.state.clone(), session).dispatch(frames).await
    }

    /// Dispatch helper asserting the command does not error.
    pub async fn run(&self, session: &mut SessionState, parts: &[&str]) -> RespValue {
        self.dispatch(session, parts)
            .await
            .unwrap_or_else(|e| panic!("command {parts:?} failed: {e}"))
    }

    /// Asserts the command errors and returns the error's display string.
    pub async fn run_err(&self, session: &mut SessionState, parts: &[&str]) -> String {
        match self.dispatch(session, parts).await {
            Ok(v) => panic!("command {parts:?} unexpectedly succeeded: {v:?}"),
            Err(e) => e.to_string(),
        }
    }
}

/// Shorthand for a bulk-string reply.
pub fn bulk(s: &str) -> RespValue {
    RespValue::BulkString(Bytes::from(s.to_string()))
}

/// Shorthand for the `+OK` reply.
pub fn ok() -> RespValue {
    RespValue::SimpleString("OK".into())
}

/// Shorthand for the `+QUEUED` reply.
pub fn queued() -> RespValue {
    RespValue::SimpleString("QUEUED".into())
}
