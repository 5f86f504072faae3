// src/core/handler/command_router.rs

//! The central component for routing parsed commands to their appropriate handlers.
//!
//! The `Router` receives a raw argument vector from the connection layer and
//! subjects it to registry lookup, arity validation, and transaction routing
//! before dispatching it for execution. It also owns the cross-cutting hooks:
//! wall-clock measurement for the slow log, the monitor feed, and the hand-off
//! of executed writes to the propagation sink.

use super::transaction_handler::TransactionHandler;
use crate::connection::session::SessionState;
use crate::core::commands::command_trait::{CommandExt, CommandFlags, WriteOutcome};
use crate::core::commands::{helpers, registry};
use crate::core::events::PropagatedRecord;
use crate::core::protocol::RespFrame;
use crate::core::state::ServerState;
use crate::core::state::client::SessionFlags;
use crate::core::storage::db::{ExecutionContext, ExecutionLocks};
use crate::core::{Command, RespValue, ZirconDBError};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::debug;

/// Command names the dispatcher must handle itself while a transaction is
/// open; everything else gets queued.
const TX_CONTROL_COMMANDS: &[&str] = &["exec", "discard", "multi", "watch", "reset"];

/// The `Router` receives one client request and directs it through the
/// processing pipeline.
pub struct Router<'a> {
    state: Arc<ServerState>,
    session: &'a mut SessionState,
}

impl<'a> Router<'a> {
    pub fn new(state: Arc<ServerState>, session: &'a mut SessionState) -> Self {
        Self { state, session }
    }

    /// Entry point for a request already framed as a RESP array.
    pub async fn dispatch_frame(&mut self, frame: RespFrame) -> Result<RespValue, ZirconDBError> {
        let RespFrame::Array(parts) = frame else {
            return Err(ZirconDBError::ProtocolError(
                "expected an array of bulk strings".into(),
            ));
        };
        self.dispatch(parts).await
    }

    /// The main dispatch pipeline: lookup, arity check, queue-or-execute.
    pub async fn dispatch(&mut self, parts: Vec<RespFrame>) -> Result<RespValue, ZirconDBError> {
        let Some((name_frame, args)) = parts.split_first() else {
            return Err(ZirconDBError::ProtocolError("empty command".into()));
        };
        let raw_name = helpers::extract_string(name_frame)?;
        let name = raw_name.to_ascii_lowercase();
        let argv: Vec<Bytes> = parts
            .iter()
            .map(helpers::extract_bytes)
            .collect::<Result<Vec<_>, _>>()?;

        let in_tx = self.session.handle.has_flag(SessionFlags::IN_TX);

        // Registry lookup and arity validation happen before queuing; a
        // malformed command inside a transaction poisons the eventual EXEC
        // but later well-formed commands still queue.
        let Some(descriptor) = registry::lookup(&name) else {
            if in_tx {
                TransactionHandler::new(Arc::clone(&self.state), self.session).mark_dirty_exec();
            }
            return Err(ZirconDBError::UnknownCommand(raw_name));
        };
        if !descriptor.arity_matches(parts.len()) {
            if in_tx {
                TransactionHandler::new(Arc::clone(&self.state), self.session).mark_dirty_exec();
            }
            return Err(ZirconDBError::WrongArgumentCount(
                name.to_ascii_uppercase(),
            ));
        }

        if in_tx && !TX_CONTROL_COMMANDS.contains(&name.as_str()) {
            let command = match Command::from_parts(&name, args) {
                Ok(command) => command,
                Err(e) => {
                    TransactionHandler::new(Arc::clone(&self.state), self.session)
                        .mark_dirty_exec();
                    return Err(e);
                }
            };
            self.feed_monitors(descriptor.flags, &argv);
            return TransactionHandler::new(Arc::clone(&self.state), self.session)
                .handle_queueing(command);
        }

        let command = Command::from_parts(&name, args)?;

        if descriptor.flags.contains(CommandFlags::WRITE) {
            if self.state.is_emergency_read_only.load(Ordering::Relaxed) {
                return Err(ZirconDBError::ReadOnly(
                    "Server is in read-only mode due to a critical propagation failure."
                        .to_string(),
                ));
            }
            if self.state.replication.is_replica()
                && !self.session.handle.has_flag(SessionFlags::IS_MASTER)
            {
                let replica_read_only =
                    { self.state.config.lock().await.replication.replica_read_only };
                if replica_read_only {
                    return Err(ZirconDBError::ReadOnly(
                        "You can't write against a read only replica.".to_string(),
                    ));
                }
            }
        }

        self.state.stats.increment_total_commands();
        self.feed_monitors(descriptor.flags, &argv);

        let start = Instant::now();
        let result = self.route_command(command).await;
        let latency = start.elapsed();

        // The slow log is observational: the command has already completed,
        // successfully or not.
        self.state
            .slowlog
            .observe(&self.session.handle, &argv, latency);

        result
    }

    fn feed_monitors(&self, flags: CommandFlags, argv: &[Bytes]) {
        if self.state.monitors.has_monitors() && !flags.contains(CommandFlags::SKIP_MONITOR) {
            self.state.monitors.feed(
                self.session.current_db_index,
                &self.session.handle.addr,
                argv,
            );
        }
    }

    /// Routes transaction-control and session-level commands to their
    /// handlers; everything else goes through the generic execution path.
    async fn route_command(&mut self, command: Command) -> Result<RespValue, ZirconDBError> {
        match command {
            Command::Multi => {
                TransactionHandler::new(Arc::clone(&self.state), self.session).handle_multi()
            }
            Command::Exec => {
                TransactionHandler::new(Arc::clone(&self.state), self.session)
                    .handle_exec()
                    .await
            }
            Command::Discard => {
                TransactionHandler::new(Arc::clone(&self.state), self.session)
                    .handle_discard()
                    .await
            }
            Command::Watch(cmd) => {
                TransactionHandler::new(Arc::clone(&self.state), self.session)
                    .handle_watch(cmd.keys)
                    .await
            }
            Command::Unwatch(_) => {
                TransactionHandler::new(Arc::clone(&self.state), self.session)
                    .handle_unwatch()
                    .await
            }
            Command::Reset => {
                TransactionHandler::new(Arc::clone(&self.state), self.session)
                    .handle_reset()
                    .await
            }
            Command::Select(cmd) => {
                if self.state.get_db(cmd.db_index).is_none() {
                    return Err(ZirconDBError::InvalidDbIndex);
                }
                self.session.current_db_index = cmd.db_index;
                debug!(
                    "Session {}: selected db {}.",
                    self.session.handle.session_id, cmd.db_index
                );
                Ok(RespValue::ok())
            }
            Command::Monitor => {
                let receiver = self
                    .state
                    .monitors
                    .register(self.session.handle.session_id);
                self.session.monitor_rx = Some(receiver);
                self.session.handle.set_flag(SessionFlags::MONITOR);
                Ok(RespValue::ok())
            }
            cmd => self.execute_command(cmd).await,
        }
    }

    /// Executes a standard command, updates the dirty counter, and hands the
    /// record to the propagation sink while the keyspace guards are still
    /// held, so stream order always matches execution order.
    async fn execute_command(&mut self, command: Command) -> Result<RespValue, ZirconDBError> {
        let state = Arc::clone(&self.state);
        let db = state
            .get_db(self.session.current_db_index)
            .ok_or(ZirconDBError::InvalidDbIndex)?;

        let locks = if matches!(command, Command::FlushAll(_)) {
            let mut guards = Vec::with_capacity(state.dbs.len());
            for other in &state.dbs {
                guards.push(other.lock().await);
            }
            ExecutionLocks::All { guards }
        } else {
            ExecutionLocks::Single {
                guard: db.lock().await,
            }
        };

        let mut ctx = ExecutionContext {
            state: Arc::clone(&state),
            locks,
            db: Arc::clone(&db),
            session_id: self.session.handle.session_id,
        };
        let (resp_value, write_outcome) = command.execute(&mut ctx).await?;

        if write_outcome != WriteOutcome::DidNotWrite {
            match write_outcome {
                WriteOutcome::Write { keys_modified } => {
                    state.persistence.increment_dirty_keys(keys_modified)
                }
                WriteOutcome::Delete { keys_deleted } => {
                    state.persistence.increment_dirty_keys(keys_deleted)
                }
                WriteOutcome::Flush => state.persistence.reset_dirty_keys(),
                WriteOutcome::DidNotWrite => {}
            }

            if !command.get_flags().contains(CommandFlags::NO_PROPAGATE) {
                state.sink.publish(
                    PropagatedRecord::new(db.index, command.to_propagation_argv()),
                    &state,
                );
            }
        }

        drop(ctx);
        Ok(resp_value)
    }
}
