// src/core/handler/transaction_handler.rs

//! Manages the logic for transactions: command queuing, optimistic
//! concurrency with `WATCH`, and atomic execution on `EXEC`.

use crate::connection::session::{QueuedCommand, SessionState, WatchedKey};
use crate::core::commands::command_trait::{CommandExt, CommandFlags, WriteOutcome};
use crate::core::events::PropagatedRecord;
use crate::core::protocol::RespFrame;
use crate::core::state::ServerState;
use crate::core::state::client::SessionFlags;
use crate::core::storage::db::{ExecutionContext, ExecutionLocks, Keyspace};
use crate::core::{Command, RespValue, ZirconDBError};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::MutexGuard;
use tracing::debug;

/// Handles the business logic for a transaction for a single client session.
pub struct TransactionHandler<'a> {
    state: Arc<ServerState>,
    session: &'a mut SessionState,
}

impl<'a> TransactionHandler<'a> {
    pub fn new(state: Arc<ServerState>, session: &'a mut SessionState) -> Self {
        Self { state, session }
    }

    /// Handles the `MULTI` command, starting a new transaction for the session.
    ///
    /// Watches taken before `MULTI` stay in force, and so does an already-set
    /// `DIRTY_CAS`: the optimistic check spans from `WATCH` to `EXEC`.
    pub fn handle_multi(&mut self) -> Result<RespValue, ZirconDBError> {
        let handle = &self.session.handle;
        if handle.has_flag(SessionFlags::IN_TX) {
            return Err(ZirconDBError::InvalidState(
                "MULTI calls can not be nested".to_string(),
            ));
        }
        self.session.tx_queue.clear();
        self.session.tx_flags = CommandFlags::empty();
        handle.clear_flags(SessionFlags::DIRTY_EXEC);
        handle.set_flag(SessionFlags::IN_TX);
        debug!("Session {}: Started transaction.", handle.session_id);
        Ok(RespValue::ok())
    }

    /// Queues a command after `MULTI`. The dispatcher has already validated
    /// arity and diverted the transaction-control commands; everything else
    /// queues, including session-level commands like `SELECT`, which
    /// `handle_exec` applies mid-batch.
    pub fn handle_queueing(&mut self, command: Command) -> Result<RespValue, ZirconDBError> {
        let handle = &self.session.handle;
        if !handle.has_flag(SessionFlags::IN_TX) {
            return Err(ZirconDBError::InvalidState(
                "Command queued without MULTI".to_string(),
            ));
        }

        let flags = command.get_flags();
        if flags.contains(CommandFlags::TRANSACTION) {
            handle.set_flag(SessionFlags::DIRTY_EXEC);
            return Err(ZirconDBError::InvalidState(format!(
                "Command '{}' cannot be used in a transaction",
                command.name()
            )));
        }

        self.session.tx_flags |= flags;
        self.session.tx_queue.push(QueuedCommand { command, flags });
        debug!("Session {}: Queued command.", handle.session_id);
        Ok(RespValue::SimpleString("QUEUED".into()))
    }

    /// Marks the open transaction as poisoned after a validation failure.
    /// The failing command still gets its own error reply; later valid
    /// commands continue to queue, and the eventual `EXEC` aborts.
    pub fn mark_dirty_exec(&mut self) {
        if self.session.handle.has_flag(SessionFlags::IN_TX) {
            self.session.handle.set_flag(SessionFlags::DIRTY_EXEC);
        }
    }

    /// Handles the `WATCH` command, registering keys for optimistic tracking
    /// in the session's current database.
    pub async fn handle_watch(&mut self, keys: Vec<Bytes>) -> Result<RespValue, ZirconDBError> {
        if self.session.handle.has_flag(SessionFlags::IN_TX) {
            return Err(ZirconDBError::InvalidState(
                "WATCH inside MULTI is not allowed".to_string(),
            ));
        }
        let db_index = self.session.current_db_index;
        let db = self
            .state
            .get_db(db_index)
            .ok_or(ZirconDBError::InvalidDbIndex)?;
        let mut keyspace = db.lock().await;
        for key in keys {
            if self.session.is_watching(db_index, &key) {
                continue;
            }
            // One reference goes into the keyspace's watcher list, the mirror
            // entry into the session's own list.
            if keyspace.watch_key(key.clone(), &self.session.handle) {
                self.session.watched.push(WatchedKey { db_index, key });
            }
        }
        Ok(RespValue::ok())
    }

    /// Handles the `UNWATCH` command. Releases every watch but leaves
    /// `DIRTY_CAS` as it is: a modification observed before the unwatch still
    /// fails the eventual `EXEC`.
    pub async fn handle_unwatch(&mut self) -> Result<RespValue, ZirconDBError> {
        self.unwatch_all().await;
        Ok(RespValue::ok())
    }

    /// Handles the `DISCARD` command, aborting the transaction.
    pub async fn handle_discard(&mut self) -> Result<RespValue, ZirconDBError> {
        if !self.session.handle.has_flag(SessionFlags::IN_TX) {
            return Err(ZirconDBError::InvalidState(
                "DISCARD without MULTI".to_string(),
            ));
        }
        self.unwatch_all().await;
        self.clear_transaction_state();
        debug!(
            "Session {}: Discarded transaction.",
            self.session.handle.session_id
        );
        Ok(RespValue::ok())
    }

    /// Handles the `RESET` command: back to a pristine session without
    /// dropping the connection.
    pub async fn handle_reset(&mut self) -> Result<RespValue, ZirconDBError> {
        self.unwatch_all().await;
        self.clear_transaction_state();
        self.session.current_db_index = 0;
        self.session.monitor_rx = None;
        self.session.handle.clear_flags(SessionFlags::MONITOR);
        self.state
            .monitors
            .unregister(self.session.handle.session_id);
        Ok(RespValue::SimpleString("RESET".into()))
    }

    /// Handles the `EXEC` command, attempting to execute the queued commands
    /// atomically.
    pub async fn handle_exec(&mut self) -> Result<RespValue, ZirconDBError> {
        let state = Arc::clone(&self.state);
        let handle = Arc::clone(&self.session.handle);

        if !handle.has_flag(SessionFlags::IN_TX) {
            return Err(ZirconDBError::InvalidState(
                "EXEC without MULTI".to_string(),
            ));
        }

        let current_db = state
            .get_db(self.session.current_db_index)
            .ok_or(ZirconDBError::InvalidDbIndex)?;

        // Acquire the guard of the current DB plus every watched DB, in
        // ascending index order. A queued FLUSHALL needs every keyspace, and
        // a queued SELECT moves the rest of the batch onto its target DB.
        let mut db_indices: BTreeSet<usize> = BTreeSet::new();
        db_indices.insert(current_db.index);
        for watched in &self.session.watched {
            db_indices.insert(watched.db_index);
        }
        for queued in &self.session.tx_queue {
            match &queued.command {
                Command::FlushAll(_) => db_indices.extend(0..state.dbs.len()),
                Command::Select(cmd) if cmd.db_index < state.dbs.len() => {
                    db_indices.insert(cmd.db_index);
                }
                _ => {}
            }
        }
        let mut guards: BTreeMap<usize, MutexGuard<'_, Keyspace>> = BTreeMap::new();
        for index in &db_indices {
            guards.insert(*index, state.dbs[*index].lock().await);
        }

        // Abort conditions, in order: poisoned queue, failed optimistic
        // check, write batch on a read-only replica.
        if handle.has_flag(SessionFlags::DIRTY_EXEC) {
            Self::unwatch_with_guards(self.session, &mut guards);
            self.clear_transaction_state();
            return Err(ZirconDBError::ExecAborted);
        }

        if handle.has_flag(SessionFlags::DIRTY_CAS) {
            Self::unwatch_with_guards(self.session, &mut guards);
            self.clear_transaction_state();
            // Not an error: a null array is the distinguishable
            // success-shaped reply for an optimistic-concurrency failure.
            return Ok(RespValue::NullArray);
        }

        let replica_read_only = { state.config.lock().await.replication.replica_read_only };
        if state.replication.is_replica()
            && replica_read_only
            && !handle.has_flag(SessionFlags::IS_MASTER)
            && self.session.tx_flags.contains(CommandFlags::WRITE)
        {
            Self::unwatch_with_guards(self.session, &mut guards);
            self.clear_transaction_state();
            return Err(ZirconDBError::ReadOnly(
                "You can't write against a read only replica.".to_string(),
            ));
        }

        // Release the CAS tracking before running the batch; our own writes
        // must not poison us.
        Self::unwatch_with_guards(self.session, &mut guards);

        let queue = std::mem::take(&mut self.session.tx_queue);
        let was_replica = state.replication.is_replica();
        let role_epoch = state.replication.role_epoch();

        // A queued SELECT moves subsequent commands onto another database.
        let mut active_db = Arc::clone(&current_db);
        let mut responses = Vec::with_capacity(queue.len());
        let mut records: Vec<PropagatedRecord> = Vec::new();
        let mut must_propagate = false;
        let mut total_keys_changed = 0u64;
        let mut has_flush = false;

        for queued in &queue {
            let argv = queued.command.to_propagation_argv();

            if state.monitors.has_monitors()
                && !queued.flags.contains(CommandFlags::SKIP_MONITOR)
            {
                state.monitors.feed(active_db.index, &handle.addr, &argv);
            }

            // The synthetic MULTI goes out once, before the first command
            // that is neither read-only nor administrative.
            if !must_propagate
                && queued.flags.contains(CommandFlags::WRITE)
                && !queued.flags.contains(CommandFlags::NO_PROPAGATE)
            {
                records.push(PropagatedRecord::new(
                    active_db.index,
                    vec![Bytes::from_static(b"MULTI")],
                ));
                must_propagate = true;
            }

            let start = Instant::now();
            // Session-level commands are applied here, where the session is
            // in reach; everything else runs through the generic path.
            let result = match &queued.command {
                Command::Select(cmd) => match state.get_db(cmd.db_index) {
                    Some(db) => {
                        active_db = db;
                        self.session.current_db_index = cmd.db_index;
                        Ok((RespValue::ok(), WriteOutcome::DidNotWrite))
                    }
                    None => Err(ZirconDBError::InvalidDbIndex),
                },
                Command::Monitor => {
                    let receiver = state.monitors.register(handle.session_id);
                    self.session.monitor_rx = Some(receiver);
                    handle.set_flag(SessionFlags::MONITOR);
                    Ok((RespValue::ok(), WriteOutcome::DidNotWrite))
                }
                command => {
                    let mut ctx = ExecutionContext {
                        state: Arc::clone(&state),
                        locks: ExecutionLocks::Multi {
                            guards: std::mem::take(&mut guards),
                        },
                        db: Arc::clone(&active_db),
                        session_id: handle.session_id,
                    };
                    let result = command.execute(&mut ctx).await;
                    guards = match ctx.locks {
                        ExecutionLocks::Multi { guards } => guards,
                        _ => unreachable!("locks must stay Multi during transaction execution"),
                    };
                    result
                }
            };

            match result {
                Ok((resp, outcome)) => {
                    if outcome != WriteOutcome::DidNotWrite
                        && !queued.flags.contains(CommandFlags::NO_PROPAGATE)
                    {
                        records.push(PropagatedRecord::new(active_db.index, argv.clone()));
                        if outcome == WriteOutcome::Flush {
                            has_flush = true;
                        } else {
                            total_keys_changed += outcome.keys_changed();
                        }
                    }
                    responses.push(resp);
                }
                // A runtime failure is reported inline; the batch continues.
                Err(e) => responses.push(RespValue::Error(e.to_string())),
            }

            state.slowlog.observe(&handle, &argv, start.elapsed());
        }

        if must_propagate {
            records.push(PropagatedRecord::new(
                active_db.index,
                vec![Bytes::from_static(b"EXEC")],
            ));
            if has_flush {
                state.persistence.reset_dirty_keys();
            } else {
                state.persistence.increment_dirty_keys(total_keys_changed);
            }
        }
        if !records.is_empty() {
            // Published while the keyspace guards are still held, so the
            // MULTI..EXEC bracket lands contiguously on every downstream.
            state.sink.publish_batch(records, &state);
        }

        // A primary demoted while the batch ran has already stopped its
        // normal propagation duties; terminate the open bracket in the
        // backlog so downstream replicas never see a dangling MULTI.
        if must_propagate
            && !was_replica
            && state.replication.role_epoch() != role_epoch
            && state.replication.is_replica()
        {
            let exec_marker =
                RespFrame::from_argv(&[Bytes::from_static(b"EXEC")]).encode_to_vec();
            state.replication.backlog.feed(&exec_marker);
        }

        drop(guards);
        self.clear_transaction_state();

        // The EXEC itself was skipped by the dispatcher's monitor hook;
        // replay it now so monitors see it after the batch it closed.
        if state.monitors.has_monitors() {
            state
                .monitors
                .feed(active_db.index, &handle.addr, &[Bytes::from_static(b"EXEC")]);
        }

        Ok(RespValue::Array(responses))
    }

    /// Removes every watch this session holds, taking each DB guard in turn.
    /// `DIRTY_CAS` is deliberately left alone.
    pub async fn unwatch_all(&mut self) {
        let watched = std::mem::take(&mut self.session.watched);
        if watched.is_empty() {
            return;
        }
        let mut by_db: BTreeMap<usize, Vec<Bytes>> = BTreeMap::new();
        for entry in watched {
            by_db.entry(entry.db_index).or_default().push(entry.key);
        }
        let session_id = self.session.handle.session_id;
        for (db_index, keys) in by_db {
            if let Some(db) = self.state.get_db(db_index) {
                let mut keyspace = db.lock().await;
                for key in keys {
                    keyspace.unwatch_key(&key, session_id);
                }
            }
        }
    }

    /// Same as [`unwatch_all`], for callers already holding the guards.
    ///
    /// [`unwatch_all`]: TransactionHandler::unwatch_all
    fn unwatch_with_guards(
        session: &mut SessionState,
        guards: &mut BTreeMap<usize, MutexGuard<'_, Keyspace>>,
    ) {
        let watched = std::mem::take(&mut session.watched);
        for entry in watched {
            if let Some(guard) = guards.get_mut(&entry.db_index) {
                guard.unwatch_key(&entry.key, session.handle.session_id);
            }
        }
    }

    fn clear_transaction_state(&mut self) {
        self.session.tx_queue.clear();
        self.session.tx_flags = CommandFlags::empty();
        self.session.handle.clear_flags(
            SessionFlags::IN_TX | SessionFlags::DIRTY_CAS | SessionFlags::DIRTY_EXEC,
        );
    }
}

/// Tears down a closing session: releases watches, drops any open
/// transaction, and removes the session from the registry. Equivalent to an
/// implicit `DISCARD` on disconnect.
pub async fn dissolve_session(state: &Arc<ServerState>, session: &mut SessionState) {
    let mut handler = TransactionHandler::new(Arc::clone(state), session);
    handler.unwatch_all().await;
    handler.clear_transaction_state();
    state.unregister_client(session.handle.session_id);
}
