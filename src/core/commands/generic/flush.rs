// src/core/commands/generic/flush.rs

//! `FLUSHDB` and `FLUSHALL`.
//!
//! `FLUSHALL` needs every keyspace guard; the dispatcher acquires them all for
//! it, and the transaction engine widens its lock set when a `FLUSHALL` is
//! queued in a batch.

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::protocol::RespFrame;
use crate::core::storage::db::{ExecutionContext, ExecutionLocks};
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct FlushDb;

impl ParseCommand for FlushDb {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if !args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("FLUSHDB".to_string()));
        }
        Ok(FlushDb)
    }
}

#[async_trait]
impl ExecutableCommand for FlushDb {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        keyspace.clear();
        Ok((RespValue::ok(), WriteOutcome::Flush))
    }
}

impl CommandSpec for FlushDb {
    fn name(&self) -> &'static str {
        "flushdb"
    }
    fn arity(&self) -> i64 {
        1
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![]
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlushAll;

impl ParseCommand for FlushAll {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if !args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("FLUSHALL".to_string()));
        }
        Ok(FlushAll)
    }
}

#[async_trait]
impl ExecutableCommand for FlushAll {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        match &mut ctx.locks {
            ExecutionLocks::All { guards } => {
                for guard in guards.iter_mut() {
                    guard.clear();
                }
            }
            ExecutionLocks::Multi { guards } => {
                for guard in guards.values_mut() {
                    guard.clear();
                }
            }
            ExecutionLocks::Single { guard } => {
                guard.clear();
            }
            ExecutionLocks::None => {
                return Err(ZirconDBError::Internal(
                    "flushall executed without keyspace guards".into(),
                ));
            }
        }
        Ok((RespValue::ok(), WriteOutcome::Flush))
    }
}

impl CommandSpec for FlushAll {
    fn name(&self) -> &'static str {
        "flushall"
    }
    fn arity(&self) -> i64 {
        1
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![]
    }
}
