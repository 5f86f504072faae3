// src/core/commands/generic/select.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_i64;
use crate::core::protocol::RespFrame;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// `SELECT` switches the session's current database. The switch itself is
/// performed by the dispatcher (or by the transaction engine when queued in a
/// batch), since those own the session state; this struct only carries the
/// parsed index.
#[derive(Debug, Clone, Default)]
pub struct Select {
    pub db_index: usize,
}

impl ParseCommand for Select {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 1 {
            return Err(ZirconDBError::WrongArgumentCount("SELECT".to_string()));
        }
        let index = extract_i64(&args[0])?;
        if index < 0 {
            return Err(ZirconDBError::InvalidDbIndex);
        }
        Ok(Select {
            db_index: index as usize,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Select {
    async fn execute<'a>(
        &self,
        _ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        Err(ZirconDBError::Internal(
            "'select' must be handled by the dispatcher".into(),
        ))
    }
}

impl CommandSpec for Select {
    fn name(&self) -> &'static str {
        "select"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::NO_PROPAGATE | CommandFlags::FAST
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![Bytes::from(self.db_index.to_string())]
    }
}
