// src/core/commands/generic/unwatch.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::protocol::RespFrame;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// `UNWATCH`. Outside a transaction the dispatcher routes this to the
/// transaction handler, which releases the session's watches. Inside a
/// transaction it is queued like any other command; by the time the queue
/// runs, `EXEC` has already unwatched everything, so executing it is a no-op
/// that still replies `+OK`.
#[derive(Debug, Clone, Default)]
pub struct Unwatch;

impl ParseCommand for Unwatch {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if !args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("UNWATCH".to_string()));
        }
        Ok(Unwatch)
    }
}

#[async_trait]
impl ExecutableCommand for Unwatch {
    async fn execute<'a>(
        &self,
        _ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        Ok((RespValue::ok(), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Unwatch {
    fn name(&self) -> &'static str {
        "unwatch"
    }
    fn arity(&self) -> i64 {
        1
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::NO_PROPAGATE | CommandFlags::FAST
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![]
    }
}
