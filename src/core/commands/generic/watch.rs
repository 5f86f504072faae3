// src/core/commands/generic/watch.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// `WATCH key [key ...]`. The actual registration happens in the transaction
/// handler, which owns the session's watched-key list.
#[derive(Debug, Clone, Default)]
pub struct Watch {
    pub keys: Vec<Bytes>,
}

impl ParseCommand for Watch {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("WATCH".to_string()));
        }
        Ok(Watch {
            keys: args
                .iter()
                .map(extract_bytes)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Watch {
    async fn execute<'a>(
        &self,
        _ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        Err(ZirconDBError::Internal(
            "'watch' must be handled by the dispatcher".into(),
        ))
    }
}

impl CommandSpec for Watch {
    fn name(&self) -> &'static str {
        "watch"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::TRANSACTION | CommandFlags::NO_PROPAGATE | CommandFlags::FAST
    }
    fn get_keys(&self) -> Vec<Bytes> {
        self.keys.clone()
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        self.keys.clone()
    }
}
