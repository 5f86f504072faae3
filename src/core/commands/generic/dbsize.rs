// src/core/commands/generic/dbsize.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::protocol::RespFrame;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct DbSize;

impl ParseCommand for DbSize {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if !args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("DBSIZE".to_string()));
        }
        Ok(DbSize)
    }
}

#[async_trait]
impl ExecutableCommand for DbSize {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        Ok((
            RespValue::Integer(keyspace.key_count() as i64),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for DbSize {
    fn name(&self) -> &'static str {
        "dbsize"
    }
    fn arity(&self) -> i64 {
        1
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY | CommandFlags::FAST
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![]
    }
}
