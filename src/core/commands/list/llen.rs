// src/core/commands/list/llen.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct LLen {
    pub key: Bytes,
}

impl ParseCommand for LLen {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 1 {
            return Err(ZirconDBError::WrongArgumentCount("LLEN".to_string()));
        }
        Ok(LLen {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for LLen {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        let len = match keyspace.lookup_read(&self.key) {
            Some(value) => match &value.data {
                DataValue::List(items) => items.len(),
                _ => return Err(ZirconDBError::WrongType),
            },
            None => 0,
        };
        Ok((RespValue::Integer(len as i64), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for LLen {
    fn name(&self) -> &'static str {
        "llen"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY | CommandFlags::FAST
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
}
