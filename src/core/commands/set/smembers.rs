// src/core/commands/set/smembers.rs

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
pub struct SMembers {
    pub key: Bytes,
}

impl ParseCommand for SMembers {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 1 {
            return Err(ZirconDBError::WrongArgumentCount("SMEMBERS".to_string()));
        }
        Ok(SMembers {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for SMembers {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        let members = match keyspace.lookup_read(&self.key) {
            Some(value) => match &value.data {
                DataValue::Set(members) => members
                    .iter()
                    .cloned()
                    .map(RespValue::BulkString)
                    .collect(),
                _ => return Err(ZirconDBError::WrongType),
            },
            None => vec![],
        };
        Ok((RespValue::Array(members), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for SMembers {
    fn name(&self) -> &'static str {
        "smembers"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
}
