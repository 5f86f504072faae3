// src/core/commands/zset/zscore.rs

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
pub struct ZScore {
    pub key: Bytes,
    pub member: Bytes,
}

impl ParseCommand for ZScore {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 2 {
            return Err(ZirconDBError::WrongArgumentCount("ZSCORE".to_string()));
        }
        Ok(ZScore {
            key: extract_bytes(&args[0])?,
            member: extract_bytes(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZScore {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        let reply = match keyspace.lookup_read(&self.key) {
            Some(value) => match &value.data {
                DataValue::SortedSet(zset) => zset
                    .score(&self.member)
                    .map_or(RespValue::Null, |score| {
                        RespValue::BulkString(Bytes::from(score.to_string()))
                    }),
                _ => return Err(ZirconDBError::WrongType),
            },
            None => RespValue::Null,
        };
        Ok((reply, WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for ZScore {
    fn name(&self) -> &'static str {
        "zscore"
    }
    fn arity(&self) -> i64 {
        3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY | CommandFlags::FAST
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.key.clone(), self.member.clone()]
    }
}
