// src/core/commands/generic/del.rs

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

#[derive(Debug, Clone, Default)]
pub struct Del {
    pub keys: Vec<Bytes>,
}

impl ParseCommand for Del {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("DEL".to_string()));
        }
        Ok(Del {
            keys: args
                .iter()
                .map(extract_bytes)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Del {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        let mut deleted = 0u64;
        for key in &self.keys {
            if keyspace.delete(key) {
                deleted += 1;
            }
        }
        let outcome = if deleted > 0 {
            WriteOutcome::Delete {
                keys_deleted: deleted,
            }
        } else {
            WriteOutcome::DidNotWrite
        };
        Ok((RespValue::Integer(deleted as i64), outcome))
    }
}

impl CommandSpec for Del {
    fn name(&self) -> &'static str {
        "del"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn get_keys(&self) -> Vec<Bytes> {
        self.keys.clone()
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        self.keys.clone()
    }
}
