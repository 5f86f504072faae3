// src/core/commands/set/sadd.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use crate::core::storage::data_types::{DataValue, StoredValue};
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct SAdd {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl ParseCommand for SAdd {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() < 2 {
            return Err(ZirconDBError::WrongArgumentCount("SADD".to_string()));
        }
        Ok(SAdd {
            key: extract_bytes(&args[0])?,
            members: args[1..]
                .iter()
                .map(extract_bytes)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for SAdd {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;

        if keyspace.lookup_write(&self.key).is_none() {
            keyspace.insert(
                self.key.clone(),
                StoredValue::new(DataValue::Set(HashSet::new())),
            );
        }
        let value = keyspace
            .lookup_write(&self.key)
            .ok_or_else(|| ZirconDBError::Internal("set vanished during sadd".into()))?;
        let DataValue::Set(members) = &mut value.data else {
            return Err(ZirconDBError::WrongType);
        };
        let mut added = 0;
        for member in &self.members {
            if members.insert(member.clone()) {
                added += 1;
            }
        }
        value.update_metadata();

        Ok((
            RespValue::Integer(added),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}

impl CommandSpec for SAdd {
    fn name(&self) -> &'static str {
        "sadd"
    }
    fn arity(&self) -> i64 {
        -3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::FAST
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone()];
        args.extend(self.members.iter().cloned());
        args
    }
}
