// src/core/commands/string/append.rs

//! `APPEND` and `STRLEN`.

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use crate::core::storage::data_types::{DataValue, MAX_STRING_SIZE};
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

#[derive(Debug, Clone, Default)]
pub struct Append {
    pub key: Bytes,
    pub value: Bytes,
}

impl ParseCommand for Append {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 2 {
            return Err(ZirconDBError::WrongArgumentCount("APPEND".to_string()));
        }
        Ok(Append {
            key: extract_bytes(&args[0])?,
            value: extract_bytes(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Append {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;

        let new_len = match keyspace.lookup_write(&self.key) {
            Some(value) => {
                let DataValue::String(existing) = &value.data else {
                    return Err(ZirconDBError::WrongType);
                };
                if existing.len() + self.value.len() > MAX_STRING_SIZE {
                    return Err(ZirconDBError::InvalidState(
                        "string exceeds maximum allowed size (proto-max-bulk-len)".to_string(),
                    ));
                }
                // Stored strings are shared buffers; build a fresh one rather
                // than mutating in place.
                let mut combined = BytesMut::with_capacity(existing.len() + self.value.len());
                combined.extend_from_slice(existing);
                combined.extend_from_slice(&self.value);
                let combined = combined.freeze();
                let len = combined.len();
                value.data = DataValue::String(combined);
                value.update_metadata();
                len
            }
            None => {
                keyspace.insert_string(self.key.clone(), self.value.clone());
                self.value.len()
            }
        };

        Ok((
            RespValue::Integer(new_len as i64),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}

impl CommandSpec for Append {
    fn name(&self) -> &'static str {
        "append"
    }
    fn arity(&self) -> i64 {
        3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::FAST
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.key.clone(), self.value.clone()]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Strlen {
    pub key: Bytes,
}

impl ParseCommand for Strlen {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 1 {
            return Err(ZirconDBError::WrongArgumentCount("STRLEN".to_string()));
        }
        Ok(Strlen {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Strlen {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        let len = match keyspace.lookup_read(&self.key) {
            Some(value) => match &value.data {
                DataValue::String(b) => b.len(),
                _ => return Err(ZirconDBError::WrongType),
            },
            None => 0,
        };
        Ok((RespValue::Integer(len as i64), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Strlen {
    fn name(&self) -> &'static str {
        "strlen"
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
