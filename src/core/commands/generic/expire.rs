// src/core/commands/generic/expire.rs

//! `EXPIRE` and `TTL`.

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_i64};
use crate::core::protocol::RespFrame;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct Expire {
    pub key: Bytes,
    pub seconds: i64,
}

impl ParseCommand for Expire {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 2 {
            return Err(ZirconDBError::WrongArgumentCount("EXPIRE".to_string()));
        }
        Ok(Expire {
            key: extract_bytes(&args[0])?,
            seconds: extract_i64(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Expire {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        if keyspace.lookup_read(&self.key).is_none() {
            return Ok((RespValue::Integer(0), WriteOutcome::DidNotWrite));
        }
        // A non-positive ttl deletes the key outright.
        if self.seconds <= 0 {
            keyspace.delete(&self.key);
            return Ok((
                RespValue::Integer(1),
                WriteOutcome::Delete { keys_deleted: 1 },
            ));
        }
        keyspace.set_expiry(
            &self.key,
            Some(Instant::now() + Duration::from_secs(self.seconds as u64)),
        );
        Ok((
            RespValue::Integer(1),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}

impl CommandSpec for Expire {
    fn name(&self) -> &'static str {
        "expire"
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
        vec![self.key.clone(), Bytes::from(self.seconds.to_string())]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ttl {
    pub key: Bytes,
}

impl ParseCommand for Ttl {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 1 {
            return Err(ZirconDBError::WrongArgumentCount("TTL".to_string()));
        }
        Ok(Ttl {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Ttl {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        if keyspace.lookup_read(&self.key).is_none() {
            return Ok((RespValue::Integer(-2), WriteOutcome::DidNotWrite));
        }
        let ttl = match keyspace.expiry(&self.key) {
            Some(at) => at
                .checked_duration_since(Instant::now())
                .map_or(-2, |d| d.as_secs() as i64),
            None => -1,
        };
        Ok((RespValue::Integer(ttl), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Ttl {
    fn name(&self) -> &'static str {
        "ttl"
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
