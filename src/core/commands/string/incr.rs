// src/core/commands/string/incr.rs

//! `INCR`, `DECR`, `INCRBY`, and `DECRBY`: one implementation over a signed
//! delta.

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, extract_i64, parse_stored_i64};
use crate::core::protocol::RespFrame;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IncrOp {
    Incr,
    Decr,
    IncrBy,
    DecrBy,
}

#[derive(Debug, Clone)]
pub struct IncrDecr {
    pub key: Bytes,
    /// Signed amount applied to the stored integer.
    pub delta: i64,
    op: IncrOp,
}

impl IncrDecr {
    /// Parses any of the four increment-family commands by name.
    pub fn parse_named(name: &str, args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        let (op, with_amount) = match name {
            "incr" => (IncrOp::Incr, false),
            "decr" => (IncrOp::Decr, false),
            "incrby" => (IncrOp::IncrBy, true),
            "decrby" => (IncrOp::DecrBy, true),
            _ => return Err(ZirconDBError::UnknownCommand(name.to_string())),
        };
        let expected = if with_amount { 2 } else { 1 };
        if args.len() != expected {
            return Err(ZirconDBError::WrongArgumentCount(
                name.to_ascii_uppercase(),
            ));
        }
        let key = extract_bytes(&args[0])?;
        let amount = if with_amount { extract_i64(&args[1])? } else { 1 };
        let delta = match op {
            IncrOp::Incr | IncrOp::IncrBy => amount,
            IncrOp::Decr | IncrOp::DecrBy => {
                amount.checked_neg().ok_or(ZirconDBError::Overflow)?
            }
        };
        Ok(IncrDecr { key, delta, op })
    }
}

#[async_trait]
impl ExecutableCommand for IncrDecr {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;

        let current = match keyspace.lookup_write(&self.key) {
            Some(value) => match &value.data {
                DataValue::String(b) => parse_stored_i64(b)?,
                _ => Err(ZirconDBError::WrongType)?,
            },
            None => 0,
        };
        let next = current
            .checked_add(self.delta)
            .ok_or(ZirconDBError::NotAnInteger)?;

        if let Some(value) = keyspace.lookup_write(&self.key) {
            value.data = DataValue::String(Bytes::from(next.to_string()));
            value.update_metadata();
        } else {
            keyspace.insert_string(self.key.clone(), Bytes::from(next.to_string()));
        }

        Ok((
            RespValue::Integer(next),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}

impl CommandSpec for IncrDecr {
    fn name(&self) -> &'static str {
        match self.op {
            IncrOp::Incr => "incr",
            IncrOp::Decr => "decr",
            IncrOp::IncrBy => "incrby",
            IncrOp::DecrBy => "decrby",
        }
    }
    fn arity(&self) -> i64 {
        match self.op {
            IncrOp::Incr | IncrOp::Decr => 2,
            IncrOp::IncrBy | IncrOp::DecrBy => 3,
        }
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::FAST
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        match self.op {
            IncrOp::Incr | IncrOp::Decr => vec![self.key.clone()],
            IncrOp::IncrBy => vec![self.key.clone(), Bytes::from(self.delta.to_string())],
            IncrOp::DecrBy => vec![self.key.clone(), Bytes::from((-self.delta).to_string())],
        }
    }
}
