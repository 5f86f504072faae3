// src/core/commands/list/push.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, WriteOutcome};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use crate::core::storage::data_types::{DataValue, StoredValue};
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;

/// Defines the direction for list push operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDirection {
    Left,
    Right,
}

/// `LPUSH` / `RPUSH`.
#[derive(Debug, Clone)]
pub struct Push {
    pub key: Bytes,
    pub values: Vec<Bytes>,
    pub direction: PushDirection,
}

impl Push {
    pub fn parse_named(name: &str, args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        let direction = match name {
            "lpush" => PushDirection::Left,
            "rpush" => PushDirection::Right,
            _ => return Err(ZirconDBError::UnknownCommand(name.to_string())),
        };
        if args.len() < 2 {
            return Err(ZirconDBError::WrongArgumentCount(
                name.to_ascii_uppercase(),
            ));
        }
        let key = extract_bytes(&args[0])?;
        let values = args[1..]
            .iter()
            .map(extract_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Push {
            key,
            values,
            direction,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Push {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;

        if keyspace.lookup_write(&self.key).is_none() {
            keyspace.insert(
                self.key.clone(),
                StoredValue::new(DataValue::List(VecDeque::new())),
            );
        }
        let value = keyspace
            .lookup_write(&self.key)
            .ok_or_else(|| ZirconDBError::Internal("list vanished during push".into()))?;
        let DataValue::List(items) = &mut value.data else {
            return Err(ZirconDBError::WrongType);
        };
        for v in &self.values {
            match self.direction {
                PushDirection::Left => items.push_front(v.clone()),
                PushDirection::Right => items.push_back(v.clone()),
            }
        }
        let len = items.len();
        value.update_metadata();

        Ok((
            RespValue::Integer(len as i64),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}

impl CommandSpec for Push {
    fn name(&self) -> &'static str {
        match self.direction {
            PushDirection::Left => "lpush",
            PushDirection::Right => "rpush",
        }
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
        args.extend(self.values.iter().cloned());
        args
    }
}
