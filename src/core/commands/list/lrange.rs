// src/core/commands/list/lrange.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_i64};
use crate::core::protocol::RespFrame;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct LRange {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl ParseCommand for LRange {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() != 3 {
            return Err(ZirconDBError::WrongArgumentCount("LRANGE".to_string()));
        }
        Ok(LRange {
            key: extract_bytes(&args[0])?,
            start: extract_i64(&args[1])?,
            stop: extract_i64(&args[2])?,
        })
    }
}

/// Resolves an inclusive `[start, stop]` range with negative-from-the-end
/// indexing against a list of `len` items. Returns `None` for an empty range.
fn resolve_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    if len == 0 {
        return None;
    }
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop };
    let stop = stop.min(len - 1);
    if start > stop || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl ExecutableCommand for LRange {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;
        let items = match keyspace.lookup_read(&self.key) {
            Some(value) => match &value.data {
                DataValue::List(items) => match resolve_range(self.start, self.stop, items.len())
                {
                    Some((start, stop)) => items
                        .iter()
                        .skip(start)
                        .take(stop - start + 1)
                        .cloned()
                        .map(RespValue::BulkString)
                        .collect(),
                    None => vec![],
                },
                _ => return Err(ZirconDBError::WrongType),
            },
            None => vec![],
        };
        Ok((RespValue::Array(items), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for LRange {
    fn name(&self) -> &'static str {
        "lrange"
    }
    fn arity(&self) -> i64 {
        4
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![
            self.key.clone(),
            Bytes::from(self.start.to_string()),
            Bytes::from(self.stop.to_string()),
        ]
    }
}
