// src/core/commands/zset/zadd.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_f64};
use crate::core::protocol::RespFrame;
use crate::core::storage::data_types::{DataValue, StoredValue};
use crate::core::storage::db::ExecutionContext;
use crate::core::storage::zset::SortedSet;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct ZAdd {
    pub key: Bytes,
    /// `(score, member)` pairs in argument order.
    pub entries: Vec<(f64, Bytes)>,
}

impl ParseCommand for ZAdd {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() < 3 || args.len() % 2 == 0 {
            return Err(ZirconDBError::WrongArgumentCount("ZADD".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let mut entries = Vec::with_capacity((args.len() - 1) / 2);
        for pair in args[1..].chunks_exact(2) {
            entries.push((extract_f64(&pair[0])?, extract_bytes(&pair[1])?));
        }
        Ok(ZAdd { key, entries })
    }
}

#[async_trait]
impl ExecutableCommand for ZAdd {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;

        if keyspace.lookup_write(&self.key).is_none() {
            keyspace.insert(
                self.key.clone(),
                StoredValue::new(DataValue::SortedSet(SortedSet::new())),
            );
        }
        let value = keyspace
            .lookup_write(&self.key)
            .ok_or_else(|| ZirconDBError::Internal("zset vanished during zadd".into()))?;
        let DataValue::SortedSet(zset) = &mut value.data else {
            return Err(ZirconDBError::WrongType);
        };
        let mut added = 0;
        for (score, member) in &self.entries {
            if zset.insert(member.clone(), *score) {
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

impl CommandSpec for ZAdd {
    fn name(&self) -> &'static str {
        "zadd"
    }
    fn arity(&self) -> i64 {
        -4
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::FAST
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone()];
        for (score, member) in &self.entries {
            args.push(Bytes::from(score.to_string()));
            args.push(member.clone());
        }
        args
    }
}
