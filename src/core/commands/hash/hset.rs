// src/core/commands/hash/hset.rs

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
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct HSet {
    pub key: Bytes,
    pub fields: Vec<(Bytes, Bytes)>,
}

impl ParseCommand for HSet {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() < 3 || args.len() % 2 == 0 {
            return Err(ZirconDBError::WrongArgumentCount("HSET".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let mut fields = Vec::with_capacity((args.len() - 1) / 2);
        for pair in args[1..].chunks_exact(2) {
            fields.push((extract_bytes(&pair[0])?, extract_bytes(&pair[1])?));
        }
        Ok(HSet { key, fields })
    }
}

#[async_trait]
impl ExecutableCommand for HSet {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;

        if keyspace.lookup_write(&self.key).is_none() {
            keyspace.insert(
                self.key.clone(),
                StoredValue::new(DataValue::Hash(IndexMap::new())),
            );
        }
        let value = keyspace
            .lookup_write(&self.key)
            .ok_or_else(|| ZirconDBError::Internal("hash vanished during hset".into()))?;
        let DataValue::Hash(map) = &mut value.data else {
            return Err(ZirconDBError::WrongType);
        };
        let mut added = 0;
        for (field, field_value) in &self.fields {
            if map.insert(field.clone(), field_value.clone()).is_none() {
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

impl CommandSpec for HSet {
    fn name(&self) -> &'static str {
        "hset"
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
        for (field, value) in &self.fields {
            args.push(field.clone());
            args.push(value.clone());
        }
        args
    }
}
