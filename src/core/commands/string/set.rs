// src/core/commands/string/set.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_i64, extract_string};
use crate::core::protocol::RespFrame;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::{Duration, Instant};

/// The optional expiry attached to a `SET`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TtlOption {
    #[default]
    None,
    Seconds(u64),
    Milliseconds(u64),
}

/// The `NX`/`XX` existence condition of a `SET`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SetCondition {
    #[default]
    None,
    IfNotExists,
    IfExists,
}

#[derive(Debug, Clone, Default)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
    pub ttl: TtlOption,
    pub condition: SetCondition,
    /// `GET` option: reply with the previous value instead of `+OK`.
    pub get_old: bool,
}

impl ParseCommand for Set {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.len() < 2 {
            return Err(ZirconDBError::WrongArgumentCount("SET".to_string()));
        }
        let mut cmd = Set {
            key: extract_bytes(&args[0])?,
            value: extract_bytes(&args[1])?,
            ..Set::default()
        };

        let mut i = 2;
        while i < args.len() {
            let option = extract_string(&args[i])?.to_ascii_uppercase();
            match option.as_str() {
                "NX" if cmd.condition == SetCondition::None => {
                    cmd.condition = SetCondition::IfNotExists;
                }
                "XX" if cmd.condition == SetCondition::None => {
                    cmd.condition = SetCondition::IfExists;
                }
                "GET" => cmd.get_old = true,
                "EX" | "PX" if cmd.ttl == TtlOption::None => {
                    i += 1;
                    let amount = args
                        .get(i)
                        .ok_or(ZirconDBError::SyntaxError)
                        .and_then(extract_i64)?;
                    if amount <= 0 {
                        return Err(ZirconDBError::InvalidState(
                            "invalid expire time in 'set' command".to_string(),
                        ));
                    }
                    cmd.ttl = if option == "EX" {
                        TtlOption::Seconds(amount as u64)
                    } else {
                        TtlOption::Milliseconds(amount as u64)
                    };
                }
                _ => return Err(ZirconDBError::SyntaxError),
            }
            i += 1;
        }
        Ok(cmd)
    }
}

#[async_trait]
impl ExecutableCommand for Set {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let keyspace = ctx.keyspace_mut()?;

        let old = keyspace.lookup_read(&self.key).map(|v| v.data.clone());
        let old_string = match &old {
            Some(DataValue::String(b)) => Some(b.clone()),
            Some(_) if self.get_old => return Err(ZirconDBError::WrongType),
            _ => None,
        };

        let condition_met = match self.condition {
            SetCondition::None => true,
            SetCondition::IfNotExists => old.is_none(),
            SetCondition::IfExists => old.is_some(),
        };
        if !condition_met {
            let reply = if self.get_old {
                old_string.map_or(RespValue::Null, RespValue::BulkString)
            } else {
                RespValue::Null
            };
            return Ok((reply, WriteOutcome::DidNotWrite));
        }

        keyspace.insert_string(self.key.clone(), self.value.clone());
        let expiry = match self.ttl {
            TtlOption::None => None,
            TtlOption::Seconds(s) => Some(Instant::now() + Duration::from_secs(s)),
            TtlOption::Milliseconds(ms) => Some(Instant::now() + Duration::from_millis(ms)),
        };
        // A plain SET discards any previous expiry on the key.
        keyspace.set_expiry(&self.key, expiry);

        let reply = if self.get_old {
            old_string.map_or(RespValue::Null, RespValue::BulkString)
        } else {
            RespValue::ok()
        };
        Ok((reply, WriteOutcome::Write { keys_modified: 1 }))
    }
}

impl CommandSpec for Set {
    fn name(&self) -> &'static str {
        "set"
    }
    fn arity(&self) -> i64 {
        -3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone(), self.value.clone()];
        match self.condition {
            SetCondition::IfNotExists => args.push(Bytes::from_static(b"NX")),
            SetCondition::IfExists => args.push(Bytes::from_static(b"XX")),
            SetCondition::None => {}
        }
        match self.ttl {
            TtlOption::Seconds(s) => {
                args.push(Bytes::from_static(b"EX"));
                args.push(Bytes::from(s.to_string()));
            }
            TtlOption::Milliseconds(ms) => {
                args.push(Bytes::from_static(b"PX"));
                args.push(Bytes::from(ms.to_string()));
            }
            TtlOption::None => {}
        }
        if self.get_old {
            args.push(Bytes::from_static(b"GET"));
        }
        args
    }
}
