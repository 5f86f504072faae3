// src/core/commands/generic/object.rs

//! `OBJECT ENCODING|IDLETIME|HELP`: introspection of stored-value metadata.

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::RespFrame;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone)]
pub enum ObjectSubcommand {
    Encoding(Bytes),
    IdleTime(Bytes),
    Help,
}

#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub subcommand: ObjectSubcommand,
}

impl ParseCommand for ObjectInfo {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("OBJECT".to_string()));
        }
        let sub = extract_string(&args[0])?.to_ascii_lowercase();
        let subcommand = match sub.as_str() {
            "encoding" | "idletime" => {
                if args.len() != 2 {
                    return Err(ZirconDBError::WrongArgumentCount(format!(
                        "OBJECT {}",
                        sub.to_ascii_uppercase()
                    )));
                }
                let key = extract_bytes(&args[1])?;
                if sub == "encoding" {
                    ObjectSubcommand::Encoding(key)
                } else {
                    ObjectSubcommand::IdleTime(key)
                }
            }
            "help" => ObjectSubcommand::Help,
            _ => return Err(ZirconDBError::UnknownCommand(format!("OBJECT {sub}"))),
        };
        Ok(ObjectInfo { subcommand })
    }
}

#[async_trait]
impl ExecutableCommand for ObjectInfo {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let reply = match &self.subcommand {
            ObjectSubcommand::Encoding(key) => {
                let keyspace = ctx.keyspace_mut()?;
                match keyspace.peek(key) {
                    Some(value) => {
                        RespValue::BulkString(Bytes::from_static(value.encoding.as_str().as_bytes()))
                    }
                    None => {
                        return Err(ZirconDBError::InvalidState("no such key".to_string()));
                    }
                }
            }
            ObjectSubcommand::IdleTime(key) => {
                let keyspace = ctx.keyspace_mut()?;
                match keyspace.peek(key) {
                    Some(value) => RespValue::Integer(value.idle_secs() as i64),
                    None => {
                        return Err(ZirconDBError::InvalidState("no such key".to_string()));
                    }
                }
            }
            ObjectSubcommand::Help => RespValue::Array(
                [
                    "OBJECT <subcommand> [<arg> ...]. Subcommands are:",
                    "ENCODING <key>",
                    "    Return the kind of internal representation used to store <key>.",
                    "IDLETIME <key>",
                    "    Return the idle time of <key> in seconds.",
                    "HELP",
                    "    Print this help.",
                ]
                .iter()
                .map(|line| RespValue::BulkString(Bytes::from(line.to_string())))
                .collect(),
            ),
        };
        Ok((reply, WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for ObjectInfo {
    fn name(&self) -> &'static str {
        "object"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY | CommandFlags::NO_PROPAGATE
    }
    fn get_keys(&self) -> Vec<Bytes> {
        match &self.subcommand {
            ObjectSubcommand::Encoding(key) | ObjectSubcommand::IdleTime(key) => vec![key.clone()],
            ObjectSubcommand::Help => vec![],
        }
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        match &self.subcommand {
            ObjectSubcommand::Encoding(key) => vec![Bytes::from_static(b"ENCODING"), key.clone()],
            ObjectSubcommand::IdleTime(key) => vec![Bytes::from_static(b"IDLETIME"), key.clone()],
            ObjectSubcommand::Help => vec![Bytes::from_static(b"HELP")],
        }
    }
}
