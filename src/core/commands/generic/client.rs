// src/core/commands/generic/client.rs

//! `CLIENT ID|GETNAME|SETNAME`.

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
pub enum ClientSubcommand {
    Id,
    GetName,
    SetName(Bytes),
}

#[derive(Debug, Clone)]
pub struct Client {
    pub subcommand: ClientSubcommand,
}

impl ParseCommand for Client {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("CLIENT".to_string()));
        }
        let sub = extract_string(&args[0])?.to_ascii_lowercase();
        let subcommand = match sub.as_str() {
            "id" => {
                if args.len() != 1 {
                    return Err(ZirconDBError::WrongArgumentCount("CLIENT ID".to_string()));
                }
                ClientSubcommand::Id
            }
            "getname" => {
                if args.len() != 1 {
                    return Err(ZirconDBError::WrongArgumentCount(
                        "CLIENT GETNAME".to_string(),
                    ));
                }
                ClientSubcommand::GetName
            }
            "setname" => {
                if args.len() != 2 {
                    return Err(ZirconDBError::WrongArgumentCount(
                        "CLIENT SETNAME".to_string(),
                    ));
                }
                let name = extract_bytes(&args[1])?;
                if name.iter().any(|b| *b == b' ' || *b == b'\n') {
                    return Err(ZirconDBError::InvalidState(
                        "Client names cannot contain spaces, newlines or special characters."
                            .to_string(),
                    ));
                }
                ClientSubcommand::SetName(name)
            }
            _ => return Err(ZirconDBError::UnknownCommand(format!("CLIENT {sub}"))),
        };
        Ok(Client { subcommand })
    }
}

#[async_trait]
impl ExecutableCommand for Client {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let handle = ctx
            .state
            .clients
            .get(&ctx.session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ZirconDBError::Internal("session not registered".into()))?;

        let reply = match &self.subcommand {
            ClientSubcommand::Id => RespValue::Integer(handle.session_id as i64),
            ClientSubcommand::GetName => {
                let name = handle.name();
                if name.is_empty() {
                    RespValue::Null
                } else {
                    RespValue::BulkString(name)
                }
            }
            ClientSubcommand::SetName(name) => {
                handle.set_name(name.clone());
                RespValue::ok()
            }
        };
        Ok((reply, WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Client {
    fn name(&self) -> &'static str {
        "client"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::ADMIN | CommandFlags::NO_PROPAGATE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        match &self.subcommand {
            ClientSubcommand::Id => vec![Bytes::from_static(b"ID")],
            ClientSubcommand::GetName => vec![Bytes::from_static(b"GETNAME")],
            ClientSubcommand::SetName(name) => {
                vec![Bytes::from_static(b"SETNAME"), name.clone()]
            }
        }
    }
}
