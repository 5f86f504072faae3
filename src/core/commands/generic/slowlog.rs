// src/core/commands/generic/slowlog.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use crate::core::slowlog::SlowLogEntry;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// Entries returned by `SLOWLOG GET` when no count is given.
const DEFAULT_GET_COUNT: usize = 10;

#[derive(Debug, Clone, Default)]
pub enum SlowlogSubcommand {
    Get(Option<usize>),
    #[default]
    Len,
    Reset,
    Help,
}

#[derive(Debug, Clone, Default)]
pub struct Slowlog {
    pub subcommand: SlowlogSubcommand,
}

impl ParseCommand for Slowlog {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("SLOWLOG".to_string()));
        }
        let sub_str = extract_string(&args[0])?.to_ascii_lowercase();
        let subcommand = match sub_str.as_str() {
            "get" => {
                if args.len() > 2 {
                    return Err(ZirconDBError::WrongArgumentCount("SLOWLOG GET".to_string()));
                }
                let count = if args.len() == 2 {
                    Some(extract_string(&args[1])?.parse()?)
                } else {
                    None
                };
                SlowlogSubcommand::Get(count)
            }
            "len" => {
                if args.len() != 1 {
                    return Err(ZirconDBError::WrongArgumentCount("SLOWLOG LEN".to_string()));
                }
                SlowlogSubcommand::Len
            }
            "reset" => {
                if args.len() != 1 {
                    return Err(ZirconDBError::WrongArgumentCount(
                        "SLOWLOG RESET".to_string(),
                    ));
                }
                SlowlogSubcommand::Reset
            }
            "help" => {
                if args.len() != 1 {
                    return Err(ZirconDBError::WrongArgumentCount(
                        "SLOWLOG HELP".to_string(),
                    ));
                }
                SlowlogSubcommand::Help
            }
            _ => return Err(ZirconDBError::UnknownCommand(format!("SLOWLOG {sub_str}"))),
        };
        Ok(Slowlog { subcommand })
    }
}

/// Serializes one entry into its six-element reply shape:
/// id, time, duration, argv-array, peer address, client name.
fn entry_to_resp(entry: &SlowLogEntry) -> RespValue {
    RespValue::Array(vec![
        RespValue::Integer(entry.id as i64),
        RespValue::Integer(entry.unix_time_secs as i64),
        RespValue::Integer(entry.duration_micros as i64),
        RespValue::Array(
            entry
                .argv
                .iter()
                .cloned()
                .map(RespValue::BulkString)
                .collect(),
        ),
        RespValue::BulkString(Bytes::from(entry.peer_addr.clone())),
        RespValue::BulkString(entry.client_name.clone()),
    ])
}

#[async_trait]
impl ExecutableCommand for Slowlog {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let slowlog = &ctx.state.slowlog;
        let response = match &self.subcommand {
            SlowlogSubcommand::Get(count) => {
                let entries = slowlog.get(count.unwrap_or(DEFAULT_GET_COUNT));
                RespValue::Array(entries.iter().map(entry_to_resp).collect())
            }
            SlowlogSubcommand::Len => RespValue::Integer(slowlog.len() as i64),
            SlowlogSubcommand::Reset => {
                slowlog.reset();
                RespValue::ok()
            }
            SlowlogSubcommand::Help => RespValue::Array(
                [
                    "SLOWLOG <subcommand> [<arg> [value] [opt] ...]. Subcommands are:",
                    "GET [<count>]",
                    "    Return top <count> entries from the slowlog (default: 10).",
                    "    Entries are made of: id, timestamp, time in microseconds,",
                    "    arguments array, client IP and port, client name",
                    "LEN",
                    "    Return the length of the slowlog.",
                    "RESET",
                    "    Reset the slowlog.",
                    "HELP",
                    "    Print this help.",
                ]
                .iter()
                .map(|line| RespValue::BulkString(Bytes::from(line.to_string())))
                .collect(),
            ),
        };
        Ok((response, WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Slowlog {
    fn name(&self) -> &'static str {
        "slowlog"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::ADMIN | CommandFlags::NO_PROPAGATE | CommandFlags::READONLY
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![];
        match &self.subcommand {
            SlowlogSubcommand::Get(Some(c)) => {
                args.extend([Bytes::from_static(b"GET"), Bytes::from(c.to_string())]);
            }
            SlowlogSubcommand::Get(None) => args.push(Bytes::from_static(b"GET")),
            SlowlogSubcommand::Len => args.push(Bytes::from_static(b"LEN")),
            SlowlogSubcommand::Reset => args.push(Bytes::from_static(b"RESET")),
            SlowlogSubcommand::Help => args.push(Bytes::from_static(b"HELP")),
        }
        args
    }
}
