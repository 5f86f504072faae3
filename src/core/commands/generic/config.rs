// src/core/commands/generic/config.rs

//! `CONFIG GET` / `CONFIG SET` for the recognized runtime options.

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// The dynamically readable/settable option names.
const KNOWN_OPTIONS: &[&str] = &[
    "slowlog-log-slower-than",
    "slowlog-max-len",
    "replica-read-only",
    "databases",
];

#[derive(Debug, Clone)]
pub enum ConfigSubcommand {
    Get(String),
    Set(String, String),
}

#[derive(Debug, Clone)]
pub struct ConfigGetSet {
    pub subcommand: ConfigSubcommand,
}

impl ParseCommand for ConfigGetSet {
    fn parse(args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        if args.is_empty() {
            return Err(ZirconDBError::WrongArgumentCount("CONFIG".to_string()));
        }
        let sub = extract_string(&args[0])?.to_ascii_lowercase();
        let subcommand = match sub.as_str() {
            "get" => {
                if args.len() != 2 {
                    return Err(ZirconDBError::WrongArgumentCount("CONFIG GET".to_string()));
                }
                ConfigSubcommand::Get(extract_string(&args[1])?.to_ascii_lowercase())
            }
            "set" => {
                if args.len() != 3 {
                    return Err(ZirconDBError::WrongArgumentCount("CONFIG SET".to_string()));
                }
                ConfigSubcommand::Set(
                    extract_string(&args[1])?.to_ascii_lowercase(),
                    extract_string(&args[2])?,
                )
            }
            _ => {
                return Err(ZirconDBError::UnknownCommand(format!("CONFIG {sub}")));
            }
        };
        Ok(ConfigGetSet { subcommand })
    }
}

fn parse_bool(value: &str) -> Result<bool, ZirconDBError> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(ZirconDBError::InvalidState(format!(
            "argument must be 'yes' or 'no', got '{value}'"
        ))),
    }
}

#[async_trait]
impl ExecutableCommand for ConfigGetSet {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        let state = ctx.state.clone();
        match &self.subcommand {
            ConfigSubcommand::Get(pattern) => {
                let config = state.config.lock().await;
                let mut pairs = Vec::new();
                for name in KNOWN_OPTIONS {
                    if pattern != "*" && pattern != name {
                        continue;
                    }
                    let value = match *name {
                        "slowlog-log-slower-than" => state.slowlog.threshold_micros().to_string(),
                        "slowlog-max-len" => state.slowlog.max_len().to_string(),
                        "replica-read-only" => {
                            if config.replication.replica_read_only {
                                "yes".to_string()
                            } else {
                                "no".to_string()
                            }
                        }
                        "databases" => config.databases.to_string(),
                        _ => continue,
                    };
                    pairs.push(RespValue::BulkString(Bytes::from(name.to_string())));
                    pairs.push(RespValue::BulkString(Bytes::from(value)));
                }
                Ok((RespValue::Array(pairs), WriteOutcome::DidNotWrite))
            }
            ConfigSubcommand::Set(name, value) => {
                let mut config = state.config.lock().await;
                match name.as_str() {
                    "slowlog-log-slower-than" => {
                        let threshold: i64 =
                            value.parse().map_err(|_| ZirconDBError::NotAnInteger)?;
                        config.slowlog.log_slower_than = threshold;
                        state.slowlog.set_threshold_micros(threshold);
                    }
                    "slowlog-max-len" => {
                        let max_len: usize =
                            value.parse().map_err(|_| ZirconDBError::NotAnInteger)?;
                        config.slowlog.max_len = max_len;
                        state.slowlog.set_max_len(max_len);
                    }
                    "replica-read-only" => {
                        config.replication.replica_read_only = parse_bool(value)?;
                    }
                    _ => {
                        return Err(ZirconDBError::InvalidState(format!(
                            "Unknown option or number of arguments for CONFIG SET - '{name}'"
                        )));
                    }
                }
                Ok((RespValue::ok(), WriteOutcome::DidNotWrite))
            }
        }
    }
}

impl CommandSpec for ConfigGetSet {
    fn name(&self) -> &'static str {
        "config"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::ADMIN | CommandFlags::NO_PROPAGATE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        match &self.subcommand {
            ConfigSubcommand::Get(pattern) => vec![
                Bytes::from_static(b"GET"),
                Bytes::from(pattern.clone()),
            ],
            ConfigSubcommand::Set(name, value) => vec![
                Bytes::from_static(b"SET"),
                Bytes::from(name.clone()),
                Bytes::from(value.clone()),
            ],
        }
    }
}
