// src/core/commands/mod.rs

//! Defines all supported commands, organized by category, and the central
//! `Command` enum that encapsulates their parsed state.

use crate::core::commands::command_trait::{
    CommandExt, CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::protocol::RespFrame;
use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bytes::Bytes;

// Re-export the CommandSpec trait for easy access by other modules.
pub use command_spec::CommandSpec;

pub mod command_spec;
pub mod command_trait;
pub mod generic;
pub mod hash;
pub mod helpers;
pub mod list;
pub mod registry;
pub mod set;
pub mod string;
pub mod zset;

use generic::{
    Client, ConfigGetSet, DbSize, Del, Echo, Exists, Expire, FlushAll, FlushDb, ObjectInfo, Ping,
    Replicaof, Select, Slowlog, Ttl, TypeInfo, Unwatch, Watch,
};
use hash::{HGet, HSet};
use list::{LLen, LRange, Push};
use set::{SAdd, SCard, SMembers};
use string::{Append, Get, IncrDecr, Set, Strlen};
use zset::{ZAdd, ZScore};

/// Every parsed command the server understands.
///
/// Transaction-control commands (`MULTI`, `EXEC`, `DISCARD`, `WATCH`,
/// `RESET`) and session-level commands (`SELECT`, `MONITOR`) are applied by
/// the dispatcher — or, when queued in a batch, by the transaction engine —
/// rather than executed through [`ExecutableCommand`]; their `execute` impls
/// are unreachable and report an internal error.
#[derive(Debug, Clone)]
pub enum Command {
    // Connection / generic
    Ping(Ping),
    Echo(Echo),
    Select(Select),
    Del(Del),
    Exists(Exists),
    Type(TypeInfo),
    Expire(Expire),
    Ttl(Ttl),
    DbSize(DbSize),
    FlushDb(FlushDb),
    FlushAll(FlushAll),
    Config(ConfigGetSet),
    Client(Client),
    Slowlog(Slowlog),
    Object(ObjectInfo),
    Replicaof(Replicaof),
    Reset,
    Monitor,
    // Transactions
    Multi,
    Exec,
    Discard,
    Watch(Watch),
    Unwatch(Unwatch),
    // Strings
    Get(Get),
    Set(Set),
    Append(Append),
    Strlen(Strlen),
    IncrDecr(IncrDecr),
    // Lists
    Push(Push),
    LLen(LLen),
    LRange(LRange),
    // Sets
    SAdd(SAdd),
    SCard(SCard),
    SMembers(SMembers),
    // Hashes
    HSet(HSet),
    HGet(HGet),
    // Sorted sets
    ZAdd(ZAdd),
    ZScore(ZScore),
}

impl Command {
    /// Parses a command from its lowercased name and argument frames.
    pub fn from_parts(name: &str, args: &[RespFrame]) -> Result<Self, ZirconDBError> {
        let command = match name {
            "ping" => Command::Ping(Ping::parse(args)?),
            "echo" => Command::Echo(Echo::parse(args)?),
            "select" => Command::Select(Select::parse(args)?),
            "del" => Command::Del(Del::parse(args)?),
            "exists" => Command::Exists(Exists::parse(args)?),
            "type" => Command::Type(TypeInfo::parse(args)?),
            "expire" => Command::Expire(Expire::parse(args)?),
            "ttl" => Command::Ttl(Ttl::parse(args)?),
            "dbsize" => Command::DbSize(DbSize::parse(args)?),
            "flushdb" => Command::FlushDb(FlushDb::parse(args)?),
            "flushall" => Command::FlushAll(FlushAll::parse(args)?),
            "config" => Command::Config(ConfigGetSet::parse(args)?),
            "client" => Command::Client(Client::parse(args)?),
            "slowlog" => Command::Slowlog(Slowlog::parse(args)?),
            "object" => Command::Object(ObjectInfo::parse(args)?),
            "replicaof" => Command::Replicaof(Replicaof::parse(args)?),
            "reset" => Command::Reset,
            "monitor" => Command::Monitor,
            "multi" => Command::Multi,
            "exec" => Command::Exec,
            "discard" => Command::Discard,
            "watch" => Command::Watch(Watch::parse(args)?),
            "unwatch" => Command::Unwatch(Unwatch::parse(args)?),
            "get" => Command::Get(Get::parse(args)?),
            "set" => Command::Set(Set::parse(args)?),
            "append" => Command::Append(Append::parse(args)?),
            "strlen" => Command::Strlen(Strlen::parse(args)?),
            "incr" | "decr" | "incrby" | "decrby" => {
                Command::IncrDecr(IncrDecr::parse_named(name, args)?)
            }
            "lpush" | "rpush" => Command::Push(Push::parse_named(name, args)?),
            "llen" => Command::LLen(LLen::parse(args)?),
            "lrange" => Command::LRange(LRange::parse(args)?),
            "sadd" => Command::SAdd(SAdd::parse(args)?),
            "scard" => Command::SCard(SCard::parse(args)?),
            "smembers" => Command::SMembers(SMembers::parse(args)?),
            "hset" => Command::HSet(HSet::parse(args)?),
            "hget" => Command::HGet(HGet::parse(args)?),
            "zadd" => Command::ZAdd(ZAdd::parse(args)?),
            "zscore" => Command::ZScore(ZScore::parse(args)?),
            _ => return Err(ZirconDBError::UnknownCommand(name.to_string())),
        };
        Ok(command)
    }

    /// The command's canonical (lowercase) name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping(c) => c.name(),
            Command::Echo(c) => c.name(),
            Command::Select(c) => c.name(),
            Command::Del(c) => c.name(),
            Command::Exists(c) => c.name(),
            Command::Type(c) => c.name(),
            Command::Expire(c) => c.name(),
            Command::Ttl(c) => c.name(),
            Command::DbSize(c) => c.name(),
            Command::FlushDb(c) => c.name(),
            Command::FlushAll(c) => c.name(),
            Command::Config(c) => c.name(),
            Command::Client(c) => c.name(),
            Command::Slowlog(c) => c.name(),
            Command::Object(c) => c.name(),
            Command::Replicaof(c) => c.name(),
            Command::Reset => "reset",
            Command::Monitor => "monitor",
            Command::Multi => "multi",
            Command::Exec => "exec",
            Command::Discard => "discard",
            Command::Watch(c) => c.name(),
            Command::Unwatch(c) => c.name(),
            Command::Get(c) => c.name(),
            Command::Set(c) => c.name(),
            Command::Append(c) => c.name(),
            Command::Strlen(c) => c.name(),
            Command::IncrDecr(c) => c.name(),
            Command::Push(c) => c.name(),
            Command::LLen(c) => c.name(),
            Command::LRange(c) => c.name(),
            Command::SAdd(c) => c.name(),
            Command::SCard(c) => c.name(),
            Command::SMembers(c) => c.name(),
            Command::HSet(c) => c.name(),
            Command::HGet(c) => c.name(),
            Command::ZAdd(c) => c.name(),
            Command::ZScore(c) => c.name(),
        }
    }

    /// The full argument vector (uppercased name first), as it appears on the
    /// propagation stream and the monitor feed.
    pub fn to_propagation_argv(&self) -> Vec<Bytes> {
        let mut argv = vec![Bytes::from(self.name().to_ascii_uppercase())];
        argv.extend(self.to_resp_args());
        argv
    }

    fn to_resp_args(&self) -> Vec<Bytes> {
        match self {
            Command::Ping(c) => c.to_resp_args(),
            Command::Echo(c) => c.to_resp_args(),
            Command::Select(c) => c.to_resp_args(),
            Command::Del(c) => c.to_resp_args(),
            Command::Exists(c) => c.to_resp_args(),
            Command::Type(c) => c.to_resp_args(),
            Command::Expire(c) => c.to_resp_args(),
            Command::Ttl(c) => c.to_resp_args(),
            Command::DbSize(c) => c.to_resp_args(),
            Command::FlushDb(c) => c.to_resp_args(),
            Command::FlushAll(c) => c.to_resp_args(),
            Command::Config(c) => c.to_resp_args(),
            Command::Client(c) => c.to_resp_args(),
            Command::Slowlog(c) => c.to_resp_args(),
            Command::Object(c) => c.to_resp_args(),
            Command::Replicaof(c) => c.to_resp_args(),
            Command::Reset | Command::Monitor => vec![],
            Command::Multi | Command::Exec | Command::Discard => vec![],
            Command::Watch(c) => c.to_resp_args(),
            Command::Unwatch(c) => c.to_resp_args(),
            Command::Get(c) => c.to_resp_args(),
            Command::Set(c) => c.to_resp_args(),
            Command::Append(c) => c.to_resp_args(),
            Command::Strlen(c) => c.to_resp_args(),
            Command::IncrDecr(c) => c.to_resp_args(),
            Command::Push(c) => c.to_resp_args(),
            Command::LLen(c) => c.to_resp_args(),
            Command::LRange(c) => c.to_resp_args(),
            Command::SAdd(c) => c.to_resp_args(),
            Command::SCard(c) => c.to_resp_args(),
            Command::SMembers(c) => c.to_resp_args(),
            Command::HSet(c) => c.to_resp_args(),
            Command::HGet(c) => c.to_resp_args(),
            Command::ZAdd(c) => c.to_resp_args(),
            Command::ZScore(c) => c.to_resp_args(),
        }
    }
}

impl TryFrom<RespFrame> for Command {
    type Error = ZirconDBError;

    fn try_from(frame: RespFrame) -> Result<Self, Self::Error> {
        let RespFrame::Array(parts) = frame else {
            return Err(ZirconDBError::ProtocolError(
                "expected an array of bulk strings".into(),
            ));
        };
        let Some((name_frame, args)) = parts.split_first() else {
            return Err(ZirconDBError::ProtocolError("empty command".into()));
        };
        let name = helpers::extract_string(name_frame)?.to_ascii_lowercase();
        Command::from_parts(&name, args)
    }
}

#[async_trait]
impl CommandExt for Command {
    fn get_flags(&self) -> CommandFlags {
        registry::lookup(self.name())
            .map(|desc| desc.flags)
            .unwrap_or_else(CommandFlags::empty)
    }

    fn get_keys(&self) -> Vec<Bytes> {
        match self {
            Command::Del(c) => c.get_keys(),
            Command::Exists(c) => c.get_keys(),
            Command::Type(c) => c.get_keys(),
            Command::Expire(c) => c.get_keys(),
            Command::Ttl(c) => c.get_keys(),
            Command::Object(c) => c.get_keys(),
            Command::Watch(c) => c.get_keys(),
            Command::Get(c) => c.get_keys(),
            Command::Set(c) => c.get_keys(),
            Command::Append(c) => c.get_keys(),
            Command::Strlen(c) => c.get_keys(),
            Command::IncrDecr(c) => c.get_keys(),
            Command::Push(c) => c.get_keys(),
            Command::LLen(c) => c.get_keys(),
            Command::LRange(c) => c.get_keys(),
            Command::SAdd(c) => c.get_keys(),
            Command::SCard(c) => c.get_keys(),
            Command::SMembers(c) => c.get_keys(),
            Command::HSet(c) => c.get_keys(),
            Command::HGet(c) => c.get_keys(),
            Command::ZAdd(c) => c.get_keys(),
            Command::ZScore(c) => c.get_keys(),
            _ => vec![],
        }
    }

    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError> {
        match self {
            Command::Ping(c) => c.execute(ctx).await,
            Command::Echo(c) => c.execute(ctx).await,
            Command::Del(c) => c.execute(ctx).await,
            Command::Exists(c) => c.execute(ctx).await,
            Command::Type(c) => c.execute(ctx).await,
            Command::Expire(c) => c.execute(ctx).await,
            Command::Ttl(c) => c.execute(ctx).await,
            Command::DbSize(c) => c.execute(ctx).await,
            Command::FlushDb(c) => c.execute(ctx).await,
            Command::FlushAll(c) => c.execute(ctx).await,
            Command::Config(c) => c.execute(ctx).await,
            Command::Client(c) => c.execute(ctx).await,
            Command::Slowlog(c) => c.execute(ctx).await,
            Command::Object(c) => c.execute(ctx).await,
            Command::Replicaof(c) => c.execute(ctx).await,
            Command::Unwatch(c) => c.execute(ctx).await,
            Command::Get(c) => c.execute(ctx).await,
            Command::Set(c) => c.execute(ctx).await,
            Command::Append(c) => c.execute(ctx).await,
            Command::Strlen(c) => c.execute(ctx).await,
            Command::IncrDecr(c) => c.execute(ctx).await,
            Command::Push(c) => c.execute(ctx).await,
            Command::LLen(c) => c.execute(ctx).await,
            Command::LRange(c) => c.execute(ctx).await,
            Command::SAdd(c) => c.execute(ctx).await,
            Command::SCard(c) => c.execute(ctx).await,
            Command::SMembers(c) => c.execute(ctx).await,
            Command::HSet(c) => c.execute(ctx).await,
            Command::HGet(c) => c.execute(ctx).await,
            Command::ZAdd(c) => c.execute(ctx).await,
            Command::ZScore(c) => c.execute(ctx).await,
            Command::Select(_)
            | Command::Reset
            | Command::Monitor
            | Command::Multi
            | Command::Exec
            | Command::Discard
            | Command::Watch(_) => Err(ZirconDBError::Internal(format!(
                "'{}' must be handled by the dispatcher",
                self.name()
            ))),
        }
    }
}
