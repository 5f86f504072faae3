// src/core/commands/registry.rs

//! The immutable command table used by the dispatcher for lookup and arity
//! validation before a command is parsed or queued.

use crate::core::commands::command_trait::CommandFlags;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Static description of one command.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub name: &'static str,
    /// Positive: exact argument count including the command name.
    /// Negative `-N`: at least `N` arguments including the name.
    pub arity: i64,
    pub flags: CommandFlags,
}

impl CommandDescriptor {
    /// Validates a raw argument count (command name included) against this
    /// descriptor's arity rule.
    pub fn arity_matches(&self, argc: usize) -> bool {
        let argc = argc as i64;
        if self.arity >= 0 {
            argc == self.arity
        } else {
            argc >= -self.arity
        }
    }
}

macro_rules! descriptor {
    ($name:literal, $arity:literal, $($flag:ident)|+) => {
        (
            $name,
            CommandDescriptor {
                name: $name,
                arity: $arity,
                flags: CommandFlags::from_bits_truncate(
                    $(CommandFlags::$flag.bits())|+
                ),
            },
        )
    };
}

static REGISTRY: Lazy<HashMap<&'static str, CommandDescriptor>> = Lazy::new(|| {
    HashMap::from([
        // --- Connection / generic ---
        descriptor!("ping", -1, READONLY | FAST),
        descriptor!("echo", 2, READONLY | FAST),
        descriptor!("select", 2, NO_PROPAGATE | FAST),
        descriptor!("del", -2, WRITE),
        descriptor!("exists", -2, READONLY | FAST),
        descriptor!("type", 2, READONLY | FAST),
        descriptor!("expire", 3, WRITE | FAST),
        descriptor!("ttl", 2, READONLY | FAST),
        descriptor!("dbsize", 1, READONLY | FAST),
        descriptor!("flushdb", 1, WRITE),
        descriptor!("flushall", 1, WRITE),
        descriptor!("config", -2, ADMIN | NO_PROPAGATE),
        descriptor!("client", -2, ADMIN | NO_PROPAGATE),
        descriptor!("slowlog", -2, ADMIN | READONLY | NO_PROPAGATE),
        descriptor!("object", -2, READONLY | NO_PROPAGATE),
        descriptor!("reset", 1, NO_PROPAGATE | FAST),
        descriptor!("replicaof", 3, ADMIN | NO_PROPAGATE),
        descriptor!("monitor", 1, ADMIN | NO_PROPAGATE),
        // --- Transactions ---
        descriptor!("multi", 1, TRANSACTION | NO_PROPAGATE | FAST),
        descriptor!("exec", 1, TRANSACTION | NO_PROPAGATE | SKIP_MONITOR),
        descriptor!("discard", 1, TRANSACTION | NO_PROPAGATE | FAST),
        descriptor!("watch", -2, TRANSACTION | NO_PROPAGATE | FAST),
        descriptor!("unwatch", 1, NO_PROPAGATE | FAST),
        // --- Strings ---
        descriptor!("get", 2, READONLY | FAST),
        descriptor!("set", -3, WRITE),
        descriptor!("append", 3, WRITE | FAST),
        descriptor!("strlen", 2, READONLY | FAST),
        descriptor!("incr", 2, WRITE | FAST),
        descriptor!("decr", 2, WRITE | FAST),
        descriptor!("incrby", 3, WRITE | FAST),
        descriptor!("decrby", 3, WRITE | FAST),
        // --- Lists ---
        descriptor!("lpush", -3, WRITE | FAST),
        descriptor!("rpush", -3, WRITE | FAST),
        descriptor!("llen", 2, READONLY | FAST),
        descriptor!("lrange", 4, READONLY),
        // --- Sets ---
        descriptor!("sadd", -3, WRITE | FAST),
        descriptor!("scard", 2, READONLY | FAST),
        descriptor!("smembers", 2, READONLY),
        // --- Hashes ---
        descriptor!("hset", -4, WRITE | FAST),
        descriptor!("hget", 3, READONLY | FAST),
        // --- Sorted sets ---
        descriptor!("zadd", -4, WRITE | FAST),
        descriptor!("zscore", 3, READONLY | FAST),
    ])
});

/// Case-insensitive descriptor lookup. `name` must already be lowercased.
pub fn lookup(name: &str) -> Option<&'static CommandDescriptor> {
    REGISTRY.get(name)
}
