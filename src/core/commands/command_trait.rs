// src/core/commands/command_trait.rs

//! Defines the core traits for all executable commands.

use crate::core::storage::db::ExecutionContext;
use crate::core::{RespValue, ZirconDBError};
use async_trait::async_trait;
use bitflags::bitflags;
use bytes::Bytes;

bitflags! {
    /// Flags that describe the properties and behavior of a command.
    /// These are used by the router and other subsystems to handle commands appropriately.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CommandFlags: u32 {
        /// The command modifies the dataset.
        const WRITE        = 1 << 0;
        /// The command only reads data.
        const READONLY     = 1 << 1;
        /// An administrative command.
        const ADMIN        = 1 << 2;
        /// The command should not be propagated to replicas or the AOF stream.
        const NO_PROPAGATE = 1 << 3;
        /// A command related to transactions (e.g., `MULTI`, `EXEC`).
        const TRANSACTION  = 1 << 4;
        /// Constant-time command; useful for latency triage.
        const FAST         = 1 << 5;
        /// The command must not be echoed to monitor sessions at dispatch
        /// time (`EXEC` is replayed after its batch instead).
        const SKIP_MONITOR = 1 << 6;
        /// The command's output is not a deterministic function of the keyspace.
        const RANDOM       = 1 << 7;
    }
}

/// Represents the outcome of a write operation, used to determine if
/// propagation to AOF/replicas is necessary and to update the dirty key counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The command did not modify any data.
    DidNotWrite,
    /// The command modified one or more keys.
    Write { keys_modified: u64 },
    /// The command deleted one or more keys.
    Delete { keys_deleted: u64 },
    /// The command flushed one or all databases.
    Flush,
}

impl WriteOutcome {
    /// The number of keys this outcome touched, for dirty-counter accounting.
    pub fn keys_changed(&self) -> u64 {
        match self {
            WriteOutcome::DidNotWrite => 0,
            WriteOutcome::Write { keys_modified } => *keys_modified,
            WriteOutcome::Delete { keys_deleted } => *keys_deleted,
            WriteOutcome::Flush => 0,
        }
    }
}

/// A composite trait combining everything the dispatcher needs from a command.
/// It is implemented on the main `Command` enum.
#[async_trait]
pub trait CommandExt {
    /// Returns the flags for the command.
    fn get_flags(&self) -> CommandFlags;
    /// Extracts the keys from the command's arguments.
    fn get_keys(&self) -> Vec<Bytes>;

    /// Executes the command within a given `ExecutionContext`.
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError>;
}

/// A trait for the actual execution logic of a command.
/// Implemented by each command's struct (e.g., `Get`, `Set`).
#[async_trait]
pub trait ExecutableCommand {
    /// The core logic for the command's execution.
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), ZirconDBError>;
}

/// A trait for parsing a command's arguments from a slice of `RespFrame`.
pub trait ParseCommand: Sized {
    /// Parses the arguments and returns an instance of the command struct.
    fn parse(args: &[crate::core::protocol::RespFrame]) -> Result<Self, ZirconDBError>;
}
