// src/core/commands/command_spec.rs

//! The static description every command carries alongside its execution logic.

use crate::core::commands::command_trait::CommandFlags;
use bytes::Bytes;

/// Static metadata for a parsed command.
///
/// `arity` follows the usual convention: a positive value is exact (including
/// the command name), a negative value `-N` means "at least N".
pub trait CommandSpec {
    fn name(&self) -> &'static str;
    fn arity(&self) -> i64;
    fn flags(&self) -> CommandFlags;
    /// The keys this invocation operates on.
    fn get_keys(&self) -> Vec<Bytes> {
        vec![]
    }
    /// The argument vector (without the command name) for propagation and
    /// monitor formatting.
    fn to_resp_args(&self) -> Vec<Bytes>;
}
