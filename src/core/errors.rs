// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
///
/// `Display` strings double as the RESP error payload sent back to clients,
/// so variants that map to a protocol error carry the wire-level prefix
/// (`ERR`, `WRONGTYPE`, `EXECABORT`, `READONLY`) in their message.
#[derive(Error, Debug)]
pub enum ZirconDBError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR syntax error")]
    SyntaxError,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR value is not a valid float")]
    NotAFloat,

    #[error("ERR increment or decrement would overflow")]
    Overflow,

    #[error("ERR {0}")]
    InvalidState(String),

    #[error("EXECABORT Transaction discarded because of previous errors.")]
    ExecAborted,

    #[error("READONLY {0}")]
    ReadOnly(String),

    #[error("ERR invalid DB index")]
    InvalidDbIndex,

    #[error("ERR Protocol error: {0}")]
    ProtocolError(String),

    #[error("Replication Error: {0}")]
    ReplicationError(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for ZirconDBError {
    fn clone(&self) -> Self {
        match self {
            ZirconDBError::Io(e) => ZirconDBError::Io(Arc::clone(e)),
            ZirconDBError::IncompleteData => ZirconDBError::IncompleteData,
            ZirconDBError::UnknownCommand(s) => ZirconDBError::UnknownCommand(s.clone()),
            ZirconDBError::SyntaxError => ZirconDBError::SyntaxError,
            ZirconDBError::WrongArgumentCount(s) => ZirconDBError::WrongArgumentCount(s.clone()),
            ZirconDBError::WrongType => ZirconDBError::WrongType,
            ZirconDBError::NotAnInteger => ZirconDBError::NotAnInteger,
            ZirconDBError::NotAFloat => ZirconDBError::NotAFloat,
            ZirconDBError::Overflow => ZirconDBError::Overflow,
            ZirconDBError::InvalidState(s) => ZirconDBError::InvalidState(s.clone()),
            ZirconDBError::ExecAborted => ZirconDBError::ExecAborted,
            ZirconDBError::ReadOnly(s) => ZirconDBError::ReadOnly(s.clone()),
            ZirconDBError::InvalidDbIndex => ZirconDBError::InvalidDbIndex,
            ZirconDBError::ProtocolError(s) => ZirconDBError::ProtocolError(s.clone()),
            ZirconDBError::ReplicationError(s) => ZirconDBError::ReplicationError(s.clone()),
            ZirconDBError::Internal(s) => ZirconDBError::Internal(s.clone()),
        }
    }
}

impl PartialEq for ZirconDBError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ZirconDBError::Io(e1), ZirconDBError::Io(e2)) => e1.to_string() == e2.to_string(),
            (ZirconDBError::UnknownCommand(s1), ZirconDBError::UnknownCommand(s2)) => s1 == s2,
            (ZirconDBError::WrongArgumentCount(s1), ZirconDBError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (ZirconDBError::InvalidState(s1), ZirconDBError::InvalidState(s2)) => s1 == s2,
            (ZirconDBError::ReadOnly(s1), ZirconDBError::ReadOnly(s2)) => s1 == s2,
            (ZirconDBError::ProtocolError(s1), ZirconDBError::ProtocolError(s2)) => s1 == s2,
            (ZirconDBError::ReplicationError(s1), ZirconDBError::ReplicationError(s2)) => s1 == s2,
            (ZirconDBError::Internal(s1), ZirconDBError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for ZirconDBError {
    fn from(e: std::io::Error) -> Self {
        ZirconDBError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for ZirconDBError {
    fn from(_: std::str::Utf8Error) -> Self {
        ZirconDBError::WrongType
    }
}

impl From<std::string::FromUtf8Error> for ZirconDBError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        ZirconDBError::WrongType
    }
}

impl From<ParseIntError> for ZirconDBError {
    fn from(_: ParseIntError) -> Self {
        ZirconDBError::NotAnInteger
    }
}

impl From<ParseFloatError> for ZirconDBError {
    fn from(_: ParseFloatError) -> Self {
        ZirconDBError::NotAFloat
    }
}
