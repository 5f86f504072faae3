// src/core/commands/helpers.rs

//! Small parsing helpers shared by the command implementations.

use crate::core::ZirconDBError;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// Extracts the raw bytes of a bulk-string argument.
pub fn extract_bytes(frame: &RespFrame) -> Result<Bytes, ZirconDBError> {
    match frame {
        RespFrame::BulkString(b) => Ok(b.clone()),
        RespFrame::SimpleString(s) => Ok(Bytes::from(s.clone())),
        _ => Err(ZirconDBError::WrongType),
    }
}

/// Extracts an argument as an owned UTF-8 string.
pub fn extract_string(frame: &RespFrame) -> Result<String, ZirconDBError> {
    let bytes = extract_bytes(frame)?;
    Ok(std::str::from_utf8(&bytes)?.to_string())
}

/// Parses an argument as a signed 64-bit integer.
pub fn extract_i64(frame: &RespFrame) -> Result<i64, ZirconDBError> {
    let s = extract_string(frame)?;
    s.parse().map_err(|_| ZirconDBError::NotAnInteger)
}

/// Parses an argument as a 64-bit float.
pub fn extract_f64(frame: &RespFrame) -> Result<f64, ZirconDBError> {
    let s = extract_string(frame)?;
    s.parse().map_err(|_| ZirconDBError::NotAFloat)
}

/// Parses a byte slice holding a decimal integer (the stored-string case).
pub fn parse_stored_i64(bytes: &Bytes) -> Result<i64, ZirconDBError> {
    std::str::from_utf8(bytes)
        .map_err(|_| ZirconDBError::NotAnInteger)?
        .parse()
        .map_err(|_| ZirconDBError::NotAnInteger)
}
