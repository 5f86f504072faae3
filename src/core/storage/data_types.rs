// src/core/storage/data_types.rs

//! Defines the core data structures for storing values in the database,
//! such as `StoredValue` and the `DataValue` enum.

use crate::core::storage::zset::SortedSet;
use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::time::Instant;

/// A hard limit on the size of a single string value to prevent DoS via excessive allocation.
pub const MAX_STRING_SIZE: usize = 512 * 1024 * 1024; // 512MB

/// Strings at or below this length are reported with the compact `embstr` encoding.
const EMBSTR_SIZE_LIMIT: usize = 44;

/// The representation hint attached to every stored value.
///
/// ZirconDB stores all variants behind the same enum, so the encoding is purely
/// an observability hint (surfaced by `OBJECT ENCODING`), recomputed whenever a
/// value is created or rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    /// A string that parses as a 64-bit signed integer.
    Int,
    /// A short string, stored inline in the original implementation.
    Embstr,
    /// An arbitrary byte string.
    Raw,
    /// A small list/hash representation.
    Listpack,
    /// A hash-table backed collection.
    Hashtable,
    /// The sorted-set representation.
    Skiplist,
}

impl ValueEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueEncoding::Int => "int",
            ValueEncoding::Embstr => "embstr",
            ValueEncoding::Raw => "raw",
            ValueEncoding::Listpack => "listpack",
            ValueEncoding::Hashtable => "hashtable",
            ValueEncoding::Skiplist => "skiplist",
        }
    }
}

/// The typed payload of a key.
#[derive(Debug, Clone)]
pub enum DataValue {
    String(Bytes),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    Hash(IndexMap<Bytes, Bytes>),
    SortedSet(SortedSet),
}

impl DataValue {
    /// The type name reported by the `TYPE` command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::String(_) => "string",
            DataValue::List(_) => "list",
            DataValue::Set(_) => "set",
            DataValue::Hash(_) => "hash",
            DataValue::SortedSet(_) => "zset",
        }
    }

    /// Derives the representation hint for this payload.
    pub fn encoding(&self) -> ValueEncoding {
        match self {
            DataValue::String(b) => {
                if !b.is_empty() && std::str::from_utf8(b).is_ok_and(|s| s.parse::<i64>().is_ok())
                {
                    ValueEncoding::Int
                } else if b.len() <= EMBSTR_SIZE_LIMIT {
                    ValueEncoding::Embstr
                } else {
                    ValueEncoding::Raw
                }
            }
            DataValue::List(_) => ValueEncoding::Listpack,
            DataValue::Set(_) => ValueEncoding::Hashtable,
            DataValue::Hash(_) => ValueEncoding::Hashtable,
            DataValue::SortedSet(_) => ValueEncoding::Skiplist,
        }
    }

    /// Returns an estimate of the heap memory consumed by this payload, in bytes.
    pub fn memory_usage(&self) -> usize {
        match self {
            DataValue::String(b) => b.len(),
            DataValue::List(items) => items.iter().map(Bytes::len).sum(),
            DataValue::Set(members) => members.iter().map(Bytes::len).sum(),
            DataValue::Hash(fields) => fields.iter().map(|(k, v)| k.len() + v.len()).sum(),
            DataValue::SortedSet(zset) => zset.memory_usage(),
        }
    }
}

/// A wrapper for all values stored in the database, containing the data and metadata.
#[derive(Debug, Clone)]
pub struct StoredValue {
    pub data: DataValue,
    /// The representation hint, recomputed on every write through `update()`.
    pub encoding: ValueEncoding,
    /// The calculated size of the `data` field in bytes.
    pub size: usize,
    /// Access stamp for idle-time reporting and eviction heuristics.
    pub last_access: Instant,
}

impl StoredValue {
    /// Creates a new `StoredValue` with freshly computed metadata.
    pub fn new(data: DataValue) -> Self {
        let encoding = data.encoding();
        let size = data.memory_usage();
        Self {
            data,
            encoding,
            size,
            last_access: Instant::now(),
        }
    }

    /// Recomputes the metadata after an in-place mutation of `data`.
    pub fn update_metadata(&mut self) {
        self.encoding = self.data.encoding();
        self.size = self.data.memory_usage();
        self.last_access = Instant::now();
    }

    /// Marks the value as accessed without changing it.
    pub fn touch_access(&mut self) {
        self.last_access = Instant::now();
    }

    /// Seconds since the value was last read or written.
    pub fn idle_secs(&self) -> u64 {
        self.last_access.elapsed().as_secs()
    }

    /// Returns the total memory usage of this stored value in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.size
    }
}
