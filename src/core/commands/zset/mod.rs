// src/core/commands/zset/mod.rs

pub mod zadd;
pub mod zscore;

pub use zadd::ZAdd;
pub use zscore::ZScore;
