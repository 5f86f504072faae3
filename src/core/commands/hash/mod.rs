// src/core/commands/hash/mod.rs

pub mod hget;
pub mod hset;

pub use hget::HGet;
pub use hset::HSet;
