// src/core/commands/generic/mod.rs

pub mod client;
pub mod config;
pub mod dbsize;
pub mod del;
pub mod echo;
pub mod exists;
pub mod expire;
pub mod flush;
pub mod object;
pub mod ping;
pub mod replicaof;
pub mod select;
pub mod slowlog;
pub mod type_cmd;
pub mod unwatch;
pub mod watch;

pub use client::Client;
pub use config::ConfigGetSet;
pub use dbsize::DbSize;
pub use del::Del;
pub use echo::Echo;
pub use exists::Exists;
pub use expire::{Expire, Ttl};
pub use flush::{FlushAll, FlushDb};
pub use object::ObjectInfo;
pub use ping::Ping;
pub use replicaof::Replicaof;
pub use select::Select;
pub use slowlog::Slowlog;
pub use type_cmd::TypeInfo;
pub use unwatch::Unwatch;
pub use watch::Watch;
