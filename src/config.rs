// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default number of numbered databases.
fn default_databases() -> usize {
    16
}

/// Commands at or above this many microseconds are retained in the slow log.
fn default_slowlog_threshold() -> i64 {
    10_000
}

fn default_slowlog_max_len() -> usize {
    128
}

fn default_replica_read_only() -> bool {
    true
}

/// Configuration of the slow-query log.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SlowlogConfig {
    /// Threshold in microseconds; a negative value disables logging.
    #[serde(default = "default_slowlog_threshold")]
    pub log_slower_than: i64,
    /// Retention bound for the log.
    #[serde(default = "default_slowlog_max_len")]
    pub max_len: usize,
}

impl Default for SlowlogConfig {
    fn default() -> Self {
        Self {
            log_slower_than: default_slowlog_threshold(),
            max_len: default_slowlog_max_len(),
        }
    }
}

/// Configuration of the replication subsystem.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReplicationConfig {
    /// When acting as a replica, reject writes from ordinary clients.
    #[serde(default = "default_replica_read_only")]
    pub replica_read_only: bool,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            replica_read_only: default_replica_read_only(),
        }
    }
}

/// Configuration of the persistence subsystem.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PersistenceConfig {
    /// When enabled, the propagation sink hands records to the AOF channel.
    #[serde(default)]
    pub aof_enabled: bool,
}

/// The server's runtime configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_databases")]
    pub databases: usize,
    #[serde(default)]
    pub slowlog: SlowlogConfig,
    #[serde(default)]
    pub replication: ReplicationConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            databases: default_databases(),
            slowlog: SlowlogConfig::default(),
            replication: ReplicationConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file, falling back to defaults for
    /// anything the file leaves out.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("failed to read config file '{path}'"))?;
        let cfg: Config = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse config file '{path}'"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.databases == 0 {
            return Err(anyhow!("'databases' must be at least 1"));
        }
        Ok(())
    }
}
