//! Configuration for the network core

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Network core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Metrics listen address
    pub metrics_listen_addr: String,

    /// Default country for affiliate codes when a request omits one
    pub default_country: String,

    /// Command mailbox capacity for the single-writer actor
    pub mailbox_capacity: usize,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/network"),
            service_name: "network-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            metrics_listen_addr: "0.0.0.0:9090".to_string(),
            default_country: "SV".to_string(),
            mailbox_capacity: 1000,
            rocksdb: RocksDBConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 4,
            enable_statistics: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("NETWORK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(addr) = std::env::var("NETWORK_METRICS_ADDR") {
            config.metrics_listen_addr = addr;
        }

        if let Ok(country) = std::env::var("NETWORK_DEFAULT_COUNTRY") {
            config.default_country = country;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "network-core");
        assert_eq!(config.default_country, "SV");
        assert!(config.mailbox_capacity > 0);
    }

    #[test]
    fn test_from_toml() {
        let toml_str = r#"
            data_dir = "/tmp/net"
            service_name = "network-core"
            service_version = "0.1.0"
            metrics_listen_addr = "0.0.0.0:9100"
            default_country = "GT"
            mailbox_capacity = 64

            [rocksdb]
            write_buffer_size_mb = 32
            max_write_buffer_number = 2
            target_file_size_mb = 32
            max_background_jobs = 2
            enable_statistics = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_country, "GT");
        assert_eq!(config.rocksdb.write_buffer_size_mb, 32);
    }
}
