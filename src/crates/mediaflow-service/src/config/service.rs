//! Typed configuration for a `mediaflow-service` deployment.
//!
//! Loaded via [`crate::config::load_yaml_config`] from a YAML file (with
//! `$include` and `${ENV:default}` support), the way the teacher loads its
//! own server configuration.

use serde::{Deserialize, Serialize};

use crate::RetryPolicy;
use crate::config::loader::load_yaml_config;
use crate::{Result, ServiceError};

fn default_pool_size() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level configuration for a running instance: where the database
/// lives, how large its connection pool is, how verbosely to log, and the
/// default retry policy the service's own adapters apply to transient
/// database errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub database_url: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub retry_policy: RetryPolicy,
}

impl ServiceConfig {
    /// Load from a YAML file, applying `$include` resolution and
    /// `${ENV:default}` expansion before deserializing.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        load_yaml_config(path)
    }

    /// Load from the `CONFIG_PATH` environment variable, falling back to
    /// `./config/mediaflow-service.yaml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| "config/mediaflow-service.yaml".to_string());
        Self::from_file(path).map_err(|e| match e {
            ServiceError::Config(msg) => {
                ServiceError::Config(format!("loading {path}: {msg}", path = path, msg = msg))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_url: \"sqlite://mediaflow.db\"").unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database_url, "sqlite://mediaflow.db");
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn honors_explicit_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database_url: \"sqlite://mediaflow.db\"\npool_size: 25\nlog_level: \"debug\""
        )
        .unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.pool_size, 25);
        assert_eq!(config.log_level, "debug");
    }
}
