//! Shared configuration and environment-variable helpers for the mediaflow
//! workspace.
//!
//! # Config (`config`)
//!
//! Configuration management utilities for environment variables and file loading:
//!
//! ```rust,ignore
//! use utils::config::{get_env, get_env_parse, load_config_file};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct AppConfig {
//!     api_key: String,
//!     port: u16,
//! }
//!
//! // Load from environment
//! let api_key = get_env("API_KEY")?;
//! let port = get_env_parse::<u16>("PORT")?;
//!
//! // Load from file
//! let config: AppConfig = load_config_file("config.yaml")?;
//! ```
//!
//! HTTP server and client utilities were dropped from this crate: this
//! engine has no HTTP routing or outbound HTTP surface (see DESIGN.md).
//!
//! # Features
//!
//! - `config` - Configuration utilities (enabled by default)

pub mod error;

#[cfg(feature = "config")]
pub mod config;

// Re-export commonly used types
pub use error::{Result, UtilsError};

#[cfg(feature = "config")]
pub use config::{
    get_env, get_env_bool, get_env_bool_or, get_env_or, get_env_parse, get_env_parse_or,
    load_config_file, load_json_config, load_yaml_config, ConfigBuilder, FromEnv, ValidateConfig,
};

