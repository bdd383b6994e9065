//! Configuration for a `mediaflow-service` deployment.
//!
//! Provides the YAML loader (`$include` file composition and
//! `${ENV:default}` environment expansion, carried over near-verbatim from
//! the teacher) and the typed [`ServiceConfig`] it deserializes into.

pub mod loader;
pub mod service;

pub use loader::{deep_merge, load_yaml_config, load_yaml_file};
pub use service::ServiceConfig;
