//! Application configuration module.
//!
//! Manages the TOML config file holding endpoint overrides and the
//! request pacing used by the catalog dispatcher and batch resolver.

#[allow(clippy::module_inception)]
mod config;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, resolve_config_path};
