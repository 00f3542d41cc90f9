//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, DatabaseConfig, NetworkConfig)
//! - [`history`]: History writer and lookup configuration (HistoryConfig)
//! - [`validation`]: Startup checks that report every problem at once

mod history;
mod types;
mod validation;

pub use history::HistoryConfig;
pub use types::{Config, ConfigError, DatabaseConfig, EngineConfig, LogConfig, LogFormat, NetworkConfig};
pub use validation::{ValidationError, validate};
