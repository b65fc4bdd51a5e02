//! Configuration module - list settings and startup queries
//!
//! This module provides functionality for:
//! - Loading configuration from `<config dir>/saved-searches/config.json`
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (Config, CountsConfig, etc.)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_COUNT_TIMEOUT_MS, DEFAULT_EXCLUDED_TAGS, DEFAULT_PAGE_STEP};

pub use types::{default_config_path, default_data_dir, Config, CountsConfig, StartupConfig};

pub use loader::load_config;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
