//! Configuration type definitions
//!
//! This module contains all the struct and enum definitions for configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::defaults::*;
use crate::builder::StartupQuerySource;
use crate::entry::NamedQuery;

// ============================================
// STARTUP CONFIG
// ============================================

/// The `startup` namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    /// name -> query, in display order
    #[serde(default = "default_startup_queries")]
    pub queries: Map<String, Value>,
}

fn default_startup_queries() -> Map<String, Value> {
    DEFAULT_STARTUP_QUERIES
        .iter()
        .map(|(name, query)| (name.to_string(), Value::String(query.to_string())))
        .collect()
}

impl Default for StartupConfig {
    fn default() -> Self {
        StartupConfig {
            queries: default_startup_queries(),
        }
    }
}

// ============================================
// COUNTS CONFIG
// ============================================

/// How message counts are obtained
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsConfig {
    /// notmuch binary (default: "notmuch")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notmuch_path: Option<String>,
    /// notmuch config file passed as `--config=` (default: notmuch's own lookup)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Per-query timeout in milliseconds (default: 5000)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Count on worker threads instead of during the rebuild (default: false)
    #[serde(default)]
    pub background: bool,
    /// Worker threads for background counting (default: 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl CountsConfig {
    pub fn get_notmuch_path(&self) -> String {
        self.notmuch_path
            .clone()
            .unwrap_or_else(|| DEFAULT_NOTMUCH_PATH.to_string())
    }

    pub fn get_database(&self) -> Option<PathBuf> {
        self.database.as_deref().map(expand_path)
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_COUNT_TIMEOUT_MS))
    }

    pub fn get_workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_COUNT_WORKERS).max(1)
    }
}

// ============================================
// CONFIG
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub startup: StartupConfig,
    /// Saved-search document location (tilde expanded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searches_file: Option<String>,
    #[serde(default = "default_excluded_tags")]
    pub excluded_tags: Vec<String>,
    #[serde(default)]
    pub counts: CountsConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_step: Option<usize>,
}

fn default_excluded_tags() -> Vec<String> {
    DEFAULT_EXCLUDED_TAGS.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            startup: StartupConfig::default(),
            searches_file: None,
            excluded_tags: default_excluded_tags(),
            counts: CountsConfig::default(),
            page_step: None,
        }
    }
}

impl Config {
    /// Startup queries in configured order.
    ///
    /// Entries whose value is not a string are skipped with a warning.
    pub fn get_startup_queries(&self) -> Vec<NamedQuery> {
        self.startup
            .queries
            .iter()
            .filter_map(|(name, value)| match value {
                Value::String(query) => Some(NamedQuery::new(name.clone(), query.clone())),
                other => {
                    warn!(name = %name, value = %other, "Ignoring non-string startup query");
                    None
                }
            })
            .collect()
    }

    /// Returns the saved-search document path, or the platform data dir default
    pub fn get_searches_file(&self) -> PathBuf {
        match &self.searches_file {
            Some(path) => expand_path(path),
            None => default_data_dir().join(SEARCHES_FILE_NAME),
        }
    }

    pub fn get_page_step(&self) -> usize {
        self.page_step.unwrap_or(DEFAULT_PAGE_STEP).max(1)
    }
}

impl StartupQuerySource for Config {
    fn startup_queries(&self) -> Vec<NamedQuery> {
        self.get_startup_queries()
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// `<data dir>/saved-searches`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

/// `<config dir>/saved-searches/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}
