//! Configuration loading from file system

use std::path::Path;

use tracing::{info, instrument, warn};

use super::types::Config;

/// Load configuration from a JSON file.
///
/// Returns `Config::default()` if the file is missing or unreadable, so a
/// broken config never takes the list down.
#[instrument(name = "load_config", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Config {
    if !path.exists() {
        info!("Config file not found, using defaults");
        return Config::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, "Failed to read config file, using defaults");
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(config) => {
            info!(
                startup_queries = config.startup.queries.len(),
                "Successfully loaded config"
            );
            config
        }
        Err(e) => {
            let hint = if e.to_string().contains("invalid type") {
                "\n\nHint: startup queries are an object of name -> query string, e.g.\n\
                 { \"startup\": { \"queries\": { \"inbox\": \"tag:inbox\" } } }"
            } else {
                ""
            };
            warn!(error = %e, hint = %hint, "Failed to parse config JSON, using defaults");
            Config::default()
        }
    }
}
