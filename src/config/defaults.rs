//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Startup queries shown when the config has none
pub const DEFAULT_STARTUP_QUERIES: &[(&str, &str)] = &[("inbox", "tag:inbox")];

/// Tags whose messages are left out of every count
pub const DEFAULT_EXCLUDED_TAGS: &[&str] = &["muted", "spam", "deleted"];

/// notmuch binary used for counting
pub const DEFAULT_NOTMUCH_PATH: &str = "notmuch";

/// Upper bound for a single count query
pub const DEFAULT_COUNT_TIMEOUT_MS: u64 = 5000;

/// Count worker threads when counting in the background
pub const DEFAULT_COUNT_WORKERS: usize = 2;

/// Rows scrolled by page up/down
pub const DEFAULT_PAGE_STEP: usize = 10;

/// Application directory name under the platform config/data dirs
pub const APP_DIR_NAME: &str = "saved-searches";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Saved-search document file name
pub const SEARCHES_FILE_NAME: &str = "searches.json";
