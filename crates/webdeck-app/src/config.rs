//! TOML settings file. Every field has a default, so a missing or
//! partial file works out of the box; an unreadable file degrades to
//! defaults with a warning.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds a frame may load before it is presumed blocked.
    pub blocked_timeout_secs: u64,
    /// Clipboard history capacity.
    pub clipboard_history_limit: usize,
    /// Default tracing filter directive.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blocked_timeout_secs: 6,
            clipboard_history_limit: 50,
            log_filter: "webdeck=info".to_string(),
        }
    }
}

/// Platform path of the settings file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("webdeck").join("config.toml"))
}

/// Load settings from the default path, falling back to defaults when
/// the file is absent or unreadable.
pub fn load_settings() -> Settings {
    let Some(path) = config_path() else {
        return Settings::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_settings(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "settings unreadable, using defaults");
            Settings::default()
        }
    }
}

fn parse_settings(contents: &str) -> Settings {
    match toml::from_str(contents) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "settings parse error, using defaults");
            Settings::default()
        }
    }
}
