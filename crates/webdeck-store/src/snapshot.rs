//! Versioned persisted snapshot of the catalog and session.
//!
//! Stored as JSON under the `web-os` key. Anything that fails to parse
//! falls back to the default empty state; restore never errors out of
//! the session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use webdeck_common::{AppId, AppItem};

/// Storage key the snapshot lives under.
pub const SNAPSHOT_KEY: &str = "web-os";
/// Current schema version of the envelope.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The durable subset of shell state. Frame records and transient load
/// state are never part of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub apps: Vec<AppItem>,
    #[serde(default, rename = "openApps")]
    pub open_apps: Vec<AppId>,
    #[serde(default, rename = "activeApp")]
    pub active_app: Option<AppId>,
    #[serde(default = "default_lru_limit", rename = "lruLimit")]
    pub lru_limit: usize,
    #[serde(default)]
    pub zoom: HashMap<AppId, f64>,
}

fn default_lru_limit() -> usize {
    crate::session::DEFAULT_LRU_LIMIT
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            apps: Vec::new(),
            open_apps: Vec::new(),
            active_app: None,
            lru_limit: default_lru_limit(),
            zoom: HashMap::new(),
        }
    }
}

/// Envelope carrying the schema version alongside the state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub version: u32,
    pub state: Snapshot,
}

impl SnapshotEnvelope {
    pub fn new(state: Snapshot) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            warn!(error = %e, "snapshot serialization failed");
            format!("{{\"version\":{SNAPSHOT_VERSION},\"state\":{{}}}}")
        })
    }

    /// Parse a stored snapshot. `None` input (nothing stored) and any
    /// parse failure both yield the default empty state.
    pub fn parse(raw: Option<&str>) -> Snapshot {
        let Some(raw) = raw else {
            return Snapshot::default();
        };
        match serde_json::from_str::<SnapshotEnvelope>(raw) {
            Ok(envelope) => envelope.state,
            Err(e) => {
                warn!(error = %e, "snapshot unreadable, starting empty");
                Snapshot::default()
            }
        }
    }
}
