//! The LRU-ordered open-app list and per-app zoom map.
//!
//! `open_apps` is ordered oldest-first; the tail is the most recently
//! activated app. Opening past `lru_limit` evicts from the front. All
//! mutations are synchronous and restore the invariants before
//! returning: no duplicate ids, length within the limit, and the active
//! pointer always a member of the list (or `None`).

use std::collections::HashMap;

use tracing::debug;

use webdeck_common::{clamp_zoom, AppId};

/// Default bound on concurrently open apps.
pub const DEFAULT_LRU_LIMIT: usize = 4;

#[derive(Debug, Clone)]
pub struct SessionState {
    open_apps: Vec<AppId>,
    active: Option<AppId>,
    lru_limit: usize,
    zoom: HashMap<AppId, f64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            open_apps: Vec::new(),
            active: None,
            lru_limit: DEFAULT_LRU_LIMIT,
            zoom: HashMap::new(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted parts. The limit is floored at 1 and the
    /// list is truncated from the front if the snapshot exceeds it.
    pub fn restore(
        open_apps: Vec<AppId>,
        active: Option<AppId>,
        lru_limit: usize,
        zoom: HashMap<AppId, f64>,
    ) -> Self {
        let mut state = Self {
            open_apps,
            active,
            lru_limit: lru_limit.max(1),
            zoom: zoom.into_iter().map(|(k, v)| (k, clamp_zoom(v))).collect(),
        };
        state.enforce_limit();
        if let Some(a) = &state.active {
            if !state.open_apps.contains(a) {
                state.active = None;
            }
        }
        state
    }

    /// Open (or re-activate) an app: move it to the most-recent
    /// position, make it active, and evict from the front past the
    /// limit. Returns the evicted ids so the frame host can tear their
    /// surfaces down.
    pub fn open(&mut self, id: AppId) -> Vec<AppId> {
        self.open_apps.retain(|x| *x != id);
        self.open_apps.push(id.clone());
        let evicted = self.enforce_limit();
        self.active = Some(id);
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "lru eviction");
        }
        evicted
    }

    /// Explicitly close an app. If it was active, the most recently
    /// used remaining app becomes active (or none).
    pub fn close(&mut self, id: &AppId) {
        self.open_apps.retain(|x| x != id);
        if self.active.as_ref() == Some(id) {
            self.active = self.open_apps.last().cloned();
        }
    }

    /// Set the active app. `Some(id)` counts as a "use" and re-ranks
    /// the id to the most-recent position; `None` (navigate home) only
    /// clears the pointer and closes nothing.
    pub fn set_active(&mut self, id: Option<AppId>) -> Vec<AppId> {
        match id {
            Some(id) => self.open(id),
            None => {
                self.active = None;
                Vec::new()
            }
        }
    }

    /// Change the open-app bound. Takes effect eagerly: the list is
    /// truncated from the front immediately. Returns the evicted ids.
    pub fn set_lru_limit(&mut self, n: usize) -> Vec<AppId> {
        self.lru_limit = n.max(1);
        let evicted = self.enforce_limit();
        if self
            .active
            .as_ref()
            .is_some_and(|a| !self.open_apps.contains(a))
        {
            self.active = self.open_apps.last().cloned();
        }
        evicted
    }

    pub fn set_zoom(&mut self, id: AppId, z: f64) {
        self.zoom.insert(id, clamp_zoom(z));
    }

    pub fn get_zoom(&self, id: &AppId) -> f64 {
        self.zoom.get(id).copied().unwrap_or(1.0)
    }

    /// Cascade removal of a deleted app: open list, zoom map, and the
    /// active pointer (replaced by the new tail, or cleared).
    pub fn remove_refs(&mut self, id: &AppId) {
        self.open_apps.retain(|x| x != id);
        self.zoom.remove(id);
        if self.active.as_ref() == Some(id) {
            self.active = self.open_apps.last().cloned();
        }
    }

    /// Drop any ids not accepted by `keep` (used when a snapshot
    /// references apps missing from the catalog).
    pub fn prune(&mut self, keep: impl Fn(&AppId) -> bool) {
        self.open_apps.retain(|id| keep(id));
        self.zoom.retain(|id, _| keep(id));
        if self.active.as_ref().is_some_and(|a| !keep(a)) {
            self.active = self.open_apps.last().cloned();
        }
    }

    pub fn open_apps(&self) -> &[AppId] {
        &self.open_apps
    }

    pub fn is_open(&self, id: &AppId) -> bool {
        self.open_apps.contains(id)
    }

    pub fn active(&self) -> Option<&AppId> {
        self.active.as_ref()
    }

    pub fn lru_limit(&self) -> usize {
        self.lru_limit
    }

    pub fn zoom_map(&self) -> &HashMap<AppId, f64> {
        &self.zoom
    }

    fn enforce_limit(&mut self) -> Vec<AppId> {
        let over = self.open_apps.len().saturating_sub(self.lru_limit);
        self.open_apps.drain(..over).collect()
    }
}
