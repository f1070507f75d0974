//! `ShellStore` — the catalog and session behind one service object.
//!
//! Every mutating operation persists the snapshot before returning.
//! Persistence failures are absorbed (logged at warn); the in-memory
//! session stays authoritative for the lifetime of the process.

use std::collections::HashMap;

use tracing::{debug, warn};

use webdeck_common::{AppId, AppItem, ValidationError};

use crate::registry::{AppPatch, AppRegistry};
use crate::session::SessionState;
use crate::snapshot::{Snapshot, SnapshotEnvelope, SNAPSHOT_KEY};
use crate::storage::StorageBackend;

pub struct ShellStore {
    registry: AppRegistry,
    session: SessionState,
    backend: Box<dyn StorageBackend>,
}

impl ShellStore {
    /// Restore a store from the backend's snapshot. Session ids with no
    /// catalog entry are pruned, never surfaced as errors.
    pub fn load(backend: Box<dyn StorageBackend>) -> Self {
        let raw = match backend.load(SNAPSHOT_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "snapshot read failed, starting empty");
                None
            }
        };
        let snapshot = SnapshotEnvelope::parse(raw.as_deref());

        let registry = AppRegistry::from_apps(snapshot.apps);
        let mut session = SessionState::restore(
            snapshot.open_apps,
            snapshot.active_app,
            snapshot.lru_limit,
            snapshot.zoom,
        );
        session.prune(|id| registry.contains(id));

        Self {
            registry,
            session,
            backend,
        }
    }

    /// An empty store over the given backend (ignores stored state).
    pub fn empty(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            registry: AppRegistry::new(),
            session: SessionState::new(),
            backend,
        }
    }

    // --- catalog ---

    /// Register an app. Validation happens before any state mutation.
    pub fn add_app(
        &mut self,
        name: Option<&str>,
        url: &str,
        icon: Option<String>,
    ) -> Result<AppId, ValidationError> {
        let id = self.registry.add(name, url, icon, now_ms())?;
        self.persist();
        Ok(id)
    }

    /// Patch an app. Editing the URL of an open app is picked up by the
    /// frame host on the next reconciliation (explicit re-source).
    pub fn edit_app(&mut self, id: &AppId, patch: AppPatch) -> Result<(), ValidationError> {
        self.registry.edit(id, patch)?;
        self.persist();
        Ok(())
    }

    /// Delete an app and cascade it out of the session.
    pub fn delete_app(&mut self, id: &AppId) -> bool {
        let existed = self.registry.delete(id);
        if existed {
            self.session.remove_refs(id);
            self.persist();
        }
        existed
    }

    // --- session ---

    /// Open or re-activate an app. Returns the ids evicted by the LRU
    /// bound so their surfaces can be torn down.
    pub fn open_app(&mut self, id: &AppId) -> Vec<AppId> {
        if !self.registry.contains(id) {
            warn!(id = %id, "open ignored for unknown app");
            return Vec::new();
        }
        let evicted = self.session.open(id.clone());
        self.registry.touch(id, now_ms());
        self.persist();
        debug!(id = %id, "app opened");
        evicted
    }

    pub fn close_app(&mut self, id: &AppId) {
        self.session.close(id);
        self.persist();
    }

    /// Activate an open app (counts as a use) or navigate home (`None`).
    pub fn set_active(&mut self, id: Option<&AppId>) -> Vec<AppId> {
        match id {
            Some(id) if self.registry.contains(id) => {
                let evicted = self.session.set_active(Some(id.clone()));
                self.registry.touch(id, now_ms());
                self.persist();
                evicted
            }
            Some(id) => {
                warn!(id = %id, "activate ignored for unknown app");
                Vec::new()
            }
            None => {
                self.session.set_active(None);
                self.persist();
                Vec::new()
            }
        }
    }

    pub fn set_zoom(&mut self, id: &AppId, z: f64) {
        self.session.set_zoom(id.clone(), z);
        self.persist();
    }

    pub fn get_zoom(&self, id: &AppId) -> f64 {
        self.session.get_zoom(id)
    }

    /// Change the open-app bound (eager eviction, see `SessionState`).
    pub fn set_lru_limit(&mut self, n: usize) -> Vec<AppId> {
        let evicted = self.session.set_lru_limit(n);
        self.persist();
        evicted
    }

    // --- reads ---

    pub fn apps(&self) -> &[AppItem] {
        self.registry.apps()
    }

    pub fn get_app(&self, id: &AppId) -> Option<&AppItem> {
        self.registry.get(id)
    }

    pub fn apps_by_id(&self) -> HashMap<AppId, &AppItem> {
        self.registry.apps_by_id()
    }

    pub fn open_apps(&self) -> &[AppId] {
        self.session.open_apps()
    }

    pub fn active(&self) -> Option<&AppId> {
        self.session.active()
    }

    pub fn lru_limit(&self) -> usize {
        self.session.lru_limit()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            apps: self.registry.apps().to_vec(),
            open_apps: self.session.open_apps().to_vec(),
            active_app: self.session.active().cloned(),
            lru_limit: self.session.lru_limit(),
            zoom: self.session.zoom_map().clone(),
        }
    }

    fn persist(&mut self) {
        let json = SnapshotEnvelope::new(self.snapshot()).to_json();
        if let Err(e) = self.backend.save(SNAPSHOT_KEY, &json) {
            warn!(error = %e, "snapshot write failed");
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> ShellStore {
        ShellStore::load(Box::new(MemoryStorage::new()))
    }

    fn add(store: &mut ShellStore, name: &str) -> AppId {
        store
            .add_app(Some(name), &format!("https://{name}.example.com"), None)
            .unwrap()
    }

    #[test]
    fn add_rejects_bad_url_without_mutation() {
        let mut s = store();
        assert!(s.add_app(None, "not-a-url", None).is_err());
        assert!(s.apps().is_empty());
    }

    #[test]
    fn open_unknown_id_is_ignored() {
        let mut s = store();
        let evicted = s.open_app(&AppId::from("ghost"));
        assert!(evicted.is_empty());
        assert!(s.open_apps().is_empty());
    }

    #[test]
    fn open_at_capacity_evicts_lru() {
        let mut s = store();
        s.set_lru_limit(2);
        let a = add(&mut s, "a");
        let b = add(&mut s, "b");
        let c = add(&mut s, "c");
        s.open_app(&a);
        s.open_app(&b);
        let evicted = s.open_app(&c);
        assert_eq!(evicted, vec![a]);
        assert_eq!(s.open_apps(), &[b, c.clone()]);
        assert_eq!(s.active(), Some(&c));
    }

    #[test]
    fn open_refreshes_last_opened() {
        let mut s = store();
        let a = add(&mut s, "a");
        let before = s.get_app(&a).unwrap().last_opened;
        std::thread::sleep(std::time::Duration::from_millis(2));
        s.open_app(&a);
        assert!(s.get_app(&a).unwrap().last_opened >= before);
    }

    #[test]
    fn delete_cascades_everywhere() {
        let mut s = store();
        let a = add(&mut s, "a");
        let b = add(&mut s, "b");
        s.open_app(&a);
        s.open_app(&b);
        s.set_zoom(&b, 1.5);

        assert!(s.delete_app(&b));
        assert!(s.get_app(&b).is_none());
        assert_eq!(s.open_apps(), &[a.clone()]);
        assert_eq!(s.active(), Some(&a));
        assert_eq!(s.get_zoom(&b), 1.0);
    }

    #[test]
    fn closing_active_promotes_previous() {
        let mut s = store();
        let w = add(&mut s, "w");
        let z = add(&mut s, "z");
        s.open_app(&w);
        s.open_app(&z);
        s.close_app(&z);
        assert_eq!(s.active(), Some(&w));
    }

    #[test]
    fn state_survives_reload_round_trip() {
        let mut backend = MemoryStorage::new();
        let (a, b);
        {
            let mut s = ShellStore::load(Box::new(MemoryStorage::new()));
            a = add(&mut s, "a");
            b = add(&mut s, "b");
            s.open_app(&a);
            s.open_app(&b);
            s.set_zoom(&a, 0.8);
            // Copy the persisted payload over to the second backend.
            let json = SnapshotEnvelope::new(s.snapshot()).to_json();
            backend.save(SNAPSHOT_KEY, &json).unwrap();
        }

        let s = ShellStore::load(Box::new(backend));
        assert_eq!(s.apps().len(), 2);
        assert_eq!(s.open_apps(), &[a.clone(), b.clone()]);
        assert_eq!(s.active(), Some(&b));
        assert_eq!(s.get_zoom(&a), 0.8);
        assert_eq!(s.lru_limit(), 4);
    }

    #[test]
    fn load_prunes_dangling_session_ids() {
        let mut backend = MemoryStorage::new();
        let snap = Snapshot {
            apps: Vec::new(),
            open_apps: vec![AppId::from("gone")],
            active_app: Some(AppId::from("gone")),
            lru_limit: 4,
            zoom: HashMap::from([(AppId::from("gone"), 2.0)]),
        };
        backend
            .save(SNAPSHOT_KEY, &SnapshotEnvelope::new(snap).to_json())
            .unwrap();

        let s = ShellStore::load(Box::new(backend));
        assert!(s.open_apps().is_empty());
        assert_eq!(s.active(), None);
    }

    #[test]
    fn load_tolerates_corrupt_snapshot() {
        let mut backend = MemoryStorage::new();
        backend.save(SNAPSHOT_KEY, "][ nonsense").unwrap();
        let s = ShellStore::load(Box::new(backend));
        assert!(s.apps().is_empty());
        assert_eq!(s.lru_limit(), 4);
    }

    #[test]
    fn lower_limit_evicts_and_persists() {
        let mut s = store();
        let a = add(&mut s, "a");
        let b = add(&mut s, "b");
        let c = add(&mut s, "c");
        s.open_app(&a);
        s.open_app(&b);
        s.open_app(&c);
        let evicted = s.set_lru_limit(1);
        assert_eq!(evicted, vec![a, b]);
        assert_eq!(s.open_apps(), &[c]);
    }
}
