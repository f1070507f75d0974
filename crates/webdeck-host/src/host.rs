//! `FrameHost` — reconciles live surfaces against the session and runs
//! the per-frame load/blocked state machine.
//!
//! The host observes the open-app set and active pointer (never the
//! other way around). Each reconciliation pass creates surfaces for
//! newly opened apps, destroys surfaces for closed apps, re-sources on
//! URL drift, reapplies zoom, and makes exactly the active surface
//! visible and interactive. Nothing in this path panics: a surface that
//! fails to create is skipped and logged, so one misbehaving app never
//! affects the others.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use webdeck_common::{AppId, Result, WebdeckError};

use crate::surface::{
    PermissionGrant, SandboxPolicy, Surface, SurfaceEvent, SurfaceFactory, SurfaceTransform,
};

/// How long a frame may stay `Loading` with no load signal before it is
/// presumed blocked (a site refusing to be embedded produces no error
/// event at all).
pub const BLOCKED_TIMEOUT: Duration = Duration::from_secs(6);

/// Load state of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Source assigned, no load signal yet.
    Loading,
    /// The surface's native load signal arrived.
    Loaded,
    /// The timeout elapsed while still loading; the target likely
    /// forbids embedding. A late load signal can still supersede this.
    Blocked,
}

/// What the host should be showing for one open app. Built by the shell
/// from the store on every reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    pub app_id: AppId,
    pub url: String,
    pub zoom: f64,
}

/// Host-owned, never persisted.
struct FrameRecord {
    surface: Box<dyn Surface>,
    load: LoadState,
    last_known_url: String,
    /// Armed while `Loading`; cleared on load, close, eviction, and as
    /// part of every re-source. A cleared deadline cannot fire.
    deadline: Option<Instant>,
    /// Cosmetic load progress in [0, 100].
    progress: f64,
    /// Zoom currently applied to the surface.
    zoom: f64,
}

pub struct FrameHost<F: SurfaceFactory> {
    factory: F,
    frames: HashMap<AppId, FrameRecord>,
    timeout: Duration,
    sandbox: SandboxPolicy,
    permissions: PermissionGrant,
}

impl<F: SurfaceFactory> FrameHost<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            frames: HashMap::new(),
            timeout: BLOCKED_TIMEOUT,
            sandbox: SandboxPolicy::default(),
            permissions: PermissionGrant::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Bring the live surfaces in line with the open-app set.
    pub fn reconcile(&mut self, specs: &[FrameSpec], active: Option<&AppId>, now: Instant) {
        // Tear down frames whose app left the open set. Dropping the
        // record drops the surface and its deadline together, so no
        // timeout can fire for a closed app afterwards.
        let closed: Vec<AppId> = self
            .frames
            .keys()
            .filter(|id| !specs.iter().any(|s| &s.app_id == *id))
            .cloned()
            .collect();
        for id in closed {
            self.frames.remove(&id);
            debug!(id = %id, "frame destroyed");
        }

        for spec in specs {
            if !self.frames.contains_key(&spec.app_id) {
                if let Err(e) = self.create_frame(spec, now) {
                    warn!(id = %spec.app_id, error = %e, "surface creation failed");
                }
                continue;
            }
            let timeout = self.timeout;
            if let Some(record) = self.frames.get_mut(&spec.app_id) {
                // Explicit re-source when the stored URL was edited.
                if record.last_known_url != spec.url {
                    debug!(id = %spec.app_id, url = %spec.url, "frame re-sourced");
                    Self::resource(record, &spec.url, now, timeout);
                }
                if record.zoom != spec.zoom {
                    record.zoom = spec.zoom;
                    record
                        .surface
                        .set_transform(SurfaceTransform::from_zoom(spec.zoom));
                }
            }
        }

        // Exactly the active frame is visible and interactive. This
        // never touches sources or load state, so embedded app state
        // survives switching.
        for (id, record) in self.frames.iter_mut() {
            let is_active = active == Some(id);
            record.surface.set_visible(is_active);
            record.surface.set_interactive(is_active);
        }
    }

    fn create_frame(&mut self, spec: &FrameSpec, now: Instant) -> Result<()> {
        let mut surface =
            self.factory
                .create(&spec.app_id, &spec.url, &self.sandbox, &self.permissions)?;
        surface.set_visible(false);
        surface.set_interactive(false);
        surface.set_transform(SurfaceTransform::from_zoom(spec.zoom));
        debug!(id = %spec.app_id, url = %spec.url, "frame created");
        self.frames.insert(
            spec.app_id.clone(),
            FrameRecord {
                surface,
                load: LoadState::Loading,
                last_known_url: spec.url.clone(),
                deadline: Some(now + self.timeout),
                progress: 0.0,
                zoom: spec.zoom,
            },
        );
        Ok(())
    }

    fn resource(record: &mut FrameRecord, url: &str, now: Instant, timeout: Duration) {
        record.surface.set_source(url);
        record.last_known_url = url.to_string();
        record.load = LoadState::Loading;
        record.progress = 0.0;
        record.deadline = Some(now + timeout);
    }

    /// Drain the factory's load events and apply them. Returns the
    /// applied events so the shell can publish notifications. Events
    /// for ids with no live frame are stale and dropped.
    pub fn process_events(&mut self) -> Vec<SurfaceEvent> {
        let events = self.factory.drain_events();
        let mut applied = Vec::new();
        for event in events {
            match &event {
                SurfaceEvent::Loaded { app_id } => {
                    let Some(record) = self.frames.get_mut(app_id) else {
                        continue;
                    };
                    // A late load signal clears an earlier Blocked verdict.
                    record.load = LoadState::Loaded;
                    record.deadline = None;
                    record.progress = 100.0;
                    debug!(id = %app_id, "frame loaded");
                }
                SurfaceEvent::LoadFailed { app_id } => {
                    let Some(record) = self.frames.get_mut(app_id) else {
                        continue;
                    };
                    record.load = LoadState::Blocked;
                    record.deadline = None;
                    debug!(id = %app_id, "frame load failed");
                }
            }
            applied.push(event);
        }
        applied
    }

    /// Fire `Loading -> Blocked` for frames whose deadline elapsed, and
    /// advance the cosmetic progress of frames still loading. Returns
    /// the newly blocked ids.
    pub fn poll_deadlines(&mut self, now: Instant) -> Vec<AppId> {
        let mut blocked = Vec::new();
        for (id, record) in self.frames.iter_mut() {
            if record.load == LoadState::Loading {
                // Asymptotic advance keeps the indicator monotonic and
                // strictly below 100 until the real load signal.
                record.progress += (95.0 - record.progress) * 0.15;
            }
            if let Some(deadline) = record.deadline {
                if now >= deadline && record.load == LoadState::Loading {
                    record.load = LoadState::Blocked;
                    record.deadline = None;
                    blocked.push(id.clone());
                    debug!(id = %id, "frame presumed blocked");
                }
            }
        }
        blocked
    }

    /// Blocked remedy: keep waiting. Clears the verdict but does not
    /// rearm the timeout; only a real load signal can resolve it now.
    pub fn keep_waiting(&mut self, id: &AppId) {
        if let Some(record) = self.frames.get_mut(id) {
            if record.load == LoadState::Blocked {
                record.load = LoadState::Loading;
                record.deadline = None;
            }
        }
    }

    /// Blocked remedy: retry. Re-sources the frame and rearms the
    /// timeout, returning it to `Loading`.
    pub fn retry(&mut self, id: &AppId, now: Instant) {
        let timeout = self.timeout;
        if let Some(record) = self.frames.get_mut(id) {
            let url = record.last_known_url.clone();
            Self::resource(record, &url, now, timeout);
        }
    }

    /// Blocked remedy: bypass embedding and open in a top-level context.
    pub fn open_external(&mut self, id: &AppId) -> Result<()> {
        let url = self
            .frames
            .get(id)
            .map(|r| r.last_known_url.clone())
            .ok_or_else(|| WebdeckError::UnknownApp(id.to_string()))?;
        self.factory.open_external(&url)
    }

    /// Explicit reload request: the given id, or the active app when
    /// the request carries none. Same path as a URL edit.
    pub fn reload(&mut self, id: Option<&AppId>, active: Option<&AppId>, now: Instant) {
        if let Some(target) = id.or(active) {
            self.retry(target, now);
        }
    }

    /// Reapply zoom to one frame without reloading it.
    pub fn set_zoom(&mut self, id: &AppId, zoom: f64) {
        if let Some(record) = self.frames.get_mut(id) {
            record.zoom = zoom;
            record.surface.set_transform(SurfaceTransform::from_zoom(zoom));
        }
    }

    pub fn load_state(&self, id: &AppId) -> Option<LoadState> {
        self.frames.get(id).map(|r| r.load)
    }

    /// Approximate load progress for one frame, in [0, 100].
    pub fn progress(&self, id: &AppId) -> Option<f64> {
        self.frames.get(id).map(|r| r.progress)
    }

    pub fn has_frame(&self, id: &AppId) -> bool {
        self.frames.contains_key(id)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Whether any deadline is armed for this id (test and status
    /// introspection).
    pub fn deadline_armed(&self, id: &AppId) -> bool {
        self.frames.get(id).is_some_and(|r| r.deadline.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessFactory, SurfaceOp};

    fn spec(id: &str, url: &str) -> FrameSpec {
        FrameSpec {
            app_id: AppId::from(id),
            url: url.to_string(),
            zoom: 1.0,
        }
    }

    fn host() -> FrameHost<HeadlessFactory> {
        FrameHost::new(HeadlessFactory::new())
    }

    #[test]
    fn reconcile_creates_and_destroys() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("a", "https://a.example.com/")], None, now);
        assert!(h.has_frame(&AppId::from("a")));
        assert_eq!(h.load_state(&AppId::from("a")), Some(LoadState::Loading));
        assert!(h.deadline_armed(&AppId::from("a")));

        h.reconcile(&[], None, now);
        assert!(!h.has_frame(&AppId::from("a")));
        assert!(h
            .factory()
            .ops()
            .iter()
            .any(|op| matches!(op, SurfaceOp::Destroyed { app_id } if app_id == &AppId::from("a"))));
    }

    #[test]
    fn only_active_frame_is_visible() {
        let mut h = host();
        let now = Instant::now();
        let specs = [
            spec("a", "https://a.example.com/"),
            spec("b", "https://b.example.com/"),
        ];
        h.reconcile(&specs, Some(&AppId::from("b")), now);

        let last_vis: Vec<_> = ["a", "b"]
            .iter()
            .map(|id| {
                h.factory()
                    .ops()
                    .iter()
                    .rev()
                    .find_map(|op| match op {
                        SurfaceOp::Visibility { app_id, visible }
                            if app_id == &AppId::from(*id) =>
                        {
                            Some(*visible)
                        }
                        _ => None,
                    })
                    .unwrap()
            })
            .collect();
        assert_eq!(last_vis, vec![false, true]);
    }

    #[test]
    fn switching_active_does_not_resource() {
        let mut h = host();
        let now = Instant::now();
        let specs = [
            spec("a", "https://a.example.com/"),
            spec("b", "https://b.example.com/"),
        ];
        h.reconcile(&specs, Some(&AppId::from("a")), now);
        h.factory().push_loaded(&AppId::from("a"));
        h.process_events();

        h.reconcile(&specs, Some(&AppId::from("b")), now);
        // Load state preserved across the visibility switch.
        assert_eq!(h.load_state(&AppId::from("a")), Some(LoadState::Loaded));
        assert_eq!(
            h.factory()
                .count_ops(|op| matches!(op, SurfaceOp::SourceSet { .. })),
            0
        );
    }

    #[test]
    fn url_edit_resources_exactly_once() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("y", "https://old.example.com/")], None, now);
        h.factory().push_loaded(&AppId::from("y"));
        h.process_events();

        h.reconcile(&[spec("y", "https://new.example.com/")], None, now);
        assert_eq!(h.load_state(&AppId::from("y")), Some(LoadState::Loading));
        assert!(h.deadline_armed(&AppId::from("y")));
        assert_eq!(
            h.factory().count_ops(|op| matches!(
                op,
                SurfaceOp::SourceSet { url, .. } if url == "https://new.example.com/"
            )),
            1
        );

        // Same URL again: no further re-source.
        h.reconcile(&[spec("y", "https://new.example.com/")], None, now);
        assert_eq!(
            h.factory()
                .count_ops(|op| matches!(op, SurfaceOp::SourceSet { .. })),
            1
        );
    }

    #[test]
    fn load_signal_clears_deadline() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("a", "https://a.example.com/")], None, now);
        h.factory().push_loaded(&AppId::from("a"));

        let events = h.process_events();
        assert_eq!(events.len(), 1);
        assert_eq!(h.load_state(&AppId::from("a")), Some(LoadState::Loaded));
        assert!(!h.deadline_armed(&AppId::from("a")));

        // Past the timeout, nothing fires.
        let blocked = h.poll_deadlines(now + Duration::from_secs(60));
        assert!(blocked.is_empty());
    }

    #[test]
    fn timeout_transitions_to_blocked() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("x", "https://x.example.com/")], None, now);

        assert!(h.poll_deadlines(now + Duration::from_secs(5)).is_empty());
        let blocked = h.poll_deadlines(now + Duration::from_secs(7));
        assert_eq!(blocked, vec![AppId::from("x")]);
        assert_eq!(h.load_state(&AppId::from("x")), Some(LoadState::Blocked));
        assert!(!h.deadline_armed(&AppId::from("x")));
    }

    #[test]
    fn retry_returns_to_loading_and_rearms() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("x", "https://x.example.com/")], None, now);
        h.poll_deadlines(now + Duration::from_secs(7));
        assert_eq!(h.load_state(&AppId::from("x")), Some(LoadState::Blocked));

        h.retry(&AppId::from("x"), now + Duration::from_secs(8));
        assert_eq!(h.load_state(&AppId::from("x")), Some(LoadState::Loading));
        assert!(h.deadline_armed(&AppId::from("x")));
        assert_eq!(
            h.factory()
                .count_ops(|op| matches!(op, SurfaceOp::SourceSet { .. })),
            1
        );
    }

    #[test]
    fn late_load_supersedes_blocked() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("x", "https://x.example.com/")], None, now);
        h.poll_deadlines(now + Duration::from_secs(7));

        h.factory().push_loaded(&AppId::from("x"));
        h.process_events();
        assert_eq!(h.load_state(&AppId::from("x")), Some(LoadState::Loaded));
    }

    #[test]
    fn keep_waiting_clears_blocked_without_rearming() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("x", "https://x.example.com/")], None, now);
        h.poll_deadlines(now + Duration::from_secs(7));

        h.keep_waiting(&AppId::from("x"));
        assert_eq!(h.load_state(&AppId::from("x")), Some(LoadState::Loading));
        assert!(!h.deadline_armed(&AppId::from("x")));
        assert!(h.poll_deadlines(now + Duration::from_secs(120)).is_empty());
    }

    #[test]
    fn open_external_uses_current_url() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("x", "https://x.example.com/")], None, now);
        h.open_external(&AppId::from("x")).unwrap();
        assert!(h.factory().ops().iter().any(|op| matches!(
            op,
            SurfaceOp::OpenedExternal { url } if url == "https://x.example.com/"
        )));
    }

    #[test]
    fn open_external_unknown_id_errors() {
        let mut h = host();
        assert!(h.open_external(&AppId::from("ghost")).is_err());
    }

    #[test]
    fn reload_defaults_to_active() {
        let mut h = host();
        let now = Instant::now();
        let specs = [
            spec("a", "https://a.example.com/"),
            spec("b", "https://b.example.com/"),
        ];
        h.reconcile(&specs, Some(&AppId::from("b")), now);

        h.reload(None, Some(&AppId::from("b")), now);
        assert_eq!(
            h.factory().count_ops(|op| matches!(
                op,
                SurfaceOp::SourceSet { app_id, .. } if app_id == &AppId::from("b")
            )),
            1
        );
        assert_eq!(
            h.factory().count_ops(|op| matches!(
                op,
                SurfaceOp::SourceSet { app_id, .. } if app_id == &AppId::from("a")
            )),
            0
        );
    }

    #[test]
    fn stale_events_for_closed_frames_are_dropped() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("a", "https://a.example.com/")], None, now);
        h.reconcile(&[], None, now);

        h.factory().push_loaded(&AppId::from("a"));
        let applied = h.process_events();
        assert!(applied.is_empty());
    }

    #[test]
    fn zoom_change_transforms_without_reload() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("a", "https://a.example.com/")], None, now);
        h.set_zoom(&AppId::from("a"), 1.5);
        assert!(h.factory().ops().iter().any(|op| matches!(
            op,
            SurfaceOp::Transform { scale, .. } if *scale == 1.5
        )));
        assert_eq!(
            h.factory()
                .count_ops(|op| matches!(op, SurfaceOp::SourceSet { .. })),
            0
        );
    }

    #[test]
    fn progress_is_monotonic_then_snaps_to_100() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("a", "https://a.example.com/")], None, now);

        let mut last = h.progress(&AppId::from("a")).unwrap();
        for i in 0..10 {
            h.poll_deadlines(now + Duration::from_millis(i * 100));
            let p = h.progress(&AppId::from("a")).unwrap();
            assert!(p >= last);
            assert!(p < 100.0);
            last = p;
        }

        h.factory().push_loaded(&AppId::from("a"));
        h.process_events();
        assert_eq!(h.progress(&AppId::from("a")), Some(100.0));

        // A re-source resets the indicator.
        h.retry(&AppId::from("a"), now);
        assert_eq!(h.progress(&AppId::from("a")), Some(0.0));
    }

    /// Refuses creation for one app id, delegating everything else.
    struct FlakyFactory {
        inner: HeadlessFactory,
        refuse: AppId,
    }

    impl SurfaceFactory for FlakyFactory {
        fn create(
            &mut self,
            app_id: &AppId,
            url: &str,
            sandbox: &SandboxPolicy,
            permissions: &PermissionGrant,
        ) -> Result<Box<dyn Surface>> {
            if app_id == &self.refuse {
                return Err(WebdeckError::Surface("embedder refused".into()));
            }
            self.inner.create(app_id, url, sandbox, permissions)
        }

        fn open_external(&mut self, url: &str) -> Result<()> {
            self.inner.open_external(url)
        }

        fn drain_events(&mut self) -> Vec<SurfaceEvent> {
            self.inner.drain_events()
        }
    }

    #[test]
    fn failed_surface_creation_skips_only_that_frame() {
        let mut h = FrameHost::new(FlakyFactory {
            inner: HeadlessFactory::new(),
            refuse: AppId::from("bad"),
        });
        let now = Instant::now();
        let specs = [
            spec("bad", "https://bad.example.com/"),
            spec("ok", "https://ok.example.com/"),
        ];
        h.reconcile(&specs, Some(&AppId::from("ok")), now);

        assert!(!h.has_frame(&AppId::from("bad")));
        assert!(h.has_frame(&AppId::from("ok")));
        assert_eq!(h.load_state(&AppId::from("ok")), Some(LoadState::Loading));

        // The next pass retries the failed creation without disturbing
        // the healthy frame.
        h.reconcile(&specs, Some(&AppId::from("ok")), now);
        assert!(!h.has_frame(&AppId::from("bad")));
        assert!(h.has_frame(&AppId::from("ok")));
    }

    #[test]
    fn load_failed_event_blocks_immediately() {
        let mut h = host();
        let now = Instant::now();
        h.reconcile(&[spec("a", "https://a.example.com/")], None, now);
        h.factory().push_failed(&AppId::from("a"));
        h.process_events();
        assert_eq!(h.load_state(&AppId::from("a")), Some(LoadState::Blocked));
        assert!(!h.deadline_armed(&AppId::from("a")));
    }
}
