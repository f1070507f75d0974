//! The shell service: store, frame host, and event bus behind one
//! object. UI layers (or the CLI) call these operations; the shell
//! mutates the store, then reconciles the frame host against the new
//! open-app set. The reconciliation path absorbs every per-app failure,
//! so one misbehaving app cannot take the session down.

use std::time::Instant;

use webdeck_common::{AppId, EventBus, Result, ShellEvent, WebdeckError};
use webdeck_host::{FrameHost, FrameSpec, LoadState, SurfaceFactory};
use webdeck_store::{AppPatch, ShellStore};
use webdeck_update::{UpdateCoordinator, UpdateStatus, WorkerControl, WorkerSignal};

use crate::clipboard::ClipboardHistory;
use crate::install::InstallPromptGate;

pub struct Shell<F: SurfaceFactory, C: WorkerControl> {
    store: ShellStore,
    host: FrameHost<F>,
    update: UpdateCoordinator<C>,
    bus: EventBus,
    clipboard: ClipboardHistory,
    install: InstallPromptGate,
}

impl<F: SurfaceFactory, C: WorkerControl> Shell<F, C> {
    /// Wire a shell over a restored store, bringing surfaces up for any
    /// apps the snapshot left open.
    pub fn new(store: ShellStore, host: FrameHost<F>, update: UpdateCoordinator<C>) -> Self {
        let mut shell = Self {
            store,
            host,
            update,
            bus: EventBus::new(64),
            clipboard: ClipboardHistory::default(),
            install: InstallPromptGate::new(),
        };
        shell.reconcile();
        shell
    }

    /// Override the clipboard history capacity (from settings).
    pub fn with_clipboard_limit(mut self, limit: usize) -> Self {
        self.clipboard = ClipboardHistory::with_limit(limit);
        self
    }

    // --- app lifecycle ---

    /// Register a new app and open it immediately (the add-form flow).
    pub fn register_app(
        &mut self,
        name: Option<&str>,
        url: &str,
        icon: Option<String>,
    ) -> Result<AppId> {
        let id = self.store.add_app(name, url, icon)?;
        self.open_app(&id)?;
        Ok(id)
    }

    pub fn open_app(&mut self, id: &AppId) -> Result<()> {
        if self.store.get_app(id).is_none() {
            return Err(WebdeckError::UnknownApp(id.to_string()));
        }
        let evicted = self.store.open_app(id);
        self.reconcile();
        for closed in evicted {
            self.bus.publish(ShellEvent::AppClosed(closed));
        }
        self.bus.publish(ShellEvent::AppOpened(id.clone()));
        self.bus
            .publish(ShellEvent::AppActivated(Some(id.clone())));
        Ok(())
    }

    pub fn close_app(&mut self, id: &AppId) {
        self.store.close_app(id);
        self.reconcile();
        self.bus.publish(ShellEvent::AppClosed(id.clone()));
        self.bus
            .publish(ShellEvent::AppActivated(self.store.active().cloned()));
    }

    /// Switch to an already-open (or at least registered) app.
    pub fn activate(&mut self, id: &AppId) -> Result<()> {
        self.open_app(id)
    }

    /// Navigate home: clears the active pointer, closes nothing.
    pub fn go_home(&mut self) {
        self.store.set_active(None);
        self.reconcile();
        self.bus.publish(ShellEvent::AppActivated(None));
    }

    pub fn edit_app(&mut self, id: &AppId, patch: AppPatch) -> Result<()> {
        self.store.edit_app(id, patch)?;
        // A URL edit shows up as source drift and re-sources the frame.
        self.reconcile();
        Ok(())
    }

    pub fn delete_app(&mut self, id: &AppId) -> bool {
        let existed = self.store.delete_app(id);
        if existed {
            self.reconcile();
            self.bus.publish(ShellEvent::AppClosed(id.clone()));
        }
        existed
    }

    pub fn set_lru_limit(&mut self, n: usize) {
        let evicted = self.store.set_lru_limit(n);
        self.reconcile();
        for closed in evicted {
            self.bus.publish(ShellEvent::AppClosed(closed));
        }
    }

    // --- zoom ---

    pub fn set_zoom(&mut self, id: &AppId, z: f64) {
        self.store.set_zoom(id, z);
        self.host.set_zoom(id, self.store.get_zoom(id));
    }

    /// Step the active app's zoom by `delta`, rounded to 0.1 like the
    /// switcher's +/- buttons.
    pub fn zoom_by(&mut self, delta: f64) {
        let Some(id) = self.store.active().cloned() else {
            return;
        };
        let next = ((self.store.get_zoom(&id) + delta) * 10.0).round() / 10.0;
        self.set_zoom(&id, next);
    }

    // --- load state machine ---

    /// Reload the given app, or the active app when none is given
    /// (the reload-request signal's contract).
    pub fn reload(&mut self, id: Option<&AppId>) {
        self.bus.publish(ShellEvent::ReloadRequested {
            id: id.cloned(),
        });
        let active = self.store.active().cloned();
        self.host.reload(id, active.as_ref(), Instant::now());
    }

    pub fn keep_waiting(&mut self, id: &AppId) {
        self.host.keep_waiting(id);
    }

    pub fn retry(&mut self, id: &AppId) {
        self.host.retry(id, Instant::now());
    }

    pub fn open_external(&mut self, id: &AppId) -> Result<()> {
        self.host.open_external(id)
    }

    /// One pass of the event loop: apply surface load events and fire
    /// elapsed blocked-deadlines, publishing the transitions.
    pub fn tick(&mut self, now: Instant) {
        for event in self.host.process_events() {
            if let webdeck_host::SurfaceEvent::Loaded { app_id } = event {
                self.bus.publish(ShellEvent::FrameLoaded(app_id));
            }
        }
        for id in self.host.poll_deadlines(now) {
            self.bus.publish(ShellEvent::FrameBlocked(id));
        }
    }

    // --- background updates ---

    /// Forward a worker signal from the hosting environment. Staging a
    /// new version never disrupts the running session.
    pub fn handle_worker_signal(&mut self, signal: WorkerSignal) {
        let was_staged = self.update.status() == UpdateStatus::UpdateStaged;
        self.update.handle_signal(signal);
        if !was_staged && self.update.status() == UpdateStatus::UpdateStaged {
            self.bus.publish(ShellEvent::UpdateStaged);
        }
    }

    /// User chose to apply the staged update.
    pub fn apply_update(&mut self) {
        self.update.apply();
    }

    /// User chose "later"; the update stays staged.
    pub fn dismiss_update(&mut self) {
        self.update.dismiss();
    }

    /// The page regained visibility: check for a newer version and
    /// re-offer a still-staged one.
    pub fn on_visibility_regained(&mut self) {
        self.update.on_visibility_regained();
        if self.update.prompt_visible() {
            self.bus.publish(ShellEvent::UpdateStaged);
        }
    }

    pub fn update_status(&self) -> UpdateStatus {
        self.update.status()
    }

    // --- collaborators ---

    /// Capture a copy event into the clipboard history.
    pub fn capture_clipboard(&mut self, text: &str) {
        if self.clipboard.capture(text) {
            self.bus.publish(ShellEvent::ClipboardCaptured);
        }
    }

    pub fn clipboard(&self) -> &ClipboardHistory {
        &self.clipboard
    }

    pub fn install_prompt(&mut self) -> &mut InstallPromptGate {
        &mut self.install
    }

    // --- reads ---

    pub fn store(&self) -> &ShellStore {
        &self.store
    }

    pub fn host(&self) -> &FrameHost<F> {
        &self.host
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn load_state(&self, id: &AppId) -> Option<LoadState> {
        self.host.load_state(id)
    }

    /// Progress of the active app's load, if any.
    pub fn active_progress(&self) -> Option<f64> {
        self.store.active().and_then(|id| self.host.progress(id))
    }

    fn reconcile(&mut self) {
        let specs: Vec<FrameSpec> = self
            .store
            .open_apps()
            .iter()
            .filter_map(|id| {
                self.store.get_app(id).map(|app| FrameSpec {
                    app_id: id.clone(),
                    url: app.url.clone(),
                    zoom: self.store.get_zoom(id),
                })
            })
            .collect();
        let active = self.store.active().cloned();
        self.host.reconcile(&specs, active.as_ref(), Instant::now());
    }
}
