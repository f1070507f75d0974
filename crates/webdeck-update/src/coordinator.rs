//! Staging and applying a new background-served version.
//!
//! The coordinator never reloads speculatively: the page reload happens
//! exactly once, only after the controller handoff is observed, so a
//! mixed-version page can never be served. Periodic and
//! visibility-triggered checks only detect; applying is always a user
//! decision.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Version state of the served asset bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
    /// No newer version is known.
    Current,
    /// A newer version finished installing but is not yet controlling.
    UpdateStaged,
}

/// Signals from the hosting environment's background worker machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerSignal {
    /// An installed-but-waiting worker was detected (e.g. at launch).
    WaitingWorkerFound,
    /// An in-progress install reached "installed" while a prior version
    /// already controls the page.
    InstallCompletedWhileControlled,
    /// The controlling worker changed: the staged version took over.
    ControllerChanged,
}

/// Commands the coordinator issues to the hosting environment.
pub trait WorkerControl {
    /// Ask the environment to look for a newer version.
    fn check_for_update(&mut self);
    /// Tell the waiting worker to take control.
    fn skip_waiting(&mut self);
    /// Perform the full page reload.
    fn reload_page(&mut self);
}

/// Control for environments with no background worker machinery (the
/// CLI, tests). Every command is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWorkerControl;

impl WorkerControl for NoopWorkerControl {
    fn check_for_update(&mut self) {}
    fn skip_waiting(&mut self) {}
    fn reload_page(&mut self) {}
}

pub struct UpdateCoordinator<C: WorkerControl> {
    control: C,
    status: UpdateStatus,
    /// Whether the user should currently be offered the update.
    prompt_visible: bool,
    /// Set by `apply`; consumed by the controller-change signal.
    reload_armed: bool,
    reloaded: bool,
}

impl<C: WorkerControl> UpdateCoordinator<C> {
    pub fn new(control: C) -> Self {
        Self {
            control,
            status: UpdateStatus::Current,
            prompt_visible: false,
            reload_armed: false,
            reloaded: false,
        }
    }

    pub fn status(&self) -> UpdateStatus {
        self.status
    }

    /// Whether the "apply update" decision point should be shown.
    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn handle_signal(&mut self, signal: WorkerSignal) {
        match signal {
            WorkerSignal::WaitingWorkerFound | WorkerSignal::InstallCompletedWhileControlled => {
                if self.status != UpdateStatus::UpdateStaged {
                    info!("update staged, awaiting user decision");
                }
                self.status = UpdateStatus::UpdateStaged;
                self.prompt_visible = true;
            }
            WorkerSignal::ControllerChanged => {
                // Reload only after handoff, and only once.
                if self.reload_armed && !self.reloaded {
                    debug!("controller handoff observed, reloading");
                    self.reloaded = true;
                    self.reload_armed = false;
                    self.status = UpdateStatus::Current;
                    self.prompt_visible = false;
                    self.control.reload_page();
                }
            }
        }
    }

    /// User chose "reload": signal the waiting worker and arm the
    /// reload for the handoff. No-op unless an update is staged.
    pub fn apply(&mut self) {
        if self.status == UpdateStatus::UpdateStaged && !self.reload_armed {
            self.reload_armed = true;
            self.control.skip_waiting();
        }
    }

    /// User chose "later": hide the prompt without discarding the
    /// staged update. It will be offered again on the next
    /// visibility-regain check or next launch.
    pub fn dismiss(&mut self) {
        self.prompt_visible = false;
    }

    /// Visibility-regain (or periodic) hook: ask for a fresh check and
    /// re-surface a still-staged update. Never auto-applies.
    pub fn on_visibility_regained(&mut self) {
        self.control.check_for_update();
        if self.status == UpdateStatus::UpdateStaged {
            self.prompt_visible = true;
        }
    }
}
