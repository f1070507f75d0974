//! In-memory surface backend.
//!
//! Records every operation instead of rendering anything. Backs the CLI
//! (where no embedding environment exists) and the frame-host tests,
//! which inject load events through [`HeadlessFactory::push_loaded`].

use std::sync::{Arc, Mutex};

use webdeck_common::{AppId, Result};

use crate::surface::{
    PermissionGrant, SandboxPolicy, Surface, SurfaceEvent, SurfaceFactory, SurfaceTransform,
};

/// An operation applied to a headless surface, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Created { app_id: AppId, url: String },
    SourceSet { app_id: AppId, url: String },
    Visibility { app_id: AppId, visible: bool },
    Transform { app_id: AppId, scale: f64 },
    Destroyed { app_id: AppId },
    OpenedExternal { url: String },
}

#[derive(Debug, Default)]
struct SharedLog {
    ops: Vec<SurfaceOp>,
    events: Vec<SurfaceEvent>,
}

pub struct HeadlessSurface {
    app_id: AppId,
    source: String,
    visible: bool,
    interactive: bool,
    transform: SurfaceTransform,
    log: Arc<Mutex<SharedLog>>,
}

impl HeadlessSurface {
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn transform(&self) -> SurfaceTransform {
        self.transform
    }
}

impl Surface for HeadlessSurface {
    fn set_source(&mut self, url: &str) {
        self.source = url.to_string();
        if let Ok(mut log) = self.log.lock() {
            log.ops.push(SurfaceOp::SourceSet {
                app_id: self.app_id.clone(),
                url: url.to_string(),
            });
        }
    }

    fn current_source(&self) -> &str {
        &self.source
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if let Ok(mut log) = self.log.lock() {
            log.ops.push(SurfaceOp::Visibility {
                app_id: self.app_id.clone(),
                visible,
            });
        }
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    fn set_transform(&mut self, transform: SurfaceTransform) {
        self.transform = transform;
        if let Ok(mut log) = self.log.lock() {
            log.ops.push(SurfaceOp::Transform {
                app_id: self.app_id.clone(),
                scale: transform.scale,
            });
        }
    }
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.ops.push(SurfaceOp::Destroyed {
                app_id: self.app_id.clone(),
            });
        }
    }
}

#[derive(Default)]
pub struct HeadlessFactory {
    log: Arc<Mutex<SharedLog>>,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the surface's native load signal for an app.
    pub fn push_loaded(&self, app_id: &AppId) {
        if let Ok(mut log) = self.log.lock() {
            log.events.push(SurfaceEvent::Loaded {
                app_id: app_id.clone(),
            });
        }
    }

    /// Simulate a hard load failure for an app.
    pub fn push_failed(&self, app_id: &AppId) {
        if let Ok(mut log) = self.log.lock() {
            log.events.push(SurfaceEvent::LoadFailed {
                app_id: app_id.clone(),
            });
        }
    }

    /// All operations recorded so far, in order.
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.log.lock().map(|l| l.ops.clone()).unwrap_or_default()
    }

    /// Count of recorded operations matching a predicate.
    pub fn count_ops(&self, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.ops().iter().filter(|op| pred(op)).count()
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn create(
        &mut self,
        app_id: &AppId,
        url: &str,
        _sandbox: &SandboxPolicy,
        _permissions: &PermissionGrant,
    ) -> Result<Box<dyn Surface>> {
        if let Ok(mut log) = self.log.lock() {
            log.ops.push(SurfaceOp::Created {
                app_id: app_id.clone(),
                url: url.to_string(),
            });
        }
        Ok(Box::new(HeadlessSurface {
            app_id: app_id.clone(),
            source: url.to_string(),
            visible: false,
            interactive: false,
            transform: SurfaceTransform::identity(),
            log: Arc::clone(&self.log),
        }))
    }

    fn open_external(&mut self, url: &str) -> Result<()> {
        if let Ok(mut log) = self.log.lock() {
            log.ops.push(SurfaceOp::OpenedExternal {
                url: url.to_string(),
            });
        }
        Ok(())
    }

    fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        self.log
            .lock()
            .map(|mut l| std::mem::take(&mut l.events))
            .unwrap_or_default()
    }
}
