//! The embeddable-surface capability seam.
//!
//! A surface is an isolated, sandboxed rendering context hosting a
//! third-party URL. Cross-origin content inside it is opaque: the only
//! observable signals are load completion and hard load failure, both
//! delivered through [`SurfaceFactory::drain_events`].

use serde::{Deserialize, Serialize};

use webdeck_common::{AppId, Result};

/// Capability restrictions applied to a surface at creation.
///
/// The defaults mirror the shell's minimal grant: script execution,
/// form submission, and same-origin storage — no navigation escape and
/// no top-level redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxPolicy {
    pub allow_scripts: bool,
    pub allow_forms: bool,
    pub allow_same_origin: bool,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            allow_scripts: true,
            allow_forms: true,
            allow_same_origin: true,
        }
    }
}

/// Feature permissions delegated into the embedded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub geolocation: bool,
    pub camera: bool,
    pub microphone: bool,
    pub clipboard_read: bool,
    pub clipboard_write: bool,
}

impl Default for PermissionGrant {
    fn default() -> Self {
        Self {
            geolocation: true,
            camera: true,
            microphone: true,
            clipboard_read: true,
            clipboard_write: true,
        }
    }
}

/// Zoom applied as a scale with compensating dimensions, so the visible
/// viewport stays the same size while content scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTransform {
    pub scale: f64,
    /// Width as a percentage of the viewport (100 / scale).
    pub width_pct: f64,
    /// Height as a percentage of the viewport (100 / scale).
    pub height_pct: f64,
}

impl SurfaceTransform {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom == 1.0 {
            Self {
                scale: 1.0,
                width_pct: 100.0,
                height_pct: 100.0,
            }
        } else {
            let pct = 100.0 / zoom;
            Self {
                scale: zoom,
                width_pct: pct,
                height_pct: pct,
            }
        }
    }

    pub fn identity() -> Self {
        Self::from_zoom(1.0)
    }
}

/// Load signals observed from a surface. Events carry the app id so a
/// stale event for a since-closed app can be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The surface's native load signal fired.
    Loaded { app_id: AppId },
    /// The surface reported a hard load failure.
    LoadFailed { app_id: AppId },
}

/// A live embedded surface. Dropping the object destroys the surface.
pub trait Surface {
    /// Reassign the source URL. This forces a reload of the content.
    fn set_source(&mut self, url: &str);
    /// The currently assigned source URL.
    fn current_source(&self) -> &str;
    /// Show or hide the surface. Never recreates it or resets its load
    /// state, so embedded content survives visibility toggles.
    fn set_visible(&mut self, visible: bool);
    /// Allow or block input reaching the surface.
    fn set_interactive(&mut self, interactive: bool);
    /// Apply a zoom transform without reloading.
    fn set_transform(&mut self, transform: SurfaceTransform);
}

/// Creates surfaces and delivers their load events.
pub trait SurfaceFactory {
    fn create(
        &mut self,
        app_id: &AppId,
        url: &str,
        sandbox: &SandboxPolicy,
        permissions: &PermissionGrant,
    ) -> Result<Box<dyn Surface>>;

    /// Escape hatch for content that refuses embedding: open the URL in
    /// a full top-level context instead.
    fn open_external(&mut self, url: &str) -> Result<()>;

    /// Drain load events observed since the last call.
    fn drain_events(&mut self) -> Vec<SurfaceEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_identity() {
        let t = SurfaceTransform::from_zoom(1.0);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.width_pct, 100.0);
        assert_eq!(t.height_pct, 100.0);
    }

    #[test]
    fn transform_compensates_dimensions() {
        let t = SurfaceTransform::from_zoom(2.0);
        assert_eq!(t.scale, 2.0);
        assert_eq!(t.width_pct, 50.0);
        assert_eq!(t.height_pct, 50.0);

        let t = SurfaceTransform::from_zoom(0.5);
        assert_eq!(t.width_pct, 200.0);
    }

    #[test]
    fn sandbox_defaults_match_minimal_grant() {
        let p = SandboxPolicy::default();
        assert!(p.allow_scripts && p.allow_forms && p.allow_same_origin);
    }
}
