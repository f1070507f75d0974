use serde::{Deserialize, Serialize};

use crate::id::AppId;

/// Minimum per-app zoom factor.
pub const ZOOM_MIN: f64 = 0.5;
/// Maximum per-app zoom factor.
pub const ZOOM_MAX: f64 = 2.0;

/// Clamp a zoom factor into the supported range. Non-finite input
/// (NaN, infinities) is coerced to 1.0.
pub fn clamp_zoom(z: f64) -> f64 {
    if !z.is_finite() {
        return 1.0;
    }
    z.clamp(ZOOM_MIN, ZOOM_MAX)
}

/// A registered pseudo-app: a remote URL the shell can host as an
/// embedded surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppItem {
    pub id: AppId,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Epoch milliseconds of the last open/activate.
    #[serde(rename = "lastOpened")]
    pub last_opened: i64,
}
