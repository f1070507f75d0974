//! Embedded-surface lifecycle management.
//!
//! [`FrameHost`] keeps exactly one live surface per open app, reconciled
//! against the session's open list and active pointer, and runs the
//! load/blocked detection state machine for each surface. It talks to
//! the hosting environment only through the narrow [`Surface`] /
//! [`SurfaceFactory`] traits, so the real embedding (an iframe layer, a
//! webview, a test double) is swappable.

pub mod headless;
pub mod host;
pub mod surface;

pub use headless::{HeadlessFactory, HeadlessSurface, SurfaceOp};
pub use host::{FrameHost, FrameSpec, LoadState, BLOCKED_TIMEOUT};
pub use surface::{
    PermissionGrant, SandboxPolicy, Surface, SurfaceEvent, SurfaceFactory, SurfaceTransform,
};
