pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{PlatformError, StorageError, ValidationError, WebdeckError};
pub use events::{EventBus, ShellEvent};
pub use id::{new_id, AppId};
pub use types::{clamp_zoom, AppItem, ZOOM_MAX, ZOOM_MIN};

pub type Result<T> = std::result::Result<T, WebdeckError>;
