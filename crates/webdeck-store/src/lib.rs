//! Webdeck session store.
//!
//! Owns the app catalog ([`AppRegistry`]), the bounded LRU open-app list
//! ([`SessionState`]), and the persisted snapshot that survives restarts.
//! All mutations are synchronous and leave the session invariants intact
//! on return; every mutation through [`ShellStore`] writes the snapshot.

pub mod registry;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use registry::{AppPatch, AppRegistry};
pub use session::SessionState;
pub use snapshot::{Snapshot, SnapshotEnvelope, SNAPSHOT_KEY, SNAPSHOT_VERSION};
pub use storage::{open_default_storage, FileStorage, MemoryStorage, StorageBackend};
pub use store::ShellStore;
