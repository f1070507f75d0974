//! Background update coordination and the shell's asset-cache policy.
//!
//! [`UpdateCoordinator`] tracks the background-served bundle version:
//! it stages a newly installed version without disrupting the active
//! session and applies it (one reload, after controller handoff) only
//! on explicit user choice. The [`cache`] module holds the pure routing
//! decisions the caching layer executes: versioned cache names, the
//! precache list, and network-first/cache-first classification for
//! same-origin requests.

pub mod cache;
pub mod coordinator;

pub use cache::{
    cache_name, stale_caches, FetchDecision, FetchDestination, FetchRequest, CACHE_PREFIX,
    FALLBACK_ASSET, PRECACHE_ASSETS, ROOT_DOCUMENT,
};
pub use coordinator::{
    NoopWorkerControl, UpdateCoordinator, UpdateStatus, WorkerControl, WorkerSignal,
};
