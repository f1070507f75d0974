//! Cache routing policy for the shell's own assets.
//!
//! Pure decisions, mirrored by whatever executes the caching: which
//! assets to prefetch on install, which stale caches to delete on
//! activation, and how to route each fetch. Cross-origin traffic —
//! which includes everything the embedded apps load — is never
//! intercepted.

use url::Url;

/// Cache name prefix; the full name carries the bundle version.
pub const CACHE_PREFIX: &str = "web-os-cache-v";

/// Assets prefetched into the cache on install.
pub const PRECACHE_ASSETS: &[&str] = &["/", "/manifest.webmanifest", "/icon.svg"];

/// Navigation fallback when both network and exact-match cache miss.
pub const ROOT_DOCUMENT: &str = "/";

/// Last-resort response for a failed static fetch.
pub const FALLBACK_ASSET: &str = "/icon.svg";

/// Build-output path prefix treated as static regardless of destination.
const STATIC_PATH_PREFIX: &str = "/_static/";

pub fn cache_name(version: u32) -> String {
    format!("{CACHE_PREFIX}{version}")
}

/// Caches to delete on activation: every name that is not the current
/// versioned cache.
pub fn stale_caches<'a>(existing: &'a [String], version: u32) -> Vec<&'a str> {
    let current = cache_name(version);
    existing
        .iter()
        .filter(|name| **name != current)
        .map(String::as_str)
        .collect()
}

/// What kind of resource a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDestination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Other,
}

/// The subset of a fetch request the policy looks at.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub is_navigation: bool,
    pub destination: FetchDestination,
}

/// How to serve one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// Try the network; on success write back to the cache; on failure
    /// serve the cached request, then the cached root document.
    NetworkFirst { fallback: &'static str },
    /// Serve from cache; on miss fetch and write back; on network
    /// failure serve the fallback asset.
    CacheFirst { fallback: &'static str },
    /// Do not intercept.
    Bypass,
}

/// Route a request against the shell origin.
pub fn route(request: &FetchRequest, shell_origin: &str) -> FetchDecision {
    let Ok(origin) = Url::parse(shell_origin) else {
        return FetchDecision::Bypass;
    };
    let Ok(url) = Url::parse(&request.url) else {
        return FetchDecision::Bypass;
    };
    if url.origin() != origin.origin() {
        return FetchDecision::Bypass;
    }

    if request.is_navigation {
        return FetchDecision::NetworkFirst {
            fallback: ROOT_DOCUMENT,
        };
    }

    let is_static = matches!(
        request.destination,
        FetchDestination::Style
            | FetchDestination::Script
            | FetchDestination::Image
            | FetchDestination::Font
    ) || url.path().starts_with(STATIC_PATH_PREFIX);

    if is_static {
        FetchDecision::CacheFirst {
            fallback: FALLBACK_ASSET,
        }
    } else {
        FetchDecision::Bypass
    }
}
