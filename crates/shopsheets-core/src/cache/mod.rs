//! Offline response cache.
//!
//! `OfflineRouter` sits in front of every GET the app makes and picks a
//! caching strategy from the URL:
//!
//! - Sheets API reads: network first, cached copy when offline
//! - App routes: stale-while-revalidate
//! - Static and CDN assets: cache first with a max age
//! - Anything else: network with cache fallback
//!
//! Status changes are broadcast as [`ClientMessage`]s. Entries live on disk
//! under a versioned directory managed by [`CacheManager`].

pub mod fetch;
pub mod manager;
pub mod router;

pub use fetch::{http_date, FetchError, FetchRequest, FetchResponse, Fetcher, HttpFetcher};
pub use manager::{CacheManager, CachedResponse};
pub use router::{
    ClientMessage, MessageKind, OfflineRouter, RouteError, RoutePolicy, Strategy, CACHE_NAME,
    CACHE_VERSION, OFFLINE_CACHE, STATIC_ASSETS,
};
