//! Per-route caching strategies for outgoing GET requests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::fetch::{FetchError, FetchRequest, FetchResponse, Fetcher};
use super::manager::{CacheManager, CachedResponse};

pub const CACHE_VERSION: &str = "v3";
pub const CACHE_NAME: &str = "shop-manager-v3";
pub const OFFLINE_CACHE: &str = "shop-manager-offline-v3";

/// Key the offline page is stored under in the offline cache.
pub const OFFLINE_PAGE_URL: &str = "/offline";

const OFFLINE_PAGE: &str = "<html><body><h1>You are offline</h1><p>Please check your internet connection.</p></body></html>";

/// App paths precached on install, relative to the app origin, plus CDN assets.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/static/css/dashboard.css",
    "/static/scripts/dashboard.js",
    "/static/scripts/pwa.js",
    "/static/manifest.json",
    "/static/images/icon-192.png",
    "https://cdnjs.cloudflare.com/ajax/libs/Chart.js/3.9.1/chart.min.js",
    "https://cdnjs.cloudflare.com/ajax/libs/bootstrap/5.3.0/css/bootstrap.min.css",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
];

const SWR_ROUTES: &[&str] = &[
    "/orders",
    "/workers",
    "/expenses",
    "/orders/fabric",
    "/orders/tailor",
    "/orders/fabric-tailor",
];

const SHEETS_HOST: &str = "sheets.googleapis.com";
const CDN_HOST: &str = "cdnjs.cloudflare.com";

const STATIC_MAX_AGE: Duration = Duration::from_secs(60 * 60);
const CDN_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    SwActivated,
    DataFresh,
    DataStale,
    Offline,
    DataUpdated,
    StaleData,
    FallbackToCache,
    BackgroundSyncFailed,
}

/// Status message broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ClientMessage {
    fn for_url(kind: MessageKind, url: &Url) -> Self {
        Self {
            kind,
            url: Some(url.to_string()),
            version: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("{url}: {source}")]
    Network {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("{url}: server returned {status} and no cached copy exists")]
    Unavailable { url: String, status: u16, body: String },

    #[error("precache failed for {url}: {reason}")]
    Precache { url: String, reason: String },

    #[error("invalid URL {0}")]
    InvalidUrl(String),

    #[error("cache error: {0}")]
    Cache(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    StaleWhileRevalidate,
    CacheFirst { max_age: Duration },
    NetworkWithFallback,
}

/// Decides the strategy for a URL.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    app_origin: Url,
}

impl RoutePolicy {
    pub fn new(app_origin: &str) -> Result<Self, RouteError> {
        let app_origin =
            Url::parse(app_origin).map_err(|_| RouteError::InvalidUrl(app_origin.to_string()))?;
        Ok(Self { app_origin })
    }

    pub fn classify(&self, url: &Url) -> Strategy {
        let host = url.host_str().unwrap_or_default();
        let same_origin = url.origin() == self.app_origin.origin();
        let path = url.path();

        if host.contains(SHEETS_HOST) {
            Strategy::NetworkFirst
        } else if same_origin && (path == "/" || SWR_ROUTES.iter().any(|r| path.starts_with(r))) {
            Strategy::StaleWhileRevalidate
        } else if same_origin && path.starts_with("/static/") {
            Strategy::CacheFirst {
                max_age: STATIC_MAX_AGE,
            }
        } else if host.contains(CDN_HOST) {
            Strategy::CacheFirst {
                max_age: CDN_MAX_AGE,
            }
        } else {
            Strategy::NetworkWithFallback
        }
    }

    /// Resolve [`STATIC_ASSETS`] against the app origin.
    pub fn precache_urls(&self) -> Result<Vec<Url>, RouteError> {
        STATIC_ASSETS
            .iter()
            .map(|asset| {
                self.app_origin
                    .join(asset)
                    .map_err(|_| RouteError::InvalidUrl(asset.to_string()))
            })
            .collect()
    }
}

/// Intercepts GET requests and serves them through the response cache.
pub struct OfflineRouter {
    root: PathBuf,
    cache: Arc<CacheManager>,
    offline: CacheManager,
    fetcher: Arc<dyn Fetcher>,
    policy: RoutePolicy,
    notifier: broadcast::Sender<ClientMessage>,
    revalidations: Mutex<JoinSet<()>>,
}

impl OfflineRouter {
    pub fn new(root: PathBuf, policy: RoutePolicy, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let cache = Arc::new(CacheManager::open(&root, CACHE_NAME)?);
        let offline = CacheManager::open(&root, OFFLINE_CACHE)?;
        let (notifier, _) = broadcast::channel(CHANNEL_CAPACITY);
        Ok(Self {
            root,
            cache,
            offline,
            fetcher,
            policy,
            notifier,
            revalidations: Mutex::new(JoinSet::new()),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.notifier.subscribe()
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Cached entry for `url` in the current cache version, if any.
    pub fn cached(&self, url: &Url) -> Option<CachedResponse> {
        read_cache(&self.cache, url)
    }

    /// [`cached`](Self::cached) for a URL as carried in a [`ClientMessage`].
    pub fn cached_entry(&self, url: &str) -> Option<CachedResponse> {
        Url::parse(url).ok().and_then(|url| self.cached(&url))
    }

    /// Straight to the network, never reading or writing the cache.
    pub async fn fetch_live(&self, request: &FetchRequest) -> Result<FetchResponse, RouteError> {
        self.fetcher
            .fetch(request)
            .await
            .map_err(|source| network_error(&request.url, source))
    }

    pub async fn handle(&self, request: FetchRequest) -> Result<FetchResponse, RouteError> {
        if request.method != Method::GET {
            return self.fetch_live(&request).await;
        }

        let strategy = self.policy.classify(&request.url);
        debug!(url = %request.url, ?strategy, "Routing request");
        match strategy {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::CacheFirst { max_age } => self.cache_first(request, max_age).await,
            Strategy::NetworkWithFallback => self.network_with_fallback(request).await,
        }
    }

    async fn network_first(&self, request: FetchRequest) -> Result<FetchResponse, RouteError> {
        let failure = match self.fetcher.fetch(&request).await {
            Ok(response) if response.ok() => {
                write_cache(&self.cache, &request.url, &response);
                notify(&self.notifier, ClientMessage::for_url(MessageKind::DataFresh, &request.url));
                return Ok(response);
            }
            Ok(response) => RouteError::Unavailable {
                url: request.url.to_string(),
                status: response.status,
                body: response.text(),
            },
            Err(source) => network_error(&request.url, source),
        };

        warn!(url = %request.url, error = %failure, "Network failed, trying cache");
        if let Some(cached) = self.cached(&request.url) {
            notify(&self.notifier, ClientMessage::for_url(MessageKind::DataStale, &request.url));
            return Ok(cached.to_response());
        }

        notify(&self.notifier, ClientMessage::for_url(MessageKind::Offline, &request.url));
        Err(failure)
    }

    async fn stale_while_revalidate(&self, request: FetchRequest) -> Result<FetchResponse, RouteError> {
        let cached = self.cached(&request.url);
        let fetcher = Arc::clone(&self.fetcher);
        let cache = Arc::clone(&self.cache);
        let notifier = self.notifier.clone();

        match cached {
            Some(cached) => {
                let mut tasks = self.revalidations.lock().await;
                while tasks.try_join_next().is_some() {}
                tasks.spawn(async move {
                    let _ = revalidate(fetcher, cache, notifier, request).await;
                });
                Ok(cached.to_response())
            }
            None => {
                let url = request.url.clone();
                match revalidate(fetcher, cache, notifier, request).await {
                    Ok(response) => Ok(response),
                    Err(source) => match self.offline_page() {
                        Some(page) => {
                            notify(&self.notifier, ClientMessage::for_url(MessageKind::Offline, &url));
                            Ok(page)
                        }
                        None => Err(network_error(&url, source)),
                    },
                }
            }
        }
    }

    async fn cache_first(&self, request: FetchRequest, max_age: Duration) -> Result<FetchResponse, RouteError> {
        let cached = self.cached(&request.url);
        if let Some(entry) = &cached {
            if is_fresh(&entry.to_response(), max_age) {
                return Ok(entry.to_response());
            }
        }

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                if response.ok() {
                    write_cache(&self.cache, &request.url, &response);
                }
                Ok(response)
            }
            Err(source) => match cached {
                Some(entry) => {
                    notify(&self.notifier, ClientMessage::for_url(MessageKind::StaleData, &request.url));
                    Ok(entry.to_response())
                }
                None => Err(network_error(&request.url, source)),
            },
        }
    }

    async fn network_with_fallback(&self, request: FetchRequest) -> Result<FetchResponse, RouteError> {
        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                if response.ok() {
                    write_cache(&self.cache, &request.url, &response);
                }
                Ok(response)
            }
            Err(source) => match self.cached(&request.url) {
                Some(entry) => {
                    notify(
                        &self.notifier,
                        ClientMessage::for_url(MessageKind::FallbackToCache, &request.url),
                    );
                    Ok(entry.to_response())
                }
                None => Err(network_error(&request.url, source)),
            },
        }
    }

    /// Wait for every background revalidation started so far.
    pub async fn settle(&self) {
        let mut tasks = self.revalidations.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Background revalidation task failed");
            }
        }
    }

    /// Precache `urls` and store the offline page. Nothing is stored unless
    /// every asset fetches successfully.
    pub async fn install(&self, urls: &[Url]) -> Result<(), RouteError> {
        info!(version = CACHE_VERSION, assets = urls.len(), "Installing offline cache");

        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            let response = self
                .fetcher
                .fetch(&FetchRequest::get(url.clone()))
                .await
                .map_err(|e| RouteError::Precache {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            if !response.ok() {
                return Err(RouteError::Precache {
                    url: url.to_string(),
                    reason: format!("HTTP {}", response.status),
                });
            }
            fetched.push((url, response));
        }

        for (url, response) in &fetched {
            self.cache.put(url.as_str(), response)?;
        }

        let page = FetchResponse::new(200, OFFLINE_PAGE)
            .with_header("content-type", "text/html")
            .with_header("date", super::fetch::http_date(Utc::now()));
        self.offline.put(OFFLINE_PAGE_URL, &page)?;
        Ok(())
    }

    /// Delete caches from other versions, then announce the active version.
    pub fn activate(&self) -> Result<Vec<String>, RouteError> {
        info!(version = CACHE_VERSION, "Activating offline cache");
        let mut deleted = Vec::new();
        for name in CacheManager::cache_names(&self.root)? {
            if name != CACHE_NAME && name != OFFLINE_CACHE {
                info!(cache = %name, "Deleting old cache");
                CacheManager::delete_cache(&self.root, &name)?;
                deleted.push(name);
            }
        }

        notify(
            &self.notifier,
            ClientMessage {
                kind: MessageKind::SwActivated,
                url: None,
                version: Some(CACHE_VERSION.to_string()),
            },
        );
        Ok(deleted)
    }

    /// The page served for app routes that are neither reachable nor cached.
    pub fn offline_page(&self) -> Option<FetchResponse> {
        match self.offline.get(OFFLINE_PAGE_URL) {
            Ok(entry) => entry.map(|e| e.to_response()),
            Err(e) => {
                warn!(error = %e, "Failed to read offline page");
                None
            }
        }
    }
}

/// Fetch and refresh the cache; shared by the foreground and background paths.
async fn revalidate(
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<CacheManager>,
    notifier: broadcast::Sender<ClientMessage>,
    request: FetchRequest,
) -> Result<FetchResponse, FetchError> {
    match fetcher.fetch(&request).await {
        Ok(response) => {
            if response.ok() {
                write_cache(&cache, &request.url, &response);
                notify(&notifier, ClientMessage::for_url(MessageKind::DataUpdated, &request.url));
            }
            Ok(response)
        }
        Err(e) => {
            warn!(url = %request.url, error = %e, "Background fetch failed");
            notify(
                &notifier,
                ClientMessage::for_url(MessageKind::BackgroundSyncFailed, &request.url),
            );
            Err(e)
        }
    }
}

/// A response with no readable `Date` header is always stale.
fn is_fresh(response: &FetchResponse, max_age: Duration) -> bool {
    match response.date() {
        Some(date) => match (Utc::now() - date).to_std() {
            Ok(age) => age < max_age,
            // Dated in the future.
            Err(_) => true,
        },
        None => false,
    }
}

fn read_cache(cache: &CacheManager, url: &Url) -> Option<CachedResponse> {
    match cache.get(url.as_str()) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(url = %url, error = %e, "Unreadable cache entry, treating as miss");
            None
        }
    }
}

fn write_cache(cache: &CacheManager, url: &Url, response: &FetchResponse) {
    if let Err(e) = cache.put(url.as_str(), response) {
        warn!(url = %url, error = %e, "Failed to update cache");
    }
}

fn notify(notifier: &broadcast::Sender<ClientMessage>, message: ClientMessage) {
    debug!(kind = ?message.kind, url = ?message.url, "Router message");
    if notifier.send(message).is_err() {
        debug!("No subscribers for router message");
    }
}

fn network_error(url: &Url, source: FetchError) -> RouteError {
    RouteError::Network {
        url: url.to_string(),
        source,
    }
}
