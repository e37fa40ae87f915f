use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use shopsheets_core::api::{ScriptClients, SheetsClient, DEFAULT_TIMEOUT};
use shopsheets_core::cache::{HttpFetcher, OfflineRouter, RoutePolicy};
use shopsheets_core::dashboard::SheetMap;
use shopsheets_core::store::{ApiKeyStore, SessionStore};
use shopsheets_core::Config;
use tracing::{debug, warn};

/// Everything a command needs, built once at startup.
pub struct Context {
    pub config: Config,
    pub cache_dir: PathBuf,
    pub router: Arc<OfflineRouter>,
    pub scripts: ScriptClients,
}

impl Context {
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT).context("Failed to build HTTP client")?;
        let policy = RoutePolicy::new(&config.app_origin)?;
        let router = OfflineRouter::new(cache_dir.join("responses"), policy, Arc::new(fetcher))?;
        let scripts = ScriptClients::new(&config.scripts, DEFAULT_TIMEOUT)?;

        Ok(Self {
            config,
            cache_dir,
            router: Arc::new(router),
            scripts,
        })
    }

    pub fn session(&self) -> Result<SessionStore> {
        SessionStore::open(&self.cache_dir)
    }

    pub fn sheets(&self, api_key: &str) -> SheetsClient {
        SheetsClient::new(self.router.clone(), &self.config.sheets_api_base, api_key)
    }

    pub fn sheet_map(&self) -> SheetMap {
        SheetMap::new(&self.config.spreadsheets)
    }

    pub fn api_key() -> Result<String> {
        ApiKeyStore::resolve()
            .ok_or_else(|| anyhow::anyhow!("No Google Sheets API key. Run `shop setup` first."))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.cache_dir.join("logs")
    }
}
