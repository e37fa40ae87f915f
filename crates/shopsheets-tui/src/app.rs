//! Application state for the terminal dashboard.
//!
//! `App` owns the loaded [`DashboardData`], the UI state and the channels
//! that deliver background refresh results and offline-cache notices.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Local;
use shopsheets_core::api::SheetsClient;
use shopsheets_core::cache::{ClientMessage, MessageKind};
use shopsheets_core::dashboard::{search_workers, DashboardData, PaymentFilter, SheetMap};
use shopsheets_core::models::{PaymentRecord, Worker};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// Buffer size for the background refresh channel.
const CHANNEL_BUFFER_SIZE: usize = 4;

/// Rows moved by page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Activity,
    Workers,
    Payments,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Overview, Tab::Activity, Tab::Workers, Tab::Payments];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Activity => "Activity",
            Tab::Workers => "Workers",
            Tab::Payments => "Payments",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Overview => Tab::Activity,
            Tab::Activity => Tab::Workers,
            Tab::Workers => Tab::Payments,
            Tab::Payments => Tab::Overview,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Overview => Tab::Payments,
            Tab::Activity => Tab::Overview,
            Tab::Workers => Tab::Activity,
            Tab::Payments => Tab::Workers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    Quitting,
}

pub struct App {
    pub state: AppState,
    pub current_tab: Tab,
    pub data: DashboardData,
    pub loading: bool,
    /// Shown while the router is serving cached data.
    pub banner: Option<String>,
    pub status_message: Option<String>,
    pub search_query: String,
    pub selection: usize,

    sheets: SheetsClient,
    sheet_map: SheetMap,
    refresh_interval: Duration,
    last_refresh: Option<Instant>,
    refresh_tx: mpsc::Sender<DashboardData>,
    refresh_rx: mpsc::Receiver<DashboardData>,
    router_rx: broadcast::Receiver<ClientMessage>,
    /// URLs last served from the cache, with the notice that said so.
    stale_urls: BTreeMap<String, MessageKind>,
}

impl App {
    pub fn new(sheets: SheetsClient, sheet_map: SheetMap, refresh_interval: Duration) -> Self {
        let (refresh_tx, refresh_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let router_rx = sheets.router().subscribe();
        Self {
            state: AppState::Normal,
            current_tab: Tab::Overview,
            data: DashboardData::default(),
            loading: false,
            banner: None,
            status_message: None,
            search_query: String::new(),
            selection: 0,
            sheets,
            sheet_map,
            refresh_interval,
            last_refresh: None,
            refresh_tx,
            refresh_rx,
            router_rx,
            stale_urls: BTreeMap::new(),
        }
    }

    /// Load every sheet in a background task; the result arrives through
    /// [`App::check_background_tasks`].
    pub fn refresh_background(&mut self) {
        if self.loading {
            debug!("Refresh already in flight");
            return;
        }
        self.loading = true;
        self.last_refresh = Some(Instant::now());
        self.stale_urls.clear();
        self.status_message = Some("Loading data from Google Sheets...".to_string());

        let sheets = self.sheets.clone();
        let sheet_map = self.sheet_map.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            let data = DashboardData::load(&sheets, &sheet_map).await;
            let _ = tx.send(data).await;
        });
    }

    pub fn is_refresh_due(&self) -> bool {
        match self.last_refresh {
            Some(at) => at.elapsed() >= self.refresh_interval,
            None => true,
        }
    }

    /// Drain finished refreshes and router notices. Starts the periodic
    /// refresh when it is due.
    pub fn check_background_tasks(&mut self) {
        while let Ok(data) = self.refresh_rx.try_recv() {
            self.apply_refresh(data);
        }

        loop {
            match self.router_rx.try_recv() {
                Ok(message) => self.apply_router_message(&message),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Dropped router notices");
                }
                Err(_) => break,
            }
        }

        if self.is_refresh_due() {
            self.refresh_background();
        }
    }

    fn apply_refresh(&mut self, data: DashboardData) {
        self.loading = false;
        self.status_message = if data.failed_sheets.is_empty() {
            Some(format!("Updated {}", Local::now().format("%H:%M")))
        } else {
            Some(format!("Could not load: {}", data.failed_sheets.join(", ")))
        };
        info!(orders = data.order_count(), "Dashboard refreshed");
        self.data = data;
        self.clamp_selection();
        self.update_banner();
    }

    /// Notices are per URL; the banner reflects every sheet of the last
    /// refresh and is settled once the refresh lands.
    fn apply_router_message(&mut self, message: &ClientMessage) {
        let url = message.url.clone().unwrap_or_default();
        match message.kind {
            MessageKind::DataFresh | MessageKind::DataUpdated => {
                self.stale_urls.remove(&url);
            }
            MessageKind::Offline
            | MessageKind::FallbackToCache
            | MessageKind::StaleData
            | MessageKind::DataStale => {
                self.stale_urls.insert(url, message.kind);
            }
            MessageKind::BackgroundSyncFailed => {
                self.status_message = Some("Background sync failed".to_string());
            }
            MessageKind::SwActivated => {}
        }
        if !self.loading {
            self.update_banner();
        }
    }

    fn update_banner(&mut self) {
        if self.stale_urls.is_empty() {
            self.banner = None;
            return;
        }
        let offline = self.stale_urls.values().any(|kind| *kind != MessageKind::DataStale);
        let text = if offline {
            "Offline: showing cached data"
        } else {
            "Cached data may be out of date"
        };
        let router = self.sheets.router();
        let oldest = self
            .stale_urls
            .keys()
            .filter_map(|url| router.cached_entry(url))
            .min_by_key(|entry| entry.cached_at);
        self.banner = Some(match oldest {
            Some(entry) => format!("{} ({})", text, entry.age_display()),
            None => text.to_string(),
        });
    }

    // ===== Lists =====

    pub fn workers(&self) -> Vec<Worker> {
        self.data.worker_list()
    }

    pub fn filtered_workers(&self) -> Vec<Worker> {
        let workers = self.workers();
        search_workers(&workers, &self.search_query).into_iter().cloned().collect()
    }

    pub fn payment_filter(&self) -> PaymentFilter {
        PaymentFilter {
            notes: Some(self.search_query.clone()).filter(|q| !q.trim().is_empty()),
            ..PaymentFilter::default()
        }
    }

    pub fn filtered_payments(&self) -> Vec<PaymentRecord> {
        let records = self.data.payment_records();
        self.payment_filter().apply(&records).into_iter().cloned().collect()
    }

    fn list_len(&self) -> usize {
        match self.current_tab {
            Tab::Workers => self.filtered_workers().len(),
            Tab::Payments => self.filtered_payments().len(),
            Tab::Overview | Tab::Activity => 0,
        }
    }

    // ===== Navigation =====

    pub fn switch_tab(&mut self, tab: Tab) {
        if self.current_tab != tab {
            self.current_tab = tab;
            self.selection = 0;
            self.search_query.clear();
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.list_len();
        if len == 0 {
            self.selection = 0;
            return;
        }
        let next = self.selection as isize + delta;
        self.selection = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn clamp_selection(&mut self) {
        self.move_selection(0);
    }
}
