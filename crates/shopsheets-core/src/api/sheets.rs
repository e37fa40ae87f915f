use std::sync::Arc;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::ApiError;
use crate::cache::{FetchRequest, FetchResponse, OfflineRouter, RouteError};
use crate::models::cell::cell_text;

/// Sheet read by the connection test.
pub const CONNECTION_TEST_SHEET: &str = "Worker_List";

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Read-only client for the public Sheets values API.
#[derive(Clone)]
pub struct SheetsClient {
    router: Arc<OfflineRouter>,
    base_url: String,
    api_key: String,
}

impl SheetsClient {
    pub fn new(router: Arc<OfflineRouter>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            router,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn router(&self) -> &Arc<OfflineRouter> {
        &self.router
    }

    pub fn values_url(&self, spreadsheet_id: &str, sheet: &str) -> Result<Url, ApiError> {
        build_values_url(&self.base_url, spreadsheet_id, sheet, &self.api_key)
    }

    /// Every row of `sheet`, header row included, cells rendered as text.
    pub async fn fetch_values(&self, spreadsheet_id: &str, sheet: &str) -> Result<Vec<Vec<String>>, ApiError> {
        let url = self.values_url(spreadsheet_id, sheet)?;
        debug!(spreadsheet_id, sheet, "Fetching sheet values");
        read_values(self.router.handle(FetchRequest::get(url)).await)
    }

    /// Read the worker list with `api_key` from the network; a cached copy
    /// never counts. The error carries the API's message.
    pub async fn test_connection(&self, api_key: &str, workers_spreadsheet_id: &str) -> Result<(), ApiError> {
        let url = build_values_url(&self.base_url, workers_spreadsheet_id, CONNECTION_TEST_SHEET, api_key)?;
        read_values(self.router.fetch_live(&FetchRequest::get(url)).await).map(|_| ())
    }
}

fn build_values_url(base: &str, spreadsheet_id: &str, sheet: &str, api_key: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(base)
        .map_err(|e| ApiError::InvalidResponse(format!("Invalid Sheets API base {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidResponse(format!("Invalid Sheets API base {}", base)))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", sheet]);
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

fn read_values(routed: Result<FetchResponse, RouteError>) -> Result<Vec<Vec<String>>, ApiError> {
    let response = match routed {
        Ok(response) => response,
        Err(RouteError::Unavailable { status, body, .. }) => return Err(sheets_error(status, &body)),
        Err(e) => return Err(e.into()),
    };
    if !response.ok() {
        return Err(sheets_error(response.status, &response.text()));
    }
    parse_values(&response.text())
}

/// Parse a values reply; a sheet with no data has no `values` key.
pub fn parse_values(text: &str) -> Result<Vec<Vec<String>>, ApiError> {
    let parsed: ValuesResponse = serde_json::from_str(text).map_err(|e| {
        ApiError::InvalidResponse(format!("{}: {}", e, ApiError::truncate_body(text)))
    })?;
    Ok(parsed
        .values
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn sheets_error(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| "Invalid API key".to_string());
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    match ApiError::from_status(status, &message) {
        // Sheets reports a bad key as 400 with a message worth showing as-is
        ApiError::InvalidResponse(_) => ApiError::Rejected(message),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FetchError, Fetcher, RoutePolicy};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Answers every request with an empty worker sheet until switched off.
    #[derive(Default)]
    struct SwitchFetcher {
        offline: AtomicBool,
    }

    #[async_trait]
    impl Fetcher for SwitchFetcher {
        async fn fetch(&self, _request: &FetchRequest) -> Result<FetchResponse, FetchError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(FetchError::Network("connection refused".to_string()));
            }
            Ok(FetchResponse::new(200, r#"{"values": [["Name"]]}"#))
        }
    }

    #[tokio::test]
    async fn test_connection_is_not_answered_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(SwitchFetcher::default());
        let router = OfflineRouter::new(
            dir.path().to_path_buf(),
            RoutePolicy::new("http://shop.local").unwrap(),
            fetcher.clone(),
        )
        .unwrap();
        let client = SheetsClient::new(Arc::new(router), "https://sheets.googleapis.com", "k");

        client.test_connection("k", "workers").await.unwrap();
        client.fetch_values("workers", CONNECTION_TEST_SHEET).await.unwrap();
        fetcher.offline.store(true, Ordering::SeqCst);

        // Dashboard reads fall back to the cached sheet, the key check does not
        assert_eq!(
            client.fetch_values("workers", CONNECTION_TEST_SHEET).await.unwrap(),
            vec![vec!["Name"]]
        );
        let err = client.test_connection("k", "workers").await.unwrap_err();
        assert!(matches!(err, ApiError::Offline(_)));
    }

    #[test]
    fn test_values_url_encodes_sheet_name() {
        let url = build_values_url("https://sheets.googleapis.com", "abc123", "Combine Orders", "k&ey").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Combine%20Orders?key=k%26ey"
        );
    }

    #[test]
    fn test_parse_values() {
        let text = r#"{"range": "Orders!A1:C3", "values": [["Order ID", "Price"], ["T1", 450], ["T2"]]}"#;
        let rows = parse_values(text).unwrap();
        assert_eq!(rows, vec![vec!["Order ID", "Price"], vec!["T1", "450"], vec!["T2"]]);

        assert!(parse_values(r#"{"range": "Empty!A1:Z1000"}"#).unwrap().is_empty());
        assert!(parse_values("not json").is_err());
    }

    #[test]
    fn test_sheets_error_uses_api_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        let err = sheets_error(400, body);
        assert!(matches!(err, ApiError::Rejected(m) if m.starts_with("API key not valid")));

        let err = sheets_error(403, "<html>");
        assert!(matches!(err, ApiError::AccessDenied(m) if m == "Invalid API key"));
    }
}
