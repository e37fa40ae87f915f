//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the Apps Script endpoint for each sheet, the spreadsheet ids the
//! dashboard reads, and the origin the offline router treats as the app.
//!
//! Configuration is stored at `~/.config/shopsheets/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "shopsheets";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the stored Sheets API key
pub const API_KEY_ENV: &str = "SHOPSHEETS_SHEETS_API_KEY";

/// Apps Script web app URL per sheet family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptEndpoints {
    pub workers: String,
    pub fabric_orders: String,
    pub tailor_orders: String,
    pub combined_orders: String,
    pub expenses: String,
}

impl Default for ScriptEndpoints {
    fn default() -> Self {
        Self {
            workers: "https://script.google.com/macros/s/AKfycbwVae82BjVTQhiqt0B0aMgg2_C2oNoq6jsWeqsuSrk6KO6b6fBYBG0mefqqFaMtco0S/exec".to_string(),
            fabric_orders: "https://script.google.com/macros/s/YOUR_FABRIC_ORDERS_SCRIPT/exec".to_string(),
            tailor_orders: "https://script.google.com/macros/s/YOUR_TAILOR_ORDERS_SCRIPT/exec".to_string(),
            combined_orders: "https://script.google.com/macros/s/AKfycbwFsxqgYxfi5nXNMo9hiRVhzyYtFuQaexV_mVwt8Mdk9Veb1_mUkJR3fg7CNvZk_L7x/exec".to_string(),
            expenses: "https://script.google.com/macros/s/AKfycbxT5VTEBWxliIxm3P9LgtaNgKjiucgGa75jyAIExtHGRKTlUMspaCrbg5d4QdIdmtOY/exec".to_string(),
        }
    }
}

impl ScriptEndpoints {
    /// Placeholder URLs are shipped for endpoints the shop has not deployed yet.
    pub fn is_configured(url: &str) -> bool {
        !url.is_empty() && !url.contains("/YOUR_")
    }
}

/// Spreadsheet ids read by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpreadsheetIds {
    pub combined_orders: String,
    pub fabric_orders: String,
    pub tailoring_orders: String,
    pub expenses: String,
    pub workers: String,
}

impl Default for SpreadsheetIds {
    fn default() -> Self {
        Self {
            combined_orders: "199mFt3yz1cZQUGcF84pZgNQoxCpOS2gHxFGDD71CZVg".to_string(),
            fabric_orders: "1tFb4EBzzvdmDNY0bOtyTXAhX1aRqzfq7NzXLhDqYj0o".to_string(),
            tailoring_orders: "128vwp1tjsej9itNAkQY1Y-5sJsMv3N1TZi5Pl9Wgn6Y".to_string(),
            expenses: "1QD0FHcJl7og1Fc1_BdQG2BCQq-N7KIr49jw3whzarXc".to_string(),
            workers: "1msVf01VuWsk1mhSMVrvypq_7ubSVjDKlr8aG-6bqE7Q".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scripts: ScriptEndpoints,
    pub spreadsheets: SpreadsheetIds,
    /// Base URL of the public Sheets values API
    pub sheets_api_base: String,
    /// Origin whose app routes and `/static/` assets get the local strategies
    pub app_origin: String,
    /// Dashboard auto-refresh interval in seconds
    pub refresh_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scripts: ScriptEndpoints::default(),
            spreadsheets: SpreadsheetIds::default(),
            sheets_api_base: "https://sheets.googleapis.com".to_string(),
            app_origin: "http://127.0.0.1:3000".to_string(),
            refresh_interval_secs: 5 * 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"app_origin": "http://shop.local"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.app_origin, "http://shop.local");
        assert_eq!(config.refresh_interval_secs, 300);
        assert_eq!(config.spreadsheets, SpreadsheetIds::default());
    }

    #[test]
    fn test_placeholder_endpoint_is_not_configured() {
        let scripts = ScriptEndpoints::default();
        assert!(!ScriptEndpoints::is_configured(&scripts.fabric_orders));
        assert!(ScriptEndpoints::is_configured(&scripts.workers));
        assert!(!ScriptEndpoints::is_configured(""));
    }
}
