use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Autosaved drafts older than this are not restored.
const AUTOSAVE_MAX_AGE_HOURS: i64 = 24;

/// Keys shared with the combined-order flow.
pub mod keys {
    pub const COMBINED_ORDER_DATA: &str = "combinedOrderData";
    pub const MASTER_ORDER_ID: &str = "master_order_id";
    pub const EXPECTED_FABRIC_ID: &str = "expected_fabric_id";
    pub const EXPECTED_TAILOR_ID: &str = "expected_tailor_id";
    pub const TAILOR_ORDER_DATA: &str = "tailor_order_data";
    pub const COMBINED_ORDER_ADDRESS: &str = "combinedOrderAddress";

    pub fn autosave(page_key: &str) -> String {
        format!("autosave_{}", page_key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveSnapshot<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub page: String,
}

impl<T> AutosaveSnapshot<T> {
    pub fn is_expired(&self) -> bool {
        Utc::now() - self.timestamp >= Duration::hours(AUTOSAVE_MAX_AGE_HOURS)
    }
}

/// JSON key/value store persisted to `session.json` after every write.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl SessionStore {
    /// Open the store in `dir`, loading any existing file.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(SESSION_FILE);
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
            match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Session file is corrupt, starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable session value");
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to encode session value: {}", key))?;
        self.entries.insert(key.to_string(), value);
        self.save()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.remove_all(&[key])
    }

    pub fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        let mut changed = false;
        for key in keys {
            changed |= self.entries.remove(*key).is_some();
        }
        if changed {
            self.save()?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).context("Failed to write session file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace session file")?;
        Ok(())
    }

    // ===== Autosave =====

    pub fn save_draft<T: Serialize>(&mut self, page_key: &str, draft: &T) -> Result<()> {
        let snapshot = AutosaveSnapshot {
            data: draft,
            timestamp: Utc::now(),
            page: page_key.to_string(),
        };
        self.set(&keys::autosave(page_key), &snapshot)
    }

    /// The autosaved draft for `page_key` unless it is older than 24 hours.
    /// An expired snapshot is dropped from the store.
    pub fn restore_draft<T: DeserializeOwned>(&mut self, page_key: &str) -> Option<AutosaveSnapshot<T>> {
        let key = keys::autosave(page_key);
        let snapshot: AutosaveSnapshot<T> = self.get(&key)?;
        if !snapshot.is_expired() {
            return Some(snapshot);
        }
        if let Err(e) = self.remove(&key) {
            warn!(key, error = %e, "Failed to drop expired draft");
        }
        None
    }

    pub fn clear_draft(&mut self, page_key: &str) -> Result<()> {
        self.remove(&keys::autosave(page_key))
    }
}
