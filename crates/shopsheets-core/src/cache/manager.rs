use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::fetch::FetchResponse;

/// One stored response, keyed by its request URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    #[serde(serialize_with = "encode_body", deserialize_with = "decode_body")]
    pub body: Vec<u8>,
    pub cached_at: DateTime<Utc>,
}

fn encode_body<S: Serializer>(body: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(body))
}

fn decode_body<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

impl CachedResponse {
    pub fn to_response(&self) -> FetchResponse {
        FetchResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Entry file stem: hex SHA-256 of the URL.
fn url_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// A named, versioned response cache stored as one JSON file per URL under
/// `<root>/<name>/`.
pub struct CacheManager {
    cache_dir: PathBuf,
    name: String,
}

impl CacheManager {
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        let cache_dir = root.join(name);
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self {
            cache_dir,
            name: name.to_string(),
        })
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", url_key(url)))
    }

    pub fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
        let path = self.entry_path(url);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache entry for {}", url))?;
        let cached: CachedResponse = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache entry for {}", url))?;
        Ok(Some(cached))
    }

    /// Replace the entry for `url`. Readers see either the old or the new
    /// entry, never a partial write.
    pub fn put(&self, url: &str, response: &FetchResponse) -> Result<()> {
        let cached = CachedResponse {
            url: url.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            cached_at: Utc::now(),
        };
        let contents = serde_json::to_string(&cached)?;

        let path = self.entry_path(url);
        let tmp = self.cache_dir.join(format!(
            ".{}.{}.{}.tmp",
            url_key(url),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache entry for {}", url))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("Failed to commit cache entry for {}", url));
        }
        debug!(cache = %self.name, url, bytes = response.body.len(), "Cached response");
        Ok(())
    }

    /// Names of all caches present under `root`.
    pub fn cache_names(root: &Path) -> Result<Vec<String>> {
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete_cache(root: &Path, name: &str) -> Result<()> {
        let dir = root.join(name);
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to delete cache: {}", dir.display()))?;
        debug!(cache = name, "Deleted cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_put_then_get() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::open(dir.path(), "shop-manager-v3").unwrap();
        let url = "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Orders?key=k";

        assert!(cache.get(url).unwrap().is_none());

        let response = FetchResponse::new(200, vec![0u8, 159, 146, 150]).with_header("content-type", "application/json");
        cache.put(url, &response).unwrap();

        let cached = cache.get(url).unwrap().unwrap();
        assert_eq!(cached.to_response(), response);
        assert_eq!(cached.url, url);
    }

    #[test]
    fn test_entry_file_named_by_url_digest() {
        let key = url_key("/orders");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, url_key("/orders"));
        assert_ne!(key, url_key("/orders?page=2"));

        let dir = tempdir().unwrap();
        let cache = CacheManager::open(dir.path(), "c").unwrap();
        cache.put("/orders", &FetchResponse::new(200, "rows")).unwrap();
        assert!(dir.path().join("c").join(format!("{}.json", key)).exists());
    }

    #[test]
    fn test_put_replaces_entry_without_leftovers() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::open(dir.path(), "c").unwrap();
        cache.put("/orders", &FetchResponse::new(200, "old")).unwrap();
        cache.put("/orders", &FetchResponse::new(200, "new")).unwrap();

        assert_eq!(cache.get("/orders").unwrap().unwrap().body, b"new");
        let files: Vec<_> = std::fs::read_dir(dir.path().join("c")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_cache_names_and_delete() {
        let dir = tempdir().unwrap();
        CacheManager::open(dir.path(), "shop-manager-v2").unwrap();
        CacheManager::open(dir.path(), "shop-manager-v3").unwrap();
        assert_eq!(
            CacheManager::cache_names(dir.path()).unwrap(),
            vec!["shop-manager-v2", "shop-manager-v3"]
        );

        CacheManager::delete_cache(dir.path(), "shop-manager-v2").unwrap();
        assert_eq!(CacheManager::cache_names(dir.path()).unwrap(), vec!["shop-manager-v3"]);
    }

    #[test]
    fn test_age_display() {
        let mut cached = CachedResponse {
            url: "/".to_string(),
            status: 200,
            headers: BTreeMap::new(),
            body: Vec::new(),
            cached_at: Utc::now(),
        };
        assert_eq!(cached.age_display(), "just now");
        cached.cached_at = Utc::now() - chrono::Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");
        cached.cached_at = Utc::now() - chrono::Duration::hours(30);
        assert_eq!(cached.age_display(), "1d ago");
    }
}
