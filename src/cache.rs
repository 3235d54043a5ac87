use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory memoize-with-expiry cache: at most one stored value per key,
/// dropped on first read after its TTL elapses. Concurrent misses for the
/// same key both fetch; there is no single-flight de-duplication.
pub struct Cache {
    entries: RwLock<HashMap<String, Entry>>,
    default_ttl: Duration,
}

impl Cache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize,
    {
        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        // Writes double as the sweep point for entries that expired unread.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: serialized,
                expires_at: now + ttl.unwrap_or(self.default_ttl),
            },
        );

        Ok(())
    }

    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    let deserialized = serde_json::from_str(&entry.value)
                        .map_err(|e| AppError::Internal(format!("Deserialization error: {}", e)))?;
                    return Ok(Some(deserialized));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired; drop it so the map does not grow unbounded.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at <= Instant::now() {
                entries.remove(key);
            }
        }
        Ok(None)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

/// Whether a proxy response was served from cache; rendered as the
/// `X-Cache: HIT|MISS` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_stored_value_before_expiry() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("quote_AAPL", &42u64, None).await.unwrap();

        let value: Option<u64> = cache.get("quote_AAPL").await.unwrap();
        assert_eq!(value, Some(42));
    }

    #[tokio::test]
    async fn get_drops_expired_value() {
        let cache = Cache::new(Duration::from_secs(60));
        cache
            .set("quote_AAPL", &42u64, Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        let value: Option<u64> = cache.get("quote_AAPL").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn writes_sweep_entries_that_expired_unread() {
        let cache = Cache::new(Duration::from_secs(60));
        cache
            .set("stale", &1u64, Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.set("fresh", &2u64, None).await.unwrap();

        let entries = cache.entries.read().await;
        assert!(!entries.contains_key("stale"));
        assert!(entries.contains_key("fresh"));
    }

    #[tokio::test]
    async fn set_overwrites_previous_value_for_key() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("k", &1u64, None).await.unwrap();
        cache.set("k", &2u64, None).await.unwrap();

        let value: Option<u64> = cache.get("k").await.unwrap();
        assert_eq!(value, Some(2));
    }

    #[tokio::test]
    async fn delete_removes_value() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("k", &1u64, None).await.unwrap();
        cache.delete("k").await.unwrap();

        let value: Option<u64> = cache.get("k").await.unwrap();
        assert_eq!(value, None);
    }
}
