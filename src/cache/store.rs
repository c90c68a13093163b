//! Time-to-live cache of validated weather payloads.
//!
//! Records are JSON documents `{ "data": ..., "timestamp": <epoch ms> }` kept in a
//! [`KeyValueStore`]. Expiry is evaluated on read only; nothing sweeps the store.

use crate::cache::backend::{KeyValueStore, MemoryStore};
use crate::cache::error::StorageError;
use crate::types::daily_weather::DailyWeather;
use crate::types::params::RequestKey;
use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How long a cached payload stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(1_800_000);

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CacheRecord {
    pub(crate) data: DailyWeather,
    /// Milliseconds since the Unix epoch at the time of `put`.
    pub(crate) timestamp: i64,
}

/// Cache of [`DailyWeather`] keyed by [`RequestKey`].
///
/// All storage faults are logged at `warn` and otherwise ignored: a failed read
/// is a miss, a failed write is skipped.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

impl CacheStore {
    /// A store over `backend` using [`DEFAULT_CACHE_TTL`].
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(backend, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(backend: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached payload if one exists and is younger than the TTL.
    ///
    /// Stale, undecodable, or inconsistent records are deleted as part of the
    /// read and reported as a miss.
    pub async fn get(&self, key: &RequestKey) -> Option<DailyWeather> {
        match self.try_get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Ignoring cache read failure for {}: {}", key, e);
                if matches!(
                    e,
                    StorageError::Decode { .. } | StorageError::Inconsistent { .. }
                ) {
                    self.remove(key).await;
                }
                None
            }
        }
    }

    async fn try_get(&self, key: &RequestKey) -> Result<Option<DailyWeather>, StorageError> {
        let Some(raw) = self.backend.read(key.as_str()).await? else {
            return Ok(None);
        };

        let record: CacheRecord =
            serde_json::from_str(&raw).map_err(|source| StorageError::Decode {
                key: key.to_string(),
                source,
            })?;
        if !record.data.is_consistent() {
            return Err(StorageError::Inconsistent {
                key: key.to_string(),
            });
        }

        let age_ms = Utc::now().timestamp_millis().saturating_sub(record.timestamp);
        if age_ms >= self.ttl_millis() {
            debug!("Cache entry for {} expired ({} ms old)", key, age_ms);
            self.backend.remove(key.as_str()).await?;
            return Ok(None);
        }

        debug!("Cache hit for {}", key);
        Ok(Some(record.data))
    }

    /// Stores `data` under `key` stamped with the current time, replacing any
    /// previous entry.
    pub async fn put(&self, key: &RequestKey, data: &DailyWeather) {
        if let Err(e) = self.try_put(key, data).await {
            warn!("Skipping cache write for {}: {}", key, e);
        }
    }

    async fn try_put(&self, key: &RequestKey, data: &DailyWeather) -> Result<(), StorageError> {
        let record = CacheRecord {
            data: data.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        let raw = serde_json::to_string(&record).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.backend.write(key.as_str(), raw).await
    }

    /// Drops the entry for `key`, if any.
    pub async fn remove(&self, key: &RequestKey) {
        if let Err(e) = self.backend.remove(key.as_str()).await {
            warn!("Failed to remove cache entry for {}: {}", key, e);
        }
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}
