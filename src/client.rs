//! This module provides the main entry point of the crate, [`ArchiveClient`].
//! It fetches daily temperature series for a coordinate and date range, answering
//! from its cache when it can, merging identical concurrent requests, and spacing
//! out the requests that do reach the network.

use crate::cache::backend::{KeyValueStore, MemoryStore};
use crate::cache::file_store::FileStore;
use crate::cache::store::{CacheStore, DEFAULT_CACHE_TTL};
use crate::error::{ArchiveError, FetchError};
use crate::in_flight::InFlightRegistry;
use crate::throttle::{RequestThrottle, DEFAULT_MIN_INTERVAL};
use crate::transport::{HttpTransport, Transport, ARCHIVE_URL};
use crate::types::daily_weather::DailyWeather;
use crate::types::params::{FetchParams, RequestKey};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use crate::validation::error::SchemaError;
use crate::validation::validator::{validate_daily, DAILY_METRICS};
use bon::bon;
use log::{info, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The main client for the historical weather archive.
///
/// One instance owns the cache, the table of in-flight requests and the request
/// throttle. Share it (by reference or inside an `Arc`) between every part of the
/// application that fetches weather; separate instances do not coordinate.
///
/// Create an instance with [`ArchiveClient::default()`] for an in-memory cache,
/// [`ArchiveClient::with_cache_folder()`] for a cache that survives restarts, or
/// [`ArchiveClient::builder()`] to configure everything.
///
/// # Examples
///
/// ```no_run
/// # use weather_archive::{ArchiveClient, FetchError, FetchParams};
/// # async fn run() -> Result<(), FetchError> {
/// let client = ArchiveClient::default();
/// let params = FetchParams::new("52.52", "13.41", "2023-01-01", "2023-01-07");
/// let weather = client.fetch(&params).await?;
/// for day in weather.records() {
///     println!("{}: {:?} °C", day.date, day.temp_mean);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ArchiveClient {
    dispatcher: Dispatcher,
    in_flight: InFlightRegistry<DailyWeather>,
}

/// Everything a network round trip needs, cheap to clone into its own task.
#[derive(Clone)]
struct Dispatcher {
    endpoint: Arc<str>,
    transport: Arc<dyn Transport>,
    cache: CacheStore,
    throttle: Arc<RequestThrottle>,
}

impl Default for ArchiveClient {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[bon]
impl ArchiveClient {
    /// Creates a client from explicit settings. Every setting is optional.
    ///
    /// # Arguments
    ///
    /// * `.endpoint(impl Into<String>)`: Archive URL. Defaults to [`ARCHIVE_URL`].
    /// * `.transport(Arc<dyn Transport>)`: How requests are sent. Defaults to [`HttpTransport`].
    /// * `.store(Arc<dyn KeyValueStore>)`: Where cache records live. Defaults to a fresh [`MemoryStore`].
    /// * `.cache_ttl(Duration)`: Lifetime of a cache entry. Defaults to 30 minutes.
    /// * `.min_interval(Duration)`: Minimum spacing between network requests. Defaults to 1 second.
    ///
    /// # Examples
    ///
    /// ```
    /// # use weather_archive::{ArchiveClient, MemoryStore};
    /// # use std::sync::Arc;
    /// # use std::time::Duration;
    /// let client = ArchiveClient::builder()
    ///     .store(Arc::new(MemoryStore::new()))
    ///     .cache_ttl(Duration::from_secs(300))
    ///     .min_interval(Duration::from_millis(1500))
    ///     .build();
    /// assert_eq!(client.cache().ttl(), Duration::from_secs(300));
    /// ```
    #[builder]
    pub fn new(
        #[builder(into)] endpoint: Option<String>,
        transport: Option<Arc<dyn Transport>>,
        store: Option<Arc<dyn KeyValueStore>>,
        cache_ttl: Option<Duration>,
        min_interval: Option<Duration>,
    ) -> Self {
        let endpoint = endpoint.unwrap_or_else(|| ARCHIVE_URL.to_string());
        let transport = transport.unwrap_or_else(|| Arc::new(HttpTransport::new()));
        let store = store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let cache_ttl = cache_ttl.unwrap_or(DEFAULT_CACHE_TTL);
        let min_interval = min_interval.unwrap_or(DEFAULT_MIN_INTERVAL);

        Self {
            dispatcher: Dispatcher {
                endpoint: Arc::from(endpoint),
                transport,
                cache: CacheStore::with_ttl(store, cache_ttl),
                throttle: Arc::new(RequestThrottle::new(min_interval)),
            },
            in_flight: InFlightRegistry::new(),
        }
    }

    /// Creates a client that keeps its cache as JSON files in `cache_folder`.
    ///
    /// Cached entries written by an earlier client using the same folder are
    /// served until they expire.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::CacheDirCreation`] if the folder cannot be created
    /// or the path exists and is not a directory.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, ArchiveError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| ArchiveError::CacheDirCreation(cache_folder.clone(), e))?;
        Ok(Self::builder()
            .store(Arc::new(FileStore::new(&cache_folder)))
            .build())
    }

    /// Like [`ArchiveClient::with_cache_folder`], using the platform cache
    /// directory (e.g. `~/.cache/weather_archive_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::CacheDirResolution`] if the platform has no cache
    /// directory, or [`ArchiveError::CacheDirCreation`] if it cannot be created.
    pub async fn with_default_cache_folder() -> Result<Self, ArchiveError> {
        let cache_folder = get_cache_dir().map_err(ArchiveError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    /// Fetches the daily temperature series for `params`.
    ///
    /// A valid cache entry is returned without touching the network or the
    /// throttle. Otherwise the request joins an identical request already in
    /// flight, or starts one: wait for the throttle, GET the archive, validate
    /// the body, cache it. Every caller sharing a request gets the same result.
    /// Failures are never cached and never retried; the next call tries again.
    ///
    /// Parameters are not checked for plausibility here, see
    /// [`FetchParams::check`].
    ///
    /// # Errors
    ///
    /// * [`FetchError::Network`] if the request could not be sent or read.
    /// * [`FetchError::HttpStatus`] if the archive answered with a non-success status.
    /// * [`FetchError::Upstream`] if the archive reported an error in its body.
    /// * [`FetchError::Schema`] if the body is not the expected shape.
    /// * [`FetchError::Cancelled`] if the request task was torn down.
    pub async fn fetch(&self, params: &FetchParams) -> Result<DailyWeather, FetchError> {
        let key = params.key();
        if let Some(hit) = self.dispatcher.cache.get(&key).await {
            return Ok(hit);
        }

        let operation = self.dispatcher.clone().run(params.clone(), key.clone());
        self.in_flight.register(key, operation).await
    }

    /// Drops the cached entry for `params`, so the next fetch goes to the network.
    pub async fn invalidate(&self, params: &FetchParams) {
        self.dispatcher.cache.remove(&params.key()).await;
    }

    pub fn cache(&self) -> &CacheStore {
        &self.dispatcher.cache
    }

    pub fn endpoint(&self) -> &str {
        &self.dispatcher.endpoint
    }

    /// Number of distinct requests currently waiting on the network.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.pending_count()
    }
}

impl Dispatcher {
    async fn run(self, params: FetchParams, key: RequestKey) -> Result<DailyWeather, FetchError> {
        self.throttle.acquire().await;

        let metrics = DAILY_METRICS.join(",");
        let mut query = params.query_pairs().to_vec();
        query.push(("daily", metrics.as_str()));

        info!("Requesting daily weather for {} from {}", key, self.endpoint);
        let response = self.transport.get(&self.endpoint, &query).await?;
        if !response.is_success() {
            warn!(
                "Archive answered {} {} for {}",
                response.status, response.status_text, key
            );
            return Err(FetchError::HttpStatus {
                status: response.status,
                status_text: response.status_text,
            });
        }

        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| SchemaError::MalformedBody(e.to_string()))?;
        if let Some(reason) = upstream_error(&body) {
            warn!("Archive rejected request {}: {}", key, reason);
            return Err(FetchError::Upstream(reason));
        }

        let data = validate_daily(&body)?;
        self.cache.put(&key, &data).await;
        info!("Cached {} days of weather for {}", data.len(), key);
        Ok(data)
    }
}

/// The vendor signals failures with `{ "error": true, "reason": "..." }`.
fn upstream_error(body: &Value) -> Option<String> {
    if !matches!(body.get("error"), Some(Value::Bool(true))) {
        return None;
    }
    let reason = body
        .get("reason")
        .and_then(Value::as_str)
        .filter(|reason| !reason.is_empty())
        .unwrap_or("API returned an error");
    Some(reason.to_string())
}
