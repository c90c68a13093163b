//! Client for historical daily weather from the Open-Meteo archive.
//!
//! [`ArchiveClient::fetch`] returns the daily temperature series for a
//! coordinate and date range. Results are cached for 30 minutes, identical
//! concurrent requests share one network round trip, network requests are
//! spaced at least one second apart, and response bodies are validated before
//! they are returned or cached.

mod cache;
mod client;
mod error;
mod in_flight;
mod throttle;
mod transport;
mod types;
mod utils;
mod validation;

pub use client::ArchiveClient;
pub use error::{ArchiveError, FetchError};

pub use cache::backend::{KeyValueStore, MemoryStore};
pub use cache::error::StorageError;
pub use cache::file_store::FileStore;
pub use cache::store::{CacheStore, DEFAULT_CACHE_TTL};

pub use in_flight::InFlightRegistry;
pub use throttle::{RequestThrottle, DEFAULT_MIN_INTERVAL};
pub use transport::{HttpTransport, Transport, TransportResponse, ARCHIVE_URL};

pub use types::daily_weather::{DailyRecord, DailyWeather};
pub use types::params::{FetchParams, InputError, RequestKey};

pub use validation::error::SchemaError;
pub use validation::validator::{validate_daily, DAILY_METRICS};
