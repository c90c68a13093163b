use crate::validation::error::SchemaError;
use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Why a fetch failed.
///
/// Every caller sharing one in-flight request receives a clone of the same
/// value, which is why the transport source sits behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Network request failed for {url}")]
    Network {
        url: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    #[error("Failed to fetch weather data: {status} {status_text}")]
    HttpStatus { status: u16, status_text: String },

    /// The archive answered with `{ "error": true, "reason": ... }`.
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Weather request was cancelled before it completed")]
    Cancelled,
}

impl FetchError {
    pub fn network(url: impl Into<String>, source: impl StdError + Send + Sync + 'static) -> Self {
        FetchError::Network {
            url: url.into(),
            source: Arc::new(source),
        }
    }
}

/// Failures while setting up an [`ArchiveClient`](crate::ArchiveClient).
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),
}
