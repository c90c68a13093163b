use std::path::PathBuf;
use thiserror::Error;

/// Faults inside the cache. These are logged and swallowed by
/// [`CacheStore`](crate::CacheStore); a fetch never fails because of one.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to delete cache file '{0}'")]
    CacheDeletion(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode cache record for '{key}'")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode cache record for '{key}'")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cached record for '{key}' has series of unequal length")]
    Inconsistent { key: String },
}
