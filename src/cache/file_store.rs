use crate::cache::backend::KeyValueStore;
use crate::cache::error::StorageError;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

/// Persistent store keeping one JSON file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// concurrent reader never observes a half-written record.
#[derive(Debug)]
pub struct FileStore {
    cache_dir: PathBuf,
    write_seq: AtomicU64,
}

impl FileStore {
    /// Uses `cache_dir` as storage. The directory is created on first write if
    /// it does not exist yet.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            write_seq: AtomicU64::new(0),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Maps a key to a file-name-safe stem. Bytes outside `[A-Za-z0-9._-]` are
/// percent-encoded so distinct keys never share a file.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                stem.push(byte as char)
            }
            _ => {
                let _ = write!(stem, "%{byte:02X}");
            }
        }
    }
    stem
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::CacheRead(path, e)),
        }
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| StorageError::CacheDirCreation(self.cache_dir.clone(), e))?;

        let path = self.path_for(key);
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp_path = path.with_extension(format!("json.{}-{seq}.tmp", std::process::id()));

        if let Err(e) = fs::write(&tmp_path, value).await {
            return Err(StorageError::CacheWrite(tmp_path, e));
        }
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::CacheWrite(path, e));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::CacheDeletion(path, e)),
        }
    }
}
