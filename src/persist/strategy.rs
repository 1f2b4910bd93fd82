//! File Cache Strategy Module
//!
//! Disk-persisted cache: one JSON file per entry plus an `index.json`
//! manifest, surviving process restarts. Keys are hashed into filenames,
//! every read verifies a content hash, and corrupt entries are purged on
//! sight. The whole surface is infallible by contract — failures are
//! logged and degrade to a miss or a skipped write, never an error to
//! the caller.
//!
//! This store does not sit underneath the in-memory cache; it is an
//! independent alternative with its own eviction policy (largest files
//! first rather than least recently used).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::cache::current_timestamp_ms;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::keys::{content_hash, hash_key};
use crate::persist::index::{CacheIndex, IndexEntry, INDEX_FILE};

// == File Cache Entry ==
/// On-disk payload: the value plus its expiry deadline, creation time,
/// and a content hash used to detect corruption on read.
#[derive(Debug, Serialize, Deserialize)]
struct FileCacheEntry {
    value: Value,
    expires: Option<u64>,
    created: u64,
    hash: String,
}

// == File Cache Stats ==
/// Point-in-time snapshot of the on-disk cache.
#[derive(Debug, Clone, Serialize)]
pub struct FileCacheStats {
    /// Number of keys in the manifest
    pub entries: usize,
    /// Bytes held by entry files (manifest excluded)
    pub total_size: u64,
    /// Modification time of the oldest entry file
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Modification time of the newest entry file
    pub newest_entry: Option<DateTime<Utc>>,
}

// == File Cache Strategy ==
/// Persistent cache rooted at one directory.
#[derive(Debug)]
pub struct FileCacheStrategy {
    dir: PathBuf,
    max_size: u64,
    index: CacheIndex,
}

impl FileCacheStrategy {
    // == Constructors ==
    /// Opens (or creates) a cache directory and loads its manifest,
    /// sweeping entries that expired while the process was away.
    ///
    /// This is the one fallible call on the type: a directory that
    /// cannot be created is unrecoverable for a persistent cache.
    pub async fn open(dir: impl Into<PathBuf>, max_size: u64) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        let index = CacheIndex::load(&dir).await;
        let mut strategy = Self {
            dir,
            max_size,
            index,
        };

        let swept = strategy.sweep_expired().await;
        if swept > 0 {
            info!(
                "Swept {} expired entries from {}",
                swept,
                strategy.dir.display()
            );
        }
        Ok(strategy)
    }

    /// Opens the cache at the configured directory and byte budget.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::open(config.cache_dir.clone(), config.file_cache_max_size).await
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Absent, expired, unreadable, and corrupted entries all come back
    /// as `None`; expiry and corruption additionally purge the entry and
    /// its manifest row.
    pub async fn get(&mut self, key: &str) -> Option<Value> {
        let now = current_timestamp_ms();
        let (file, expired) = match self.index.get(key) {
            Some(entry) => (entry.file.clone(), entry.is_expired_at(now)),
            None => return None,
        };

        if expired {
            debug!("Cache entry '{}' expired", key);
            self.remove_key(key).await;
            self.persist_index().await;
            return None;
        }

        let path = self.dir.join(&file);
        let entry = match self.read_entry(&path).await {
            Some(entry) => entry,
            None => {
                // Unreadable payload: drop the dangling manifest row
                self.remove_key(key).await;
                self.persist_index().await;
                return None;
            }
        };

        let actual = content_hash(&entry.value);
        if actual != entry.hash {
            let error = CacheError::Integrity {
                key: key.to_string(),
                expected: entry.hash,
                actual,
            };
            warn!("Purging corrupt cache entry: {}", error);
            self.remove_key(key).await;
            self.persist_index().await;
            return None;
        }

        Some(entry.value)
    }

    // == Set ==
    /// Stores a value under a key with optional TTL.
    ///
    /// The payload is written first, then the manifest; a write failure
    /// is logged and leaves the cache as it was. Finishes with a size
    /// check that trims the directory back under its budget.
    ///
    /// # Arguments
    /// * `key` - Logical key; the filename is derived by hashing it
    /// * `value` - The value to persist
    /// * `ttl` - Optional time to live; `None` or zero means never expires
    pub async fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) {
        let now = current_timestamp_ms();
        let expires = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| now + ttl.as_millis() as u64);

        let file = format!("{}.json", hash_key(key));
        let entry = FileCacheEntry {
            hash: content_hash(&value),
            value,
            expires,
            created: now,
        };

        if let Err(error) = self.write_entry(&file, &entry).await {
            warn!("Failed to write cache entry '{}': {}", key, error);
            return;
        }

        self.index.insert(key.to_string(), IndexEntry { file, expires });
        self.persist_index().await;
        self.check_size().await;
    }

    // == Delete ==
    /// Removes one entry, returning whether it existed.
    pub async fn delete(&mut self, key: &str) -> bool {
        if self.index.get(key).is_none() {
            return false;
        }
        self.remove_key(key).await;
        self.persist_index().await;
        true
    }

    // == Clear ==
    /// Removes every entry. The manifest file stays in place, emptied.
    pub async fn clear(&mut self) {
        let keys: Vec<String> = self.index.keys().cloned().collect();
        for key in keys {
            self.remove_key(&key).await;
        }
        self.persist_index().await;
        info!("Cleared file cache at {}", self.dir.display());
    }

    // == Stats ==
    /// Returns a snapshot of the on-disk cache: entry count, total
    /// bytes, and the age range of the entry files.
    pub async fn stats(&self) -> FileCacheStats {
        match self.collect_stats().await {
            Ok(stats) => stats,
            Err(error) => {
                warn!("Failed to collect file cache stats: {}", error);
                FileCacheStats {
                    entries: self.index.len(),
                    total_size: 0,
                    oldest_entry: None,
                    newest_entry: None,
                }
            }
        }
    }

    /// Returns the number of keys in the manifest.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Size Check ==
    /// Keeps the on-disk footprint under the byte budget.
    ///
    /// Sums every entry file (the manifest does not count); while over
    /// budget, deletes the largest files first, mapping each back to its
    /// logical key through the manifest. Orphan files with no manifest
    /// row are removed the same way.
    async fn check_size(&mut self) {
        let mut files = match self.scan_files().await {
            Ok(files) => files,
            Err(error) => {
                warn!(
                    "Failed to scan cache directory {}: {}",
                    self.dir.display(),
                    error
                );
                return;
            }
        };

        let mut total: u64 = files.iter().map(|(_, size)| size).sum();
        if total <= self.max_size {
            return;
        }

        // Largest first
        files.sort_by(|a, b| b.1.cmp(&a.1));

        let mut removed = 0usize;
        for (name, size) in files {
            if total <= self.max_size {
                break;
            }
            match self.index.key_for_file(&name) {
                Some(key) => {
                    let key = key.to_string();
                    self.remove_key(&key).await;
                }
                None => {
                    // Orphan: present on disk, absent from the manifest
                    let path = self.dir.join(&name);
                    if let Err(error) = fs::remove_file(&path).await {
                        warn!(
                            "Failed to remove orphan cache file {}: {}",
                            path.display(),
                            error
                        );
                        continue;
                    }
                }
            }
            total = total.saturating_sub(size);
            removed += 1;
        }

        if removed > 0 {
            self.persist_index().await;
            info!(
                "Trimmed {} cache files to stay under {} bytes",
                removed, self.max_size
            );
        }
    }

    // == Internal Helpers ==
    /// Removes expired keys and their files, persisting the manifest if
    /// anything was swept. Returns the number of entries removed.
    async fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired = self.index.expired_keys(now);
        let count = expired.len();
        for key in expired {
            self.remove_key(&key).await;
        }
        if count > 0 {
            self.persist_index().await;
        }
        count
    }

    /// Drops one key: its manifest row and its entry file. File removal
    /// failures are logged and otherwise ignored.
    async fn remove_key(&mut self, key: &str) {
        if let Some(entry) = self.index.remove(key) {
            let path = self.dir.join(&entry.file);
            if let Err(error) = fs::remove_file(&path).await {
                if error.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove cache file {}: {}", path.display(), error);
                }
            }
        }
    }

    /// Writes the manifest, logging instead of failing.
    async fn persist_index(&self) {
        if let Err(error) = self.index.save(&self.dir).await {
            warn!("Failed to persist cache index: {}", error);
        }
    }

    async fn read_entry(&self, path: &Path) -> Option<FileCacheEntry> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!("Failed to read cache file {}: {}", path.display(), error);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!("Failed to parse cache file {}: {}", path.display(), error);
                None
            }
        }
    }

    async fn write_entry(&self, file: &str, entry: &FileCacheEntry) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entry)?;
        fs::write(self.dir.join(file), bytes).await?;
        Ok(())
    }

    /// Lists entry files and their sizes, excluding the manifest.
    async fn scan_files(&self) -> Result<Vec<(String, u64)>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == INDEX_FILE || !name.ends_with(".json") {
                continue;
            }
            let meta = entry.metadata().await?;
            if meta.is_file() {
                files.push((name, meta.len()));
            }
        }
        Ok(files)
    }

    async fn collect_stats(&self) -> Result<FileCacheStats> {
        let mut total_size = 0u64;
        let mut oldest: Option<DateTime<Utc>> = None;
        let mut newest: Option<DateTime<Utc>> = None;

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == INDEX_FILE || !name.ends_with(".json") {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            total_size += meta.len();
            if let Ok(modified) = meta.modified() {
                let modified: DateTime<Utc> = modified.into();
                oldest = Some(oldest.map_or(modified, |current| current.min(modified)));
                newest = Some(newest.map_or(modified, |current| current.max(modified)));
            }
        }

        Ok(FileCacheStats {
            entries: self.index.len(),
            total_size,
            oldest_entry: oldest,
            newest_entry: newest,
        })
    }
}
