//! Cache Index Module
//!
//! On-disk manifest for the file-backed cache: one JSON object mapping
//! logical keys to their entry file and expiry deadline. The manifest is
//! held in memory and persisted with a write-and-rename so a crash never
//! leaves a half-written file behind.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Manifest filename inside the cache directory.
pub const INDEX_FILE: &str = "index.json";

// == Index Entry ==
/// One manifest row: where a key's payload lives and when it expires.
///
/// The deadline is duplicated from the entry file so expiry checks never
/// have to open the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Entry filename inside the cache directory
    pub file: String,
    /// Absolute epoch-ms expiry deadline; `None` means never expires
    pub expires: Option<u64>,
}

impl IndexEntry {
    /// Checks expiration against a caller-supplied timestamp.
    ///
    /// An entry with no deadline never expires; otherwise it expires
    /// once `now` has moved strictly past the deadline.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires {
            Some(expires) => now > expires,
            None => false,
        }
    }
}

// == Cache Index ==
/// In-memory manifest, serialized transparently as one JSON object.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheIndex {
    entries: HashMap<String, IndexEntry>,
}

impl CacheIndex {
    // == Load ==
    /// Loads the manifest from a cache directory.
    ///
    /// A missing manifest yields an empty index. An unreadable or
    /// corrupt one is logged and also yields an empty index; its entry
    /// files linger as orphans until the size check collects them.
    pub async fn load(dir: &Path) -> Self {
        let path = dir.join(INDEX_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(index) => index,
                Err(error) => {
                    warn!(
                        "Corrupt cache index at {}, starting empty: {}",
                        path.display(),
                        error
                    );
                    Self::default()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(error) => {
                warn!("Failed to read cache index at {}: {}", path.display(), error);
                Self::default()
            }
        }
    }

    // == Save ==
    /// Persists the manifest atomically: written to a sibling temp file,
    /// then renamed over the old manifest, so readers never observe a
    /// partial write.
    pub async fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(INDEX_FILE);
        let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
        let bytes = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    // == Row Operations ==
    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, entry: IndexEntry) {
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, key: &str) -> Option<IndexEntry> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Lookups ==
    /// Collects every key whose deadline has passed.
    pub fn expired_keys(&self, now: u64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Maps an entry filename back to its logical key.
    pub fn key_for_file(&self, file: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.file == file)
            .map(|(key, _)| key.as_str())
    }
}
