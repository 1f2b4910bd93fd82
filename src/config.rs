//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_MAX_SIZE;

/// Default root directory for the file-backed store.
pub const DEFAULT_CACHE_DIR: &str = ".cache";

/// Default background cleanup interval in seconds.
pub const DEFAULT_CLEANUP_INTERVAL: u64 = 60;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Global byte budget for the in-memory cache
    pub max_cache_size: u64,
    /// Root directory for the file-backed store
    pub cache_dir: PathBuf,
    /// Byte budget for the file-backed store
    pub file_cache_max_size: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - In-memory byte budget (default: 104857600, 100 MiB)
    /// - `CACHE_DIR` - File-backed store directory (default: `.cache`)
    /// - `FILE_CACHE_MAX_SIZE` - File-backed byte budget (default: 104857600)
    /// - `CACHE_CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            max_cache_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SIZE),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            file_cache_max_size: env::var("FILE_CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SIZE),
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CLEANUP_INTERVAL),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_SIZE,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            file_cache_max_size: DEFAULT_MAX_SIZE,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}
