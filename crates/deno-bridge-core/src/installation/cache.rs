//! Cached binary and version marker storage
//!
//! The cache directory holds at most one binary and a `version.txt` marker.
//! The marker is written only after a download has been verified, and is then
//! trusted as a stand-in for the binary's own version. Nothing re-checks the
//! binary on read, so a binary swapped out by another process goes unnoticed.
//! There is no locking: concurrent writers race and the last one wins.

use crate::errors::BridgeError;
use crate::installation::traits::Platform;
use crate::DENO_BINARY_NAME;
use semver::Version;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the version marker inside the cache directory
pub const VERSION_FILE: &str = "version.txt";

/// Manages the cache directory and its version marker
#[derive(Debug, Clone)]
pub struct VersionCache {
    cache_dir: PathBuf,
}

impl VersionCache {
    /// Create a new version cache
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the version marker
    pub fn marker_path(&self) -> PathBuf {
        self.cache_dir.join(VERSION_FILE)
    }

    /// Path where the cached binary is expected to live
    pub fn binary_path(&self) -> PathBuf {
        self.cache_dir
            .join(Platform::current().binary_file_name(DENO_BINARY_NAME))
    }

    /// Read the version marker.
    ///
    /// Any failure (missing file, permissions, empty or garbage contents)
    /// reads as `None`.
    pub async fn read(&self) -> Option<Version> {
        let contents = match fs::read_to_string(self.marker_path()).await {
            Ok(contents) => contents,
            Err(e) => {
                log::debug!("No usable version marker in {}: {}", self.cache_dir.display(), e);
                return None;
            }
        };

        match Version::parse(contents.trim()) {
            Ok(version) => Some(version),
            Err(e) => {
                log::debug!("Ignoring corrupt version marker {:?}: {}", contents, e);
                None
            }
        }
    }

    /// Overwrite the version marker with the literal version string
    pub async fn write(&self, version: &Version) -> Result<(), BridgeError> {
        fs::write(self.marker_path(), version.to_string()).await?;
        Ok(())
    }

    /// Ensure the cache directory exists
    pub async fn ensure_cache_dir(&self) -> Result<(), BridgeError> {
        fs::create_dir_all(&self.cache_dir).await?;
        Ok(())
    }

    /// Clear the entire cache
    pub async fn clear(&self) -> Result<(), BridgeError> {
        if fs::try_exists(&self.cache_dir).await? {
            fs::remove_dir_all(&self.cache_dir).await?;
        }
        Ok(())
    }

    /// Get cache statistics
    pub async fn stats(&self) -> Result<CacheStats, BridgeError> {
        let mut stats = CacheStats::default();

        if !fs::try_exists(&self.cache_dir).await? {
            return Ok(stats);
        }

        let mut entries = fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                stats.file_count += 1;
                stats.total_size += metadata.len();
            }
        }

        Ok(stats)
    }
}

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of files in the cache directory
    pub file_count: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
}

impl CacheStats {
    /// Get total size in human-readable format
    pub fn total_size_human(&self) -> String {
        let sizes = ["B", "KB", "MB", "GB"];
        let mut size = self.total_size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < sizes.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        format!("{:.2} {}", size, sizes[unit_index])
    }
}
