//! Binary locator: global install, then cache, then download

use crate::config::{BridgeConfig, LifecycleHook};
use crate::errors::{BridgeError, BridgeResult};
use crate::installation::cache::VersionCache;
use crate::installation::oracle::get_binary_version;
use crate::installation::traits::Downloader;
use crate::DENO_BINARY_NAME;
use semver::{Version, VersionReq};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use which::which;

/// Resolves the binary to run, downloading it on a full miss
pub struct BinaryLocator {
    cache: VersionCache,
    use_global: bool,
    global_binary: PathBuf,
    version_range: VersionReq,
    on_before_download: Option<LifecycleHook>,
    on_after_download: Option<LifecycleHook>,
    downloader: Arc<dyn Downloader>,
}

impl BinaryLocator {
    pub fn new(config: &BridgeConfig, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            cache: VersionCache::new(config.cache_dir.clone()),
            use_global: config.use_global,
            global_binary: PathBuf::from(DENO_BINARY_NAME),
            version_range: config.version_range.clone(),
            on_before_download: config.on_before_download.clone(),
            on_after_download: config.on_after_download.clone(),
            downloader,
        }
    }

    /// Check `binary` instead of the bare `deno` name for the global tier.
    ///
    /// A bare name is looked up on `PATH` when spawned; a path is used as is.
    pub fn with_global_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.global_binary = binary.into();
        self
    }

    /// Get the cache instance
    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    /// Program the global tier checks
    pub fn global_binary(&self) -> &Path {
        &self.global_binary
    }

    pub fn version_range(&self) -> &VersionReq {
        &self.version_range
    }

    /// Resolve a usable binary. The first tier that satisfies the version
    /// range wins; the download tier always produces a path or an error.
    pub async fn get_binary_path(&self) -> BridgeResult<PathBuf> {
        if let Some(global_path) = self.get_global_binary().await {
            return Ok(global_path);
        }

        if let Some(cached_path) = self.get_cached_binary().await {
            return Ok(cached_path);
        }

        self.get_remote_binary().await
    }

    /// The global `deno`, if allowed and compatible.
    ///
    /// "Not installed" and "installed but too old" are treated the same.
    async fn get_global_binary(&self) -> Option<PathBuf> {
        if !self.use_global {
            return None;
        }

        let version = get_binary_version(&self.global_binary).await?;
        if !self.version_range.matches(&version) {
            log::info!(
                "Global {} {} does not satisfy {}",
                self.global_binary.display(),
                version,
                self.version_range
            );
            return None;
        }

        match which(&self.global_binary) {
            Ok(location) => log::debug!("Using global binary at {}", location.display()),
            Err(_) => log::debug!("Using global binary {}", self.global_binary.display()),
        }
        Some(self.global_binary.clone())
    }

    /// Cached binary, trusted on the strength of its version marker alone.
    async fn get_cached_binary(&self) -> Option<PathBuf> {
        let cached_version = self.cache.read().await?;

        if !self.version_range.matches(&cached_version) {
            log::info!(
                "Cached version {} does not satisfy {}",
                cached_version,
                self.version_range
            );
            return None;
        }

        let binary_path = self.cache.binary_path();
        log::debug!("Found cached binary: {}", binary_path.display());
        Some(binary_path)
    }

    async fn get_remote_binary(&self) -> BridgeResult<PathBuf> {
        if let Some(hook) = &self.on_before_download {
            hook().await;
        }

        self.cache.ensure_cache_dir().await?;

        log::info!(
            "Downloading {} into {} using {}",
            DENO_BINARY_NAME,
            self.cache.cache_dir().display(),
            self.downloader.get_name()
        );
        let binary_path = self.downloader.download(self.cache.cache_dir()).await?;

        let version: Version = get_binary_version(&binary_path)
            .await
            .ok_or_else(|| BridgeError::UnreadableDownload {
                path: binary_path.clone(),
            })?;

        if !self.version_range.matches(&version) {
            log::warn!(
                "Downloaded {} {} does not satisfy {}; it will be replaced on the next resolution",
                DENO_BINARY_NAME,
                version,
                self.version_range
            );
        }

        self.cache.write(&version).await?;

        if let Some(hook) = &self.on_after_download {
            hook().await;
        }

        log::info!(
            "Successfully installed {} {} at {}",
            DENO_BINARY_NAME,
            version,
            binary_path.display()
        );
        Ok(binary_path)
    }
}
