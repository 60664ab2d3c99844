//! Bridge configuration
//!
//! A [`BridgeConfig`] is built once through [`BridgeConfigBuilder`] and never
//! changes afterwards. The version range is parsed at build time, so an invalid
//! range is reported before any binary is looked up.

use crate::errors::{BridgeError, BridgeResult};
use futures_util::future::BoxFuture;
use semver::VersionReq;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Range the bridge accepts when none is configured
pub const DEFAULT_VERSION_RANGE: &str = "^1.17.2";

/// Directory under the user's home holding bridge state
pub const HOME_DIR_NAME: &str = ".deno-bridge";

/// Default name of the cache directory inside [`HOME_DIR_NAME`]
pub const CACHE_DIR_NAME: &str = "deno-cli";

pub const ENV_CACHE_DIR: &str = "DENO_BRIDGE_CACHE_DIR";
pub const ENV_USE_GLOBAL: &str = "DENO_BRIDGE_USE_GLOBAL";
pub const ENV_VERSION_RANGE: &str = "DENO_BRIDGE_VERSION_RANGE";

/// Callback fired around a download. Takes no arguments and may be async.
pub type LifecycleHook = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Resolve `name` inside the bridge's home directory
pub fn path_in_home(name: &str) -> BridgeResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(HOME_DIR_NAME).join(name))
        .ok_or(BridgeError::HomeDirectoryUnavailable)
}

#[derive(Clone)]
pub struct BridgeConfig {
    pub cache_dir: PathBuf,
    pub use_global: bool,
    pub version_range: VersionReq,
    pub on_before_download: Option<LifecycleHook>,
    pub on_after_download: Option<LifecycleHook>,
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("cache_dir", &self.cache_dir)
            .field("use_global", &self.use_global)
            .field("version_range", &self.version_range.to_string())
            .field("on_before_download", &self.on_before_download.is_some())
            .field("on_after_download", &self.on_after_download.is_some())
            .finish()
    }
}

/// Builder for creating bridge configurations
#[derive(Clone, Default)]
pub struct BridgeConfigBuilder {
    cache_dir: Option<PathBuf>,
    use_global: Option<bool>,
    version_range: Option<String>,
    on_before_download: Option<LifecycleHook>,
    on_after_download: Option<LifecycleHook>,
}

impl BridgeConfigBuilder {
    /// Create a new builder; unset fields fall back to defaults in `build`
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the cache directory
    pub fn cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Allow or forbid using a `deno` found on `PATH`
    pub fn use_global(mut self, use_global: bool) -> Self {
        self.use_global = Some(use_global);
        self
    }

    /// Set the semantic version range binaries must satisfy
    pub fn version_range(mut self, range: impl Into<String>) -> Self {
        self.version_range = Some(range.into());
        self
    }

    /// Hook fired before a download starts
    pub fn on_before_download<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_before_download = Some(boxed_hook(hook));
        self
    }

    /// Hook fired after a download has been verified and recorded
    pub fn on_after_download<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_after_download = Some(boxed_hook(hook));
        self
    }

    /// Apply `DENO_BRIDGE_*` environment variables on top of what is set.
    pub fn with_env_overrides(mut self) -> BridgeResult<Self> {
        if let Ok(cache_dir) = std::env::var(ENV_CACHE_DIR) {
            if !cache_dir.is_empty() {
                self.cache_dir = Some(PathBuf::from(cache_dir));
            }
        }

        if let Ok(raw) = std::env::var(ENV_USE_GLOBAL) {
            self.use_global = Some(parse_bool(ENV_USE_GLOBAL, &raw)?);
        }

        if let Ok(range) = std::env::var(ENV_VERSION_RANGE) {
            if !range.is_empty() {
                self.version_range = Some(range);
            }
        }

        Ok(self)
    }

    pub fn build(self) -> BridgeResult<BridgeConfig> {
        let cache_dir = match self.cache_dir {
            Some(dir) => dir,
            None => path_in_home(CACHE_DIR_NAME)?,
        };

        let raw_range = self
            .version_range
            .unwrap_or_else(|| DEFAULT_VERSION_RANGE.to_string());
        let version_range =
            VersionReq::parse(&raw_range).map_err(|e| BridgeError::InvalidConfiguration {
                message: format!("invalid version range '{}': {}", raw_range, e),
            })?;

        Ok(BridgeConfig {
            cache_dir,
            use_global: self.use_global.unwrap_or(true),
            version_range,
            on_before_download: self.on_before_download,
            on_after_download: self.on_after_download,
        })
    }
}

fn boxed_hook<F, Fut>(hook: F) -> LifecycleHook
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, ()> { Box::pin(hook()) })
}

fn parse_bool(name: &str, raw: &str) -> BridgeResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(BridgeError::InvalidConfiguration {
            message: format!("{} must be a boolean, got '{}'", name, other),
        }),
    }
}
