//! Bridge to the Deno binary used to bundle and serve edge handlers.
//!
//! The crate decides, on every call, which `deno` to run and then runs it:
//!
//! - **Version detection**: `deno --version` parsed into a semantic version
//! - **Binary resolution**: global install, then cache, then download, each
//!   checked against a required version range
//! - **Cache**: a cache directory holding the binary and a `version.txt`
//!   marker written only after a verified download
//! - **Execution**: one-shot runs that wait, and detached runs for serving
//!
//! Bundling, manifest generation and downloading are collaborators supplied
//! through the [`Bundler`], [`ManifestGenerator`] and [`Downloader`] traits.

pub mod bridge;
pub mod bundling;
pub mod config;
pub mod errors;
pub mod executors;
pub mod installation;

/// Executable name of the runtime, before any platform suffix
pub const DENO_BINARY_NAME: &str = "deno";

pub use bridge::DenoBridge;
pub use bundling::{
    BundleOutput, BundleResult, Bundler, Declaration, Handler, JsonManifestGenerator,
    ManifestGenerator,
};
pub use config::{BridgeConfig, BridgeConfigBuilder, LifecycleHook};
pub use errors::{BridgeError, BridgeResult};
pub use executors::ProcessHandle;
pub use installation::{Downloader, InstallScriptDownloader, VersionCache};
pub use semver::{Version, VersionReq};

#[cfg(test)]
pub mod test_utils;
