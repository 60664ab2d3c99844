//! The bridge: bundle, serve and raw runs on top of a resolved binary

use crate::bundling::{
    relative_path, BundleResult, Bundler, Declaration, JsonManifestGenerator, ManifestGenerator,
    MANIFEST_FILE,
};
use crate::config::BridgeConfig;
use crate::errors::BridgeResult;
use crate::executors::{ExecutionRunner, ProcessHandle};
use crate::installation::{BinaryLocator, Downloader, VersionCache};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

pub struct DenoBridge {
    config: BridgeConfig,
    locator: Arc<BinaryLocator>,
    runner: ExecutionRunner,
    bundler: Arc<dyn Bundler>,
    manifest_generator: Arc<dyn ManifestGenerator>,
}

impl DenoBridge {
    pub fn new(
        config: BridgeConfig,
        downloader: Arc<dyn Downloader>,
        bundler: Arc<dyn Bundler>,
    ) -> Self {
        let locator = Arc::new(BinaryLocator::new(&config, downloader));
        Self {
            runner: ExecutionRunner::new(locator.clone()),
            locator,
            config,
            bundler,
            manifest_generator: Arc::new(JsonManifestGenerator),
        }
    }

    /// Replace the default JSON manifest generator
    pub fn with_manifest_generator(mut self, generator: Arc<dyn ManifestGenerator>) -> Self {
        self.manifest_generator = generator;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn cache(&self) -> &VersionCache {
        self.locator.cache()
    }

    /// Resolve the binary to use, downloading it if nothing usable exists
    pub async fn get_binary_path(&self) -> BridgeResult<PathBuf> {
        self.locator.get_binary_path().await
    }

    /// Run the binary with `args` and wait for it to exit successfully
    pub async fn run<I, S>(&self, args: I) -> BridgeResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.runner.run(args).await
    }

    /// Run the binary with `args` and hand back the live process
    pub async fn run_detached<I, S>(&self, args: I) -> BridgeResult<ProcessHandle>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.runner.run_detached(args).await
    }

    /// Bundle `source_dirs` into `dist_dir` and write `manifest.json` next to
    /// the bundle.
    ///
    /// The pre-bundle artifact is removed only after `deno bundle` succeeds;
    /// on failure it stays on disk for inspection.
    pub async fn bundle(
        &self,
        source_dirs: &[PathBuf],
        dist_dir: &Path,
        declarations: &[Declaration],
    ) -> BridgeResult<BundleResult> {
        let output = self.bundler.bundle(source_dirs, dist_dir).await?;

        let relative_bundle_path = relative_path(dist_dir, &output.bundle_path)?;
        let manifest = self.manifest_generator.generate(
            &relative_bundle_path,
            &output.handlers,
            declarations,
        )?;
        let manifest_path = dist_dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, serde_json::to_string(&manifest)?).await?;
        log::debug!("Wrote manifest to {}", manifest_path.display());

        let args = [
            OsStr::new("bundle"),
            output.pre_bundle_path.as_os_str(),
            output.bundle_path.as_os_str(),
        ];
        self.run(args).await?;

        fs::remove_file(&output.pre_bundle_path).await?;

        log::info!(
            "Bundled {} handler(s) into {}",
            output.handlers.len(),
            output.bundle_path.display()
        );
        Ok(BundleResult {
            bundle_path: output.bundle_path,
            manifest_path,
            pre_bundle_path: output.pre_bundle_path,
        })
    }

    /// Bundle into a fresh temporary directory and start serving it on
    /// `port`. Returns as soon as the server process is spawned.
    ///
    /// Declarations are not needed to serve and are ignored.
    pub async fn serve(
        &self,
        port: u16,
        source_dirs: &[PathBuf],
        _declarations: &[Declaration],
    ) -> BridgeResult<ProcessHandle> {
        // The server reads from this directory after we return, so it is
        // not removed on drop.
        let dist_dir = tempfile::Builder::new()
            .prefix("deno-bridge-serve-")
            .tempdir()?
            .keep();

        let output = self.bundler.bundle(source_dirs, &dist_dir).await?;

        let port = port.to_string();
        let args = [
            OsStr::new("run"),
            OsStr::new("-A"),
            OsStr::new("--unstable"),
            output.pre_bundle_path.as_os_str(),
            OsStr::new(&port),
        ];

        log::info!("Serving {} on port {}", output.pre_bundle_path.display(), port);
        self.run_detached(args).await
    }
}
