//! Fakes shared by the unit tests: shell-script `deno` binaries and mock
//! collaborators.

use crate::bundling::{BundleOutput, Bundler, Handler};
use crate::errors::{BridgeError, BridgeResult};
use crate::installation::traits::{Downloader, Platform};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Shell body of a fake `deno` that reports `version`, copies on `bundle`
/// and sleeps on `run`.
pub fn deno_script(version: &str) -> String {
    format!(
        r#"if [ "$1" = "--version" ]; then
  echo "deno {version} (release, test)"
  exit 0
fi
if [ "$1" = "bundle" ]; then
  echo "bundling $2" >&2
  cp "$2" "$3"
  exit $?
fi
if [ "$1" = "run" ]; then
  exec sleep 30
fi
echo "$@"
"#
    )
}

/// Write an executable `#!/bin/sh` script
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

/// Put a fake `deno` where the cache expects it
pub fn write_cached_deno(cache_dir: &Path, version: &str) -> PathBuf {
    std::fs::create_dir_all(cache_dir).unwrap();
    let name = Platform::current().binary_file_name("deno");
    write_script(cache_dir, &name, &deno_script(version))
}

/// Downloader that writes a fake `deno` reporting a fixed version
pub struct MockDownloader {
    pub body: String,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl MockDownloader {
    pub fn reporting(version: &str) -> Self {
        Self {
            body: deno_script(version),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// A download that succeeds but yields a binary printing garbage
    pub fn corrupt() -> Self {
        Self {
            body: "echo 'this is not deno'".to_string(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            body: String::new(),
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, target_dir: &Path) -> BridgeResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BridgeError::DownloadFailed {
                downloader: self.get_name().to_string(),
                reason: "mock download failure".to_string(),
            });
        }
        let name = Platform::current().binary_file_name("deno");
        Ok(write_script(target_dir, &name, &self.body))
    }

    fn get_name(&self) -> &'static str {
        "mock-downloader"
    }
}

/// Bundler that writes a small pre-bundle into the dist directory
#[derive(Default)]
pub struct MockBundler {
    pub calls: Mutex<Vec<(Vec<PathBuf>, PathBuf)>>,
    /// File name of the pre-bundle, `pre-bundle.js` when unset
    pub pre_bundle_name: Option<OsString>,
    /// Report output paths made absolute, as bundlers resolving their
    /// output directory do
    pub absolute_output: bool,
}

impl MockBundler {
    pub fn with_pre_bundle_name(name: impl Into<OsString>) -> Self {
        Self {
            pre_bundle_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_absolute_output() -> Self {
        Self {
            absolute_output: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Bundler for MockBundler {
    async fn bundle(&self, source_dirs: &[PathBuf], dist_dir: &Path) -> BridgeResult<BundleOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((source_dirs.to_vec(), dist_dir.to_path_buf()));

        std::fs::create_dir_all(dist_dir)?;
        let out_dir = if self.absolute_output {
            std::path::absolute(dist_dir)?
        } else {
            dist_dir.to_path_buf()
        };

        let pre_bundle_name = self
            .pre_bundle_name
            .clone()
            .unwrap_or_else(|| OsString::from("pre-bundle.js"));
        let pre_bundle_path = out_dir.join(pre_bundle_name);
        std::fs::write(&pre_bundle_path, "export default () => new Response('hi')")?;

        Ok(BundleOutput {
            bundle_path: out_dir.join("bundle.js"),
            pre_bundle_path,
            handlers: vec![Handler {
                name: "hello".to_string(),
                path: PathBuf::from("hello.ts"),
            }],
        })
    }
}
