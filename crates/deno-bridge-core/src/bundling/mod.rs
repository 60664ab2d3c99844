//! Collaborators for the bundle and serve operations
//!
//! The bridge never looks inside handlers or declarations; it only moves them
//! from the [`Bundler`] into the [`ManifestGenerator`].

pub mod manifest;

use crate::errors::BridgeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Component, Path, PathBuf};

pub use manifest::{JsonManifestGenerator, ManifestGenerator, MANIFEST_FILE};

/// A handler discovered by the bundler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub name: String,
    pub path: PathBuf,
}

/// Caller-supplied handler declaration, passed through as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Declaration(pub serde_json::Value);

impl From<serde_json::Value> for Declaration {
    fn from(value: serde_json::Value) -> Self {
        Declaration(value)
    }
}

/// What a bundler hands back
#[derive(Debug, Clone)]
pub struct BundleOutput {
    /// Where the final bundle should be written
    pub bundle_path: PathBuf,
    /// Intermediate artifact consumed by `deno bundle`
    pub pre_bundle_path: PathBuf,
    pub handlers: Vec<Handler>,
}

/// Turns source directories into a pre-bundle artifact
#[async_trait]
pub trait Bundler: Send + Sync {
    async fn bundle(&self, source_dirs: &[PathBuf], dist_dir: &Path) -> BridgeResult<BundleOutput>;
}

/// Result of a bundle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResult {
    pub bundle_path: PathBuf,
    pub manifest_path: PathBuf,
    /// Deleted once the bundle succeeds; kept on disk when it fails
    pub pre_bundle_path: PathBuf,
}

/// Path of `target` relative to `base`, walking up with `..` as needed.
///
/// Relative inputs are resolved against the current directory and `.`/`..`
/// are collapsed lexically before comparing, so mixed relative and absolute
/// inputs agree. Symlinks are not followed. Identical paths give an empty
/// path. On Windows, paths on different drives have no relative form and
/// `target` comes back absolute.
pub fn relative_path(base: &Path, target: &Path) -> io::Result<PathBuf> {
    let base = normalize(&std::path::absolute(base)?);
    let target = normalize(&std::path::absolute(target)?);

    let base_components: Vec<_> = base.components().collect();
    let target_components: Vec<_> = target.components().collect();

    let common = base_components
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &target_components[common..] {
        relative.push(component.as_os_str());
    }
    Ok(relative)
}

/// Collapse `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
