//! Manifest generation

use crate::bundling::{Declaration, Handler};
use crate::errors::BridgeResult;
use serde_json::{json, Value};
use std::path::Path;

/// File name of the manifest inside the dist directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Serializes routing metadata for a finished bundle
pub trait ManifestGenerator: Send + Sync {
    /// `bundle_path` is relative to the dist directory.
    fn generate(
        &self,
        bundle_path: &Path,
        handlers: &[Handler],
        declarations: &[Declaration],
    ) -> BridgeResult<Value>;
}

/// Writes bundle, handlers and declarations side by side
#[derive(Debug, Clone, Default)]
pub struct JsonManifestGenerator;

impl ManifestGenerator for JsonManifestGenerator {
    fn generate(
        &self,
        bundle_path: &Path,
        handlers: &[Handler],
        declarations: &[Declaration],
    ) -> BridgeResult<Value> {
        Ok(json!({
            "bundle": bundle_path.to_string_lossy(),
            "handlers": serde_json::to_value(handlers)?,
            "declarations": serde_json::to_value(declarations)?,
        }))
    }
}
