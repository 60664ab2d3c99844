//! Core traits and abstractions for binary acquisition

use crate::errors::BridgeResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Fetches a runtime binary for the current platform
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download the binary into `target_dir` and return its path.
    ///
    /// The cached tier expects the binary at `target_dir/deno<ext>`, so
    /// implementations should place it there.
    async fn download(&self, target_dir: &Path) -> BridgeResult<PathBuf>;

    /// Get a human-readable name for this downloader
    fn get_name(&self) -> &'static str;
}

/// Platform detection utilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Executable suffix for this platform
    pub fn binary_extension(&self) -> &'static str {
        match self.os.as_str() {
            "windows" => ".exe",
            _ => "",
        }
    }

    /// File name of an executable called `name` on this platform
    pub fn binary_file_name(&self, name: &str) -> String {
        format!("{}{}", name, self.binary_extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detection() {
        let platform = Platform::current();
        assert!(!platform.os.is_empty());
        assert!(!platform.arch.is_empty());
    }

    #[test]
    fn test_binary_file_name() {
        let windows = Platform {
            os: "windows".to_string(),
            arch: "x86_64".to_string(),
        };
        assert_eq!(windows.binary_file_name("deno"), "deno.exe");

        let linux = Platform {
            os: "linux".to_string(),
            arch: "aarch64".to_string(),
        };
        assert_eq!(linux.binary_file_name("deno"), "deno");
    }
}
