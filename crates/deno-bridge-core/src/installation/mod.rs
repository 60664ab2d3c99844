//! Acquisition of the Deno binary
//!
//! Resolution goes through three tiers, first match wins:
//! - a global `deno` on `PATH` (optional)
//! - the cache directory, trusted through its version marker
//! - a fresh download, verified once before the marker is written

pub mod cache;
pub mod locator;
pub mod oracle;
pub mod script;
pub mod traits;


pub use cache::{CacheStats, VersionCache, VERSION_FILE};
pub use locator::BinaryLocator;
pub use oracle::{get_binary_version, parse_version_output};
pub use script::{InstallScriptDownloader, Installer, DEFAULT_INSTALL_SCRIPT_URL};
pub use traits::{Downloader, Platform};
