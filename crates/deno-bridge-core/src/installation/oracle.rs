//! Version detection by asking a binary to report itself

use regex::Regex;
use semver::Version;
use std::ffi::OsStr;
use std::sync::OnceLock;
use tokio::process::Command;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^deno ([\d.]+)").expect("version pattern is valid"))
}

/// Extract the version from `--version` output.
///
/// Only the first line counts and it has to start with the product name.
pub fn parse_version_output(stdout: &str) -> Option<Version> {
    let first_line = stdout.lines().next()?;
    let captures = version_pattern().captures(first_line)?;
    Version::parse(captures.get(1)?.as_str()).ok()
}

/// Run `binary --version` and parse what it prints.
///
/// `binary` may be a path or a bare name looked up through `PATH`. A missing
/// binary, a crash, a non-zero exit and unrelated output all come back as
/// `None`.
pub async fn get_binary_version(binary: impl AsRef<OsStr>) -> Option<Version> {
    let binary = binary.as_ref();

    let output = match Command::new(binary).arg("--version").output().await {
        Ok(output) => output,
        Err(e) => {
            log::debug!("Could not run {:?} --version: {}", binary, e);
            return None;
        }
    };

    if !output.status.success() {
        log::debug!(
            "{:?} --version exited with code {:?}",
            binary,
            output.status.code()
        );
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = parse_version_output(&stdout);
    if version.is_none() {
        log::debug!("Unrecognized version output from {:?}: {:?}", binary, stdout);
    }
    version
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_real_output() {
        let stdout =
            "deno 1.20.3 (release, x86_64-unknown-linux-gnu)\nv8 10.0.139.6\ntypescript 4.6.2\n";
        assert_eq!(parse_version_output(stdout), Some(Version::new(1, 20, 3)));
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        assert_eq!(parse_version_output("node 1.20.3"), None);
        assert_eq!(parse_version_output(" deno 1.20.3"), None);
        assert_eq!(parse_version_output("Deno 1.20.3"), None);
    }

    #[test]
    fn test_parse_only_considers_first_line() {
        assert_eq!(parse_version_output("hello\ndeno 1.20.3"), None);
    }

    #[test]
    fn test_parse_rejects_malformed_numerals() {
        assert_eq!(parse_version_output("deno 1.20"), None);
        assert_eq!(parse_version_output("deno 1..3"), None);
        assert_eq!(parse_version_output("deno x.y.z"), None);
        assert_eq!(parse_version_output(""), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("no-such-deno");
        assert_eq!(get_binary_version(&missing).await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_outputs() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let write_script = |name: &str, body: &str| {
            let path = temp_dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        };

        let good = write_script("good", "echo 'deno 1.21.0 (release)'");
        assert_eq!(get_binary_version(&good).await, Some(Version::new(1, 21, 0)));

        let unrelated = write_script("unrelated", "echo 'hello world'");
        assert_eq!(get_binary_version(&unrelated).await, None);

        let failing = write_script("failing", "echo 'deno 1.21.0'; exit 3");
        assert_eq!(get_binary_version(&failing).await, None);
    }
}
