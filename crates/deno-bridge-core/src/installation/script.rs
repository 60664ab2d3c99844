//! Downloader that delegates to the official installer script

use crate::errors::{BridgeError, BridgeResult};
use crate::installation::traits::{Downloader, Platform};
use crate::DENO_BINARY_NAME;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Installer script fetched when nothing else is configured
pub const DEFAULT_INSTALL_SCRIPT_URL: &str = "https://deno.land/install.sh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installer {
    /// Fetch the script and feed it to `sh -s`
    ScriptUrl(String),
    /// Run a shell command through `sh -c`
    Command(String),
}

/// Runs the Deno installer with `DENO_INSTALL` pointing at the target
/// directory, then moves `bin/deno` up to where the cache expects it.
#[derive(Debug, Clone)]
pub struct InstallScriptDownloader {
    installer: Installer,
}

impl InstallScriptDownloader {
    pub fn new() -> Self {
        Self {
            installer: Installer::ScriptUrl(DEFAULT_INSTALL_SCRIPT_URL.to_string()),
        }
    }

    /// Fetch the installer script from another URL
    pub fn with_script_url(mut self, url: impl Into<String>) -> Self {
        self.installer = Installer::ScriptUrl(url.into());
        self
    }

    /// Use a shell command as the installer instead of fetching a script
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.installer = Installer::Command(command.into());
        self
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    fn failure(&self, reason: String) -> BridgeError {
        BridgeError::DownloadFailed {
            downloader: self.get_name().to_string(),
            reason,
        }
    }

    async fn fetch_script(&self, url: &str) -> BridgeResult<String> {
        log::info!("Fetching installer script from {}", url);
        let response = reqwest::get(url)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| self.failure(format!("could not fetch installer script: {}", e)))?;

        response
            .text()
            .await
            .map_err(|e| self.failure(format!("could not read installer script: {}", e)))
    }

    /// Run `command` with `DENO_INSTALL` set, writing `script` to its stdin
    async fn run_installer(
        &self,
        mut command: Command,
        script: Option<&str>,
        target_dir: &Path,
    ) -> BridgeResult<Output> {
        let stdin = if script.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut child = command
            .env("DENO_INSTALL", target_dir)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(format!("could not start installer: {}", e)))?;

        if let (Some(script), Some(mut stdin)) = (script, child.stdin.take()) {
            stdin.write_all(script.as_bytes()).await?;
        }

        Ok(child.wait_with_output().await?)
    }

    /// Run an installer script already in hand, then place the binary
    async fn install_from_script(&self, script: &str, target_dir: &Path) -> BridgeResult<PathBuf> {
        let mut command = Command::new("sh");
        command.arg("-s");
        let output = self.run_installer(command, Some(script), target_dir).await?;
        self.finish_install(output, target_dir).await
    }

    async fn finish_install(&self, output: Output, target_dir: &Path) -> BridgeResult<PathBuf> {
        let binary_name = Platform::current().binary_file_name(DENO_BINARY_NAME);

        let stdout_str = String::from_utf8_lossy(&output.stdout);
        let stderr_str = String::from_utf8_lossy(&output.stderr);
        log::debug!("installer stdout: {}", stdout_str);
        log::debug!("installer stderr: {}", stderr_str);

        if !output.status.success() {
            return Err(self.failure(format!(
                "installer exited with code {:?}: {}",
                output.status.code(),
                stderr_str.trim()
            )));
        }

        let installed = target_dir.join("bin").join(&binary_name);
        let final_path = target_dir.join(&binary_name);

        if fs::try_exists(&installed).await? {
            fs::rename(&installed, &final_path).await?;
            let _ = fs::remove_dir(target_dir.join("bin")).await;
        } else if !fs::try_exists(&final_path).await? {
            return Err(self.failure(format!(
                "{} not found after install; expected {}",
                binary_name,
                installed.display()
            )));
        }

        self.make_executable(&final_path).await?;
        Ok(final_path)
    }

    /// Make the binary executable (Unix only)
    async fn make_executable(&self, binary_path: &Path) -> BridgeResult<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = fs::metadata(binary_path).await?;
            let mut permissions = metadata.permissions();
            permissions.set_mode(0o755);
            fs::set_permissions(binary_path, permissions).await?;
        }
        #[cfg(not(unix))]
        let _ = binary_path;
        Ok(())
    }
}

impl Default for InstallScriptDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for InstallScriptDownloader {
    async fn download(&self, target_dir: &Path) -> BridgeResult<PathBuf> {
        log::info!("Installing {} into {}", DENO_BINARY_NAME, target_dir.display());

        match &self.installer {
            Installer::ScriptUrl(url) => {
                let script = self.fetch_script(url).await?;
                self.install_from_script(&script, target_dir).await
            }
            Installer::Command(shell_command) => {
                log::debug!("Installer command: {}", shell_command);
                let mut command = Command::new("sh");
                command.arg("-c").arg(shell_command);
                let output = self.run_installer(command, None, target_dir).await?;
                self.finish_install(output, target_dir).await
            }
        }
    }

    fn get_name(&self) -> &'static str {
        "install-script"
    }
}
