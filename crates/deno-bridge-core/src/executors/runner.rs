//! Subprocess execution of the resolved binary

use crate::errors::{BridgeError, BridgeResult};
use crate::installation::locator::BinaryLocator;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;

/// Runs the binary the locator resolves, once per call
pub struct ExecutionRunner {
    locator: Arc<BinaryLocator>,
}

impl ExecutionRunner {
    pub fn new(locator: Arc<BinaryLocator>) -> Self {
        Self { locator }
    }

    /// Run to completion. A spawn failure or non-zero exit is an error.
    pub async fn run<I, S>(&self, args: I) -> BridgeResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = collect_args(args);
        let binary = self.locator.get_binary_path().await?;
        let mut handle = spawn(&binary, &args)?;
        let status = handle.wait().await?;

        if !status.success() {
            return Err(BridgeError::ProcessFailed {
                binary,
                code: status.code(),
                args,
            });
        }
        Ok(())
    }

    /// Start the binary and return without waiting for it.
    pub async fn run_detached<I, S>(&self, args: I) -> BridgeResult<ProcessHandle>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = collect_args(args);
        let binary = self.locator.get_binary_path().await?;
        spawn(&binary, &args)
    }
}

fn collect_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    args.into_iter().map(|arg| arg.as_ref().to_os_string()).collect()
}

/// Spawn `binary` with `args`, forwarding its stderr to our stdout.
pub fn spawn(binary: &Path, args: &[OsString]) -> BridgeResult<ProcessHandle> {
    spawn_forwarding_to(binary, args, tokio::io::stdout())
}

/// Spawn `binary` with `args`, copying its stderr into `sink`.
///
/// Arguments reach the process byte for byte; paths that are not valid
/// UTF-8 are passed through unchanged.
pub fn spawn_forwarding_to<W>(
    binary: &Path,
    args: &[OsString],
    sink: W,
) -> BridgeResult<ProcessHandle>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    log::debug!("Spawning {} {:?}", binary.display(), args);

    let mut child = Command::new(binary)
        .args(args)
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BridgeError::SpawnFailed {
            binary: binary.to_path_buf(),
            message: e.to_string(),
        })?;

    let forwarder = child.stderr.take().map(|stderr| forward_stderr(stderr, sink));

    Ok(ProcessHandle {
        binary: binary.to_path_buf(),
        args: args.to_vec(),
        child,
        forwarder,
    })
}

fn forward_stderr<W>(mut stderr: ChildStderr, mut sink: W) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = tokio::io::copy(&mut stderr, &mut sink).await {
            log::debug!("Stopped forwarding subprocess stderr: {}", e);
        }
        let _ = sink.flush().await;
    })
}

/// A running subprocess. The owner decides when it ends.
#[derive(Debug)]
pub struct ProcessHandle {
    binary: PathBuf,
    args: Vec<OsString>,
    child: Child,
    forwarder: Option<JoinHandle<()>>,
}

impl ProcessHandle {
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Arguments the process was started with
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// OS process id, `None` once the process has been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Non-blocking exit check
    pub fn try_wait(&mut self) -> BridgeResult<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Wait for exit and for all forwarded stderr to be flushed
    pub async fn wait(&mut self) -> BridgeResult<ExitStatus> {
        let status = self.child.wait().await?;
        if let Some(forwarder) = self.forwarder.take() {
            let _ = forwarder.await;
        }
        Ok(status)
    }

    /// Kill the process and reap it.
    ///
    /// Grandchildren may still hold stderr open, so forwarding is dropped
    /// rather than drained.
    pub async fn kill(&mut self) -> BridgeResult<()> {
        self.child.kill().await?;
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_utils::write_script;
    use std::os::unix::ffi::OsStrExt;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_spawn_and_wait_success() {
        let temp_dir = tempdir().unwrap();
        let script = write_script(temp_dir.path(), "ok", "echo 'to stderr' >&2\nexit 0");

        let mut handle = spawn(&script, &[OsString::from("a")]).unwrap();
        assert_eq!(handle.args(), [OsString::from("a")]);
        assert_eq!(handle.binary(), script.as_path());

        let status = handle.wait().await.unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_stderr_is_forwarded_to_sink() {
        let temp_dir = tempdir().unwrap();
        let script = write_script(
            temp_dir.path(),
            "chatty",
            "echo 'progress 1/2' >&2\necho 'on stdout'\necho 'progress 2/2' >&2\nexit 0",
        );
        let (sink, mut captured) = tokio::io::duplex(64 * 1024);

        let mut handle = spawn_forwarding_to(&script, &[], sink).unwrap();
        assert!(handle.wait().await.unwrap().success());

        // wait() drained the forwarder, which dropped its end of the pipe.
        let mut forwarded = String::new();
        captured.read_to_string(&mut forwarded).await.unwrap();
        assert_eq!(forwarded, "progress 1/2\nprogress 2/2\n");
    }

    #[tokio::test]
    async fn test_non_utf8_args_pass_through() {
        let temp_dir = tempdir().unwrap();
        let script = write_script(temp_dir.path(), "touch-arg", "touch \"$1\"");
        let target = temp_dir.path().join(OsStr::from_bytes(b"out-\xff.js"));

        let mut handle = spawn(&script, &[target.clone().into_os_string()]).unwrap();
        assert!(handle.wait().await.unwrap().success());

        assert!(target.is_file());
        assert_eq!(handle.args()[0].as_bytes(), target.as_os_str().as_bytes());
    }

    #[tokio::test]
    async fn test_spawn_nonzero_exit_status() {
        let temp_dir = tempdir().unwrap();
        let script = write_script(temp_dir.path(), "fail", "exit 4");

        let mut handle = spawn(&script, &[]).unwrap();
        let status = handle.wait().await.unwrap();
        assert_eq!(status.code(), Some(4));
    }

    #[tokio::test]
    async fn test_spawn_missing_binary() {
        let temp_dir = tempdir().unwrap();
        let result = spawn(&temp_dir.path().join("missing"), &[]);
        assert!(matches!(result, Err(BridgeError::SpawnFailed { .. })));
    }

    #[tokio::test]
    async fn test_kill_long_running() {
        let temp_dir = tempdir().unwrap();
        let script = write_script(temp_dir.path(), "sleepy", "exec sleep 30");

        let mut handle = spawn(&script, &[]).unwrap();
        assert!(handle.id().is_some());
        assert!(handle.try_wait().unwrap().is_none());

        handle.kill().await.unwrap();
        assert!(handle.try_wait().unwrap().is_some());
    }
}
