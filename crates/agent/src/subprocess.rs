//! Shared subprocess execution for the probe tool bindings.
//!
//! Provides [`run_tool`], the common spawn + capture + timeout logic used by
//! all four tool bindings (smartctl, hddtemp, mdadm, lsblk). A non-zero exit
//! code is not an error here (smartctl in particular reports device state
//! through exit-status bits), so callers inspect [`ToolOutput::exit_code`]
//! themselves.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Maximum stdout or stderr size captured per stream (1 MiB). The probed
/// tools print at most a few KiB; the cap bounds memory if one misbehaves.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Captured output of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
}

impl ToolOutput {
    /// Whether the tool exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors that prevent a tool invocation from completing at all.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The tool could not be spawned (missing binary, permissions).
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        source: std::io::Error,
    },

    /// The tool did not finish within the timeout and was killed.
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: &'static str, seconds: u64 },
}

/// Run `tool` with `args`, capture its output, and enforce `timeout`.
///
/// The child is killed if the timeout fires (`kill_on_drop`).
pub async fn run_tool(
    tool: &'static str,
    args: &[&str],
    timeout: Duration,
) -> Result<ToolOutput, ToolError> {
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn { tool, source })?;

    // Read stdout/stderr in spawned tasks so `child.wait()` (which borrows
    // `&mut child`) can run concurrently without deadlocking on full pipes.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();
    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_bytes = stderr_task.await.unwrap_or_default();
            Ok(ToolOutput {
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                exit_code: status.code().unwrap_or(-1),
            })
        }
        Ok(Err(source)) => Err(ToolError::Spawn { tool, source }),
        Err(_elapsed) => {
            // `child` is dropped here, which kills the process.
            Err(ToolError::Timeout {
                tool,
                seconds: timeout.as_secs(),
            })
        }
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let out = run_tool("echo", &["hello"], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert!(out.success());
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let err = run_tool(
            "definitely-not-a-real-tool",
            &[],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let err = run_tool("sleep", &["30"], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { seconds: 0, .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_an_error() {
        let out = run_tool("false", &[], Duration::from_secs(5)).await.unwrap();
        assert!(!out.success());
    }
}
