//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (yt-dlp) with configurable
//! timeouts so a hung extractor cannot block the relay forever.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::download::error::DownloadError;

/// Run an async Command with a timeout.
///
/// The child is spawned with `kill_on_drop`, so a timed-out process is killed
/// when the pending future is dropped.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, DownloadError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DownloadError::Process(format!("executable not found: {}", e)))
        }
        Ok(Err(e)) => Err(DownloadError::Process(format!("failed to run process: {}", e))),
        Err(_) => Err(DownloadError::Timeout(format!(
            "Process timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_with_timeout_collects_output() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo hello");
        let output = run_with_timeout(&mut cmd, Duration::from_secs(5)).await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_with_timeout_times_out() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("sleep 5");
        let err = run_with_timeout(&mut cmd, Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, DownloadError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_process_error() {
        let mut cmd = Command::new("definitely-not-a-real-binary-xyz");
        let err = run_with_timeout(&mut cmd, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DownloadError::Process(_)));
    }
}
