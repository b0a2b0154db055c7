//! Local Host
//!
//! Real side effects for the tool executor: shell subprocesses via tokio
//! and file access on the local filesystem. Effects are irreversible; no
//! rollback is attempted.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;

use crate::types::{ExecOutput, Host};

/// Host implementation acting on the machine the agent runs on.
#[derive(Debug, Default, Clone)]
pub struct LocalHost;

#[async_trait]
impl Host for LocalHost {
    /// Spawn `sh -c <command>` and wait for completion. Stdout and stderr
    /// are captured and combined; the exit code is reported but does not
    /// make the call fail.
    async fn exec(&self, command: &str) -> Result<ExecOutput> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .with_context(|| format!("failed to spawn: {}", command))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ExecOutput {
            output: combined,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create directory: {}", parent.display()))?;
            }
        }
        fs::write(path, content)
            .await
            .with_context(|| format!("failed to write file: {}", path))?;
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read file: {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("adjutant-test-{}", uuid::Uuid::new_v4()))
            .join(name)
            .to_string_lossy()
            .to_string()
    }

    #[tokio::test]
    async fn test_exec_captures_stdout() {
        let host = LocalHost;
        let result = host.exec("echo hello").await.unwrap();
        assert_eq!(result.output.trim(), "hello");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_exec_nonzero_exit_still_returns_output() {
        let host = LocalHost;
        let result = host.exec("ls /definitely-not-a-dir").await.unwrap();
        assert_ne!(result.exit_code, 0);
        assert!(!result.output.is_empty());
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs_and_reads_back() {
        let host = LocalHost;
        let path = scratch_path("nested/app.py");

        host.write_file(&path, "print('hi')").await.unwrap();
        let contents = host.read_file(&path).await.unwrap();
        assert_eq!(contents, "print('hi')");
    }

    #[tokio::test]
    async fn test_read_missing_file_errors() {
        let host = LocalHost;
        let err = host.read_file(&scratch_path("missing.txt")).await;
        assert!(err.is_err());
    }
}
