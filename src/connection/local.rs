//! Local connection module
//!
//! Runs commands on the control host through `sh -c`. On a Junos device this
//! is the FreeBSD shell of the routing engine, where `cli -c` reaches the Junos
//! CLI, so the provider can run on-box without any network transport.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{CommandResult, Connection, ConnectionError, ConnectionResult, ExecuteOptions};

/// Local connection for executing commands on the current host
#[derive(Debug, Clone)]
pub struct LocalConnection {
    /// Identifier for this connection
    identifier: String,
}

impl LocalConnection {
    /// Create a new local connection
    pub fn new() -> Self {
        let identifier = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_string());

        Self { identifier }
    }

    /// Create a local connection with a custom identifier
    pub fn with_identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    fn build_command(command: &str, options: &ExecuteOptions) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);

        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }
}

impl Default for LocalConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connection for LocalConnection {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn is_alive(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        command: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        let options = options.unwrap_or_default();
        debug!(command = %command, "Executing local command");

        let mut cmd = Self::build_command(command, &options);

        let child = cmd.spawn().map_err(|e| {
            ConnectionError::ExecutionFailed(format!("Failed to spawn process: {}", e))
        })?;

        let output = if let Some(timeout_secs) = options.timeout {
            let timeout = tokio::time::Duration::from_secs(timeout_secs);
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result.map_err(|e| {
                    ConnectionError::ExecutionFailed(format!("Failed to wait for process: {}", e))
                })?,
                Err(_) => return Err(ConnectionError::Timeout(timeout_secs)),
            }
        } else {
            child.wait_with_output().await.map_err(|e| {
                ConnectionError::ExecutionFailed(format!("Failed to wait for process: {}", e))
            })?
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        trace!(exit_code = %exit_code, stdout_len = %stdout.len(), stderr_len = %stderr.len(), "Command completed");

        if output.status.success() {
            Ok(CommandResult::success(stdout, stderr))
        } else {
            Ok(CommandResult::failure(exit_code, stdout, stderr))
        }
    }

    async fn close(&self) -> ConnectionResult<()> {
        Ok(())
    }
}
