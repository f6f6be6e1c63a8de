//! Connection layer for Junos device communication.
//!
//! This module provides a unified interface for executing command strings
//! against a Junos device, whatever the transport. Sessions in
//! [`crate::junos`] are built on top of a [`Connection`] and never talk to the
//! network directly.
//!
//! # Supported Transports
//!
//! - **SSH** (via `russh`, default feature): exec channel to the device
//! - **Local**: direct execution on the control host, for on-box use in the
//!   Junos shell
//!
//! # Example
//!
//! ```rust,ignore
//! use junos_provider::connection::{Connection, ExecuteOptions, LocalConnection};
//!
//! let conn = LocalConnection::new();
//! let result = conn
//!     .execute("cli -c 'show version'", Some(ExecuteOptions::new().with_timeout(30)))
//!     .await?;
//! println!("{}", result.stdout);
//! ```

/// Local execution connection implementation.
pub mod local;

/// Pure Rust SSH implementation using russh.
#[cfg(feature = "russh")]
pub mod russh;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

pub use local::LocalConnection;
#[cfg(feature = "russh")]
pub use russh::{RusshConnection, RusshConnectionBuilder};

/// Russh-related error type - wraps russh::Error for compatibility with the Handler trait
#[cfg(feature = "russh")]
#[derive(Debug)]
pub struct RusshError(pub ::russh::Error);

#[cfg(feature = "russh")]
impl From<::russh::Error> for RusshError {
    fn from(err: ::russh::Error) -> Self {
        RusshError(err)
    }
}

#[cfg(feature = "russh")]
impl std::fmt::Display for RusshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Russh error: {}", self.0)
    }
}

#[cfg(feature = "russh")]
impl std::error::Error for RusshError {}

#[cfg(feature = "russh")]
impl From<::russh::Error> for ConnectionError {
    fn from(err: ::russh::Error) -> Self {
        ConnectionError::SshError(format!("Russh error: {}", err))
    }
}

/// Errors that can occur during connection operations.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to establish initial connection to the device.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication was rejected by the device.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Command execution failed (not to be confused with non-zero exit code).
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Connection or operation timed out.
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// Configuration is invalid or incomplete.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// SSH-specific error from the underlying implementation.
    #[error("SSH error: {0}")]
    SshError(String),

    /// I/O error during connection operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Connection was closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// The result of executing a command on a connection.
///
/// ```rust
/// use junos_provider::connection::CommandResult;
///
/// let result = CommandResult::success("commit complete".into(), String::new());
/// assert!(result.success);
/// assert_eq!(result.exit_code, 0);
///
/// let failed = CommandResult::failure(1, String::new(), "error".into());
/// assert!(!failed.success);
/// ```
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code of the command (0 typically indicates success).
    pub exit_code: i32,
    /// Content written to standard output.
    pub stdout: String,
    /// Content written to standard error.
    pub stderr: String,
    /// Convenience flag: `true` if `exit_code == 0`.
    pub success: bool,
}

impl CommandResult {
    /// Create a new successful command result
    pub fn success(stdout: String, stderr: String) -> Self {
        Self {
            exit_code: 0,
            stdout,
            stderr,
            success: true,
        }
    }

    /// Create a new failed command result
    pub fn failure(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            success: false,
        }
    }

    /// Get the combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Options for command execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Timeout in seconds (None for no timeout)
    pub timeout: Option<u64>,
}

impl ExecuteOptions {
    /// Create new execute options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The connection trait that every transport implements
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the connection identifier (user@host:port or local hostname)
    fn identifier(&self) -> &str;

    /// Check if the connection is still alive
    async fn is_alive(&self) -> bool;

    /// Execute a command on the device
    async fn execute(
        &self,
        command: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult>;

    /// Close the connection
    async fn close(&self) -> ConnectionResult<()>;
}
