//! Error types for junos-provider.
//!
//! Library code returns [`Error`] from every fallible resource operation. The
//! lifecycle layer turns these errors into [`Diagnostics`](crate::provider::Diagnostics)
//! grouped by the phase in which they happened (pre-check, set, commit, ...).

use std::path::PathBuf;
use thiserror::Error;

use crate::connection::ConnectionError;
use crate::junos::SessionError;

/// Result type alias for junos-provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for junos-provider.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Error raised by the underlying connection.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Error raised by a Junos session.
    #[error(transparent)]
    Session(#[from] SessionError),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// No resource registered under this type name.
    #[error("Resource type '{0}' not found")]
    ResourceNotFound(String),

    /// A value read back from the device could not be converted.
    #[error("Failed to parse '{value}' for '{attribute}': {message}")]
    ConfigParse {
        /// Attribute being read
        attribute: String,
        /// Raw value from the device
        value: String,
        /// Conversion error message
        message: String,
    },

    /// A resource document could not be decoded into its data struct.
    #[error("Invalid document for '{resource}': {message}")]
    InvalidDocument {
        /// Resource type name
        resource: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Provider configuration is invalid.
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    // ========================================================================
    // Serialization / IO
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a parse error for an attribute read from `show configuration` output.
    pub fn config_parse(
        attribute: impl Into<String>,
        value: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Error::ConfigParse {
            attribute: attribute.into(),
            value: value.into(),
            message: message.to_string(),
        }
    }
}
