//! # junos-provider
//!
//! Manage Junos device configuration through a Terraform-style resource
//! lifecycle. Each resource is a plain struct with a schema; the provider
//! translates it to Junos `set`/`delete` statements, loads them in a locked
//! candidate configuration and commits, then reads the configuration back by
//! parsing `show configuration ... | display set relative` output.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Provider (registry + lifecycle)             │
//! │      create / read / update / delete / import over JSON      │
//! └──────────────────────────────────────────────────────────────┘
//!                 │                              │
//!                 ▼                              ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────────┐
//! │  Resources (ResourceData)    │  │  Junos sessions (Session)    │
//! │  schema, set lines, parsing  │  │  lock, load, commit, show    │
//! └──────────────────────────────┘  └──────────────────────────────┘
//!                                                │
//!                                                ▼
//!                                 ┌──────────────────────────────┐
//!                                 │  Connections (Connection)    │
//!                                 │  russh (SSH), local shell    │
//!                                 └──────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use junos_provider::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let device = Arc::new(MemorySession::new("lab"));
//! let sessions = Arc::new(SharedSessionFactory::new(device.clone()));
//! let provider = Provider::new(ProviderData::new(ProviderConfig::default(), sessions));
//!
//! let response = provider
//!     .create("junos_vlan", json!({"name": "v100", "vlan_id": 100}))
//!     .await;
//! assert!(!response.diagnostics.has_error());
//! assert!(device.running_config().contains(&"set vlans v100 vlan-id 100".to_string()));
//! # }
//! ```

// ============================================================================
// Core Modules
// ============================================================================

/// Error types
pub mod error;

/// Provider configuration loading
pub mod config;

// ============================================================================
// Transport
// ============================================================================

/// Connections running commands on the device
pub mod connection;

/// Junos CLI sessions and configuration helpers
pub mod junos;

// ============================================================================
// Provider
// ============================================================================

/// Schemas, diagnostics, lifecycle and registry
pub mod provider;

/// Built-in resources
pub mod resources;

pub use error::{Error, Result};

// Re-export commonly used items in prelude
pub mod prelude {
    //! Commonly used types.
    //!
    //! ```rust
    //! use junos_provider::prelude::*;
    //! ```

    pub use crate::config::{ProviderConfig, Transport};
    pub use crate::connection::{Connection, ConnectionError, LocalConnection};
    pub use crate::error::{Error, Result};
    pub use crate::junos::{
        CliOptions, CliSession, MemorySession, Session, SessionError, SessionFactory,
        SetFileSession, SharedSessionFactory,
    };
    pub use crate::provider::{
        Attribute, AttributePath, Block, Diagnostic, Diagnostics, LifecycleResponse, Provider,
        ProviderData, Resource, ResourceData, ResourceRegistry, Schema, Severity, Validator,
    };
}
