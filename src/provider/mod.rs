//! Provider: resource registry, session management and lifecycle entry points.
//!
//! ```rust,no_run
//! # async fn example() -> anyhow::Result<()> {
//! use junos_provider::config::ProviderConfig;
//! use junos_provider::provider::Provider;
//! use serde_json::json;
//!
//! let provider = Provider::from_config(ProviderConfig::load(None)?)?;
//! let response = provider
//!     .create("junos_vlan", json!({"name": "v100", "vlan_id": 100}))
//!     .await;
//! for diag in response.diagnostics.iter() {
//!     eprintln!("{}", diag);
//! }
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod diag;
pub mod lifecycle;
pub mod resource;
pub mod schema;
pub mod validator;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub use diag::{AttributePath, Diagnostic, Diagnostics, Severity};
pub use lifecycle::LifecycleResponse;
pub use resource::{AttributeError, Resource, ResourceData, ResourceHandler, ResourceRegistry};
pub use schema::{Attribute, AttributeSet, Block, Nesting, PlanModifier, Schema};
pub use validator::{StringFormat, Validator};

use crate::config::{ProviderConfig, Transport};
use crate::connection::LocalConnection;
use crate::error::{Error, Result};
use crate::junos::{CliSession, Session, SessionFactory, SessionResult, SetFileSession};

/// Data shared by every lifecycle operation
#[derive(Clone)]
pub struct ProviderData {
    config: ProviderConfig,
    sessions: Arc<dyn SessionFactory>,
}

impl ProviderData {
    pub fn new(config: ProviderConfig, sessions: Arc<dyn SessionFactory>) -> Self {
        Self { config, sessions }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub async fn start_session(&self) -> SessionResult<Arc<dyn Session>> {
        self.sessions.start_session().await
    }

    /// Set-file session when fake create is enabled
    pub fn fake_create_session(&self) -> Option<Arc<dyn Session>> {
        self.sessions.set_file_session()
    }

    pub fn fake_update_also(&self) -> bool {
        self.config.fake_update_also
    }

    pub fn fake_delete_also(&self) -> bool {
        self.config.fake_delete_also
    }
}

/// Opens [`CliSession`]s with the transport chosen in the configuration.
pub struct CliSessionFactory {
    config: ProviderConfig,
}

impl CliSessionFactory {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    #[cfg(feature = "russh")]
    async fn ssh_session(&self) -> SessionResult<Arc<dyn Session>> {
        use crate::connection::russh::{RusshConnection, SshAuth};
        use std::time::Duration;

        let host = self.config.host.as_deref().unwrap_or_default();
        let auth = SshAuth {
            password: self.config.password.clone(),
            key_file: self.config.key_file.clone(),
            key_pass: self.config.key_pass.clone(),
            use_agent: self.config.use_agent,
        };
        let conn = RusshConnection::connect(
            host,
            self.config.port,
            &self.config.username,
            &auth,
            Duration::from_secs(self.config.ssh_timeout),
        )
        .await?;
        Ok(Arc::new(CliSession::new(conn, self.config.cli_options())))
    }

    #[cfg(not(feature = "russh"))]
    async fn ssh_session(&self) -> SessionResult<Arc<dyn Session>> {
        Err(crate::junos::SessionError::Unsupported(
            "ssh transport (built without the russh feature)".to_string(),
        ))
    }
}

#[async_trait]
impl SessionFactory for CliSessionFactory {
    async fn start_session(&self) -> SessionResult<Arc<dyn Session>> {
        debug!(transport = ?self.config.transport, host = ?self.config.host, "Starting session");
        match self.config.transport {
            Transport::Ssh => self.ssh_session().await,
            Transport::Local => Ok(Arc::new(CliSession::new(
                LocalConnection::new(),
                self.config.cli_options(),
            ))),
        }
    }

    fn set_file_session(&self) -> Option<Arc<dyn Session>> {
        let path = self.config.fake_create_setfile.as_ref()?;
        let permission = self.config.permission().unwrap_or(0o644);
        Some(Arc::new(SetFileSession::new(path, permission)))
    }
}

/// The provider: a registry of resources and the data they operate with
pub struct Provider {
    data: ProviderData,
    registry: ResourceRegistry,
}

impl Provider {
    /// Provider with every built-in resource
    pub fn new(data: ProviderData) -> Self {
        Self {
            data,
            registry: ResourceRegistry::with_builtins(),
        }
    }

    /// Provider reaching the device configured in `config`
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let sessions = Arc::new(CliSessionFactory::new(config.clone()));
        Ok(Self::new(ProviderData::new(config, sessions)))
    }

    pub fn data(&self) -> &ProviderData {
        &self.data
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Look up a resource type
    pub fn resource(&self, type_name: &str) -> Result<Arc<dyn Resource>> {
        self.registry
            .get(type_name)
            .ok_or_else(|| Error::ResourceNotFound(type_name.to_string()))
    }

    fn unknown(type_name: &str) -> Diagnostics {
        let mut diags = Diagnostics::new();
        diags.add_error(
            diag::UNSUPPORTED_ATTRIBUTE_SUMMARY,
            Error::ResourceNotFound(type_name.to_string()),
        );
        diags
    }

    pub fn validate_resource_config(&self, type_name: &str, config: &Value) -> Diagnostics {
        match self.registry.get(type_name) {
            Some(resource) => resource.validate_config(config),
            None => Self::unknown(type_name),
        }
    }

    pub fn plan_set_lines(&self, type_name: &str, config: &Value) -> (Vec<String>, Diagnostics) {
        match self.registry.get(type_name) {
            Some(resource) => resource.plan_set_lines(config),
            None => (Vec::new(), Self::unknown(type_name)),
        }
    }

    pub async fn create(&self, type_name: &str, plan: Value) -> LifecycleResponse {
        match self.registry.get(type_name) {
            Some(resource) => resource.create(&self.data, plan).await,
            None => LifecycleResponse::failed(Self::unknown(type_name)),
        }
    }

    pub async fn read(&self, type_name: &str, state: Value) -> LifecycleResponse {
        match self.registry.get(type_name) {
            Some(resource) => resource.read(&self.data, state).await,
            None => LifecycleResponse::failed(Self::unknown(type_name)),
        }
    }

    pub async fn update(&self, type_name: &str, state: Value, plan: Value) -> LifecycleResponse {
        match self.registry.get(type_name) {
            Some(resource) => resource.update(&self.data, state, plan).await,
            None => LifecycleResponse::failed(Self::unknown(type_name)),
        }
    }

    pub async fn delete(&self, type_name: &str, state: Value) -> LifecycleResponse {
        match self.registry.get(type_name) {
            Some(resource) => resource.delete(&self.data, state).await,
            None => LifecycleResponse::failed(Self::unknown(type_name)),
        }
    }

    pub async fn import(&self, type_name: &str, id: &str) -> LifecycleResponse {
        match self.registry.get(type_name) {
            Some(resource) => resource.import(&self.data, id).await,
            None => LifecycleResponse::failed(Self::unknown(type_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junos::{MemorySession, SharedSessionFactory};

    fn provider() -> Provider {
        let sessions = Arc::new(SharedSessionFactory::new(Arc::new(MemorySession::new("mem"))));
        Provider::new(ProviderData::new(ProviderConfig::default(), sessions))
    }

    #[test]
    fn test_unknown_resource() {
        let provider = provider();
        assert!(provider.resource("junos_nope").is_err());
        assert!(provider
            .validate_resource_config("junos_nope", &serde_json::json!({}))
            .has_error());
    }

    #[test]
    fn test_registry_contains_builtins() {
        let provider = provider();
        assert!(provider.registry().contains("junos_vlan"));
        assert_eq!(provider.registry().names().len(), 10);
    }

    #[test]
    fn test_from_config_validates() {
        assert!(Provider::from_config(ProviderConfig::default()).is_err());
    }
}
