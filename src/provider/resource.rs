//! Resource traits and registry.
//!
//! [`ResourceData`] is implemented by the plain struct of each resource and
//! carries the translation between the struct and Junos configuration lines.
//! [`Resource`] is its object-safe face over JSON documents, used by the
//! [`ResourceRegistry`] and the provider.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::diag::{
    AttributePath, Diagnostics, INCORRECT_VALUE_TYPE_SUMMARY, REQUIRES_REPLACE_SUMMARY,
};
use super::lifecycle::{self, LifecycleResponse};
use super::schema::Schema;
use super::ProviderData;
use crate::error::{Error, Result};
use crate::junos::{
    display_set_lines, Session, CMD_SHOW_CONFIG, DELETE_W, PIPE_DISPLAY_SET,
    PIPE_DISPLAY_SET_RELATIVE, SET_W,
};

/// Error building configuration lines, located on an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeError {
    pub path: AttributePath,
    pub message: String,
}

impl AttributeError {
    pub fn new(path: AttributePath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Data struct of a resource and its mapping to Junos configuration.
#[async_trait]
pub trait ResourceData:
    Serialize + DeserializeOwned + Clone + Send + Sync + Sized + 'static
{
    /// Terraform type name, e.g. `junos_vlan`
    fn type_name() -> &'static str;

    fn schema() -> Schema;

    /// Cross-field checks not expressible in the schema
    fn validate_config(&self, _diags: &mut Diagnostics) {}

    fn id(&self) -> Option<&str>;

    fn id_mut(&mut self) -> &mut Option<String>;

    /// Id computed from the key attributes
    fn key_id(&self) -> String;

    /// Set `id` from the key attributes
    fn fill_id(&mut self) {
        *self.id_mut() = Some(self.key_id());
    }

    /// Expected shape of an import id
    fn id_format() -> &'static str {
        "<name>"
    }

    /// Struct holding only the keys encoded in `id`
    fn from_id(id: &str) -> Option<Self>;

    /// Human name used in diagnostics
    fn display_name(&self) -> String;

    /// Configuration hierarchy of the resource, without `set `
    fn config_path(&self) -> String;

    /// `set <config_path> `
    fn set_prefix(&self) -> String {
        format!("{}{} ", SET_W, self.config_path())
    }

    /// Checks run on the device before creation
    async fn pre_create_check(
        &self,
        _sess: &dyn Session,
        _diags: &mut Diagnostics,
    ) -> Result<()> {
        Ok(())
    }

    /// Whether the configuration path exists on the device
    async fn exists(&self, sess: &dyn Session) -> Result<bool> {
        let output = sess
            .command(&format!(
                "{}{}{}",
                CMD_SHOW_CONFIG,
                self.config_path(),
                PIPE_DISPLAY_SET
            ))
            .await?;
        let found = display_set_lines(&output).next().is_some();
        Ok(found)
    }

    /// Lines creating the resource
    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError>;

    /// Read the resource back from the device, `None` when absent
    async fn read(&self, sess: &dyn Session) -> Result<Option<Self>> {
        let output = sess
            .command(&format!(
                "{}{}{}",
                CMD_SHOW_CONFIG,
                self.config_path(),
                PIPE_DISPLAY_SET_RELATIVE
            ))
            .await?;
        if output.trim().is_empty() {
            return Ok(None);
        }

        let mut data = Self::from_id(&self.key_id()).ok_or_else(|| Error::InvalidDocument {
            resource: Self::type_name().to_string(),
            message: format!("cannot rebuild keys from id '{}'", self.key_id()),
        })?;
        for item in display_set_lines(&output) {
            data.read_line(item)?;
        }
        Ok(Some(data))
    }

    /// Fill the struct from one line of `display set relative` output
    fn read_line(&mut self, item: &str) -> Result<()>;

    /// Lines removing the resource
    fn del_lines(&self) -> Vec<String> {
        vec![format!("{}{}", DELETE_W, self.config_path())]
    }

    /// Lines run before `set_lines` on update
    fn update_del_lines(&self) -> Vec<String> {
        self.del_lines()
    }
}

/// Decode a document into `R`, reporting schema and cross-field errors.
pub fn decode<R: ResourceData>(mut value: Value, diags: &mut Diagnostics) -> Option<R> {
    let schema = R::schema();
    schema.apply_defaults(&mut value);
    diags.extend(schema.validate_value(&value));
    if diags.has_error() {
        return None;
    }

    match serde_json::from_value::<R>(value) {
        Ok(data) => {
            data.validate_config(diags);
            (!diags.has_error()).then_some(data)
        }
        Err(e) => {
            diags.add_error(INCORRECT_VALUE_TYPE_SUMMARY, e);
            None
        }
    }
}

/// Object-safe resource over JSON documents
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn id_format(&self) -> &'static str;

    /// Validate a configuration document
    fn validate_config(&self, config: &Value) -> Diagnostics;

    /// Lines a create of `config` would load
    fn plan_set_lines(&self, config: &Value) -> (Vec<String>, Diagnostics);

    async fn create(&self, data: &ProviderData, plan: Value) -> LifecycleResponse;

    async fn read(&self, data: &ProviderData, state: Value) -> LifecycleResponse;

    async fn update(&self, data: &ProviderData, state: Value, plan: Value) -> LifecycleResponse;

    async fn delete(&self, data: &ProviderData, state: Value) -> LifecycleResponse;

    async fn import(&self, data: &ProviderData, id: &str) -> LifecycleResponse;
}

/// [`Resource`] implementation for a [`ResourceData`] struct
pub struct ResourceHandler<R>(PhantomData<fn() -> R>);

impl<R> ResourceHandler<R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for ResourceHandler<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: ResourceData> Resource for ResourceHandler<R> {
    fn type_name(&self) -> &'static str {
        R::type_name()
    }

    fn schema(&self) -> Schema {
        R::schema()
    }

    fn id_format(&self) -> &'static str {
        R::id_format()
    }

    fn validate_config(&self, config: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        decode::<R>(config.clone(), &mut diags);
        diags
    }

    fn plan_set_lines(&self, config: &Value) -> (Vec<String>, Diagnostics) {
        let mut diags = Diagnostics::new();
        let Some(plan) = decode::<R>(config.clone(), &mut diags) else {
            return (Vec::new(), diags);
        };
        match plan.set_lines() {
            Ok(lines) => (lines, diags),
            Err(e) => {
                lifecycle::add_set_error(&mut diags, e);
                (Vec::new(), diags)
            }
        }
    }

    async fn create(&self, data: &ProviderData, plan: Value) -> LifecycleResponse {
        let mut diags = Diagnostics::new();
        match decode::<R>(plan, &mut diags) {
            Some(plan) => lifecycle::create(data, plan).await.with_diagnostics(diags),
            None => LifecycleResponse::failed(diags),
        }
    }

    async fn read(&self, data: &ProviderData, state: Value) -> LifecycleResponse {
        match serde_json::from_value::<R>(state) {
            Ok(state) => lifecycle::read(data, state).await,
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_error(INCORRECT_VALUE_TYPE_SUMMARY, e);
                LifecycleResponse::failed(diags)
            }
        }
    }

    async fn update(&self, data: &ProviderData, mut state: Value, mut plan: Value) -> LifecycleResponse {
        let schema = R::schema();
        schema.apply_defaults(&mut state);
        schema.apply_defaults(&mut plan);
        schema.carry_state(&state, &mut plan);

        let mut diags = Diagnostics::new();
        for path in schema.replace_paths(&state, &plan) {
            diags.add_attribute_error(
                path,
                REQUIRES_REPLACE_SUMMARY,
                "attribute change requires destroying and recreating the resource",
            );
        }
        if diags.has_error() {
            return LifecycleResponse::failed(diags);
        }

        let prior = match serde_json::from_value::<R>(state) {
            Ok(prior) => prior,
            Err(e) => {
                diags.add_error(INCORRECT_VALUE_TYPE_SUMMARY, e);
                return LifecycleResponse::failed(diags);
            }
        };
        match decode::<R>(plan, &mut diags) {
            Some(plan) => lifecycle::update(data, prior, plan)
                .await
                .with_diagnostics(diags),
            None => LifecycleResponse::failed(diags),
        }
    }

    async fn delete(&self, data: &ProviderData, state: Value) -> LifecycleResponse {
        match serde_json::from_value::<R>(state) {
            Ok(state) => lifecycle::delete(data, state).await,
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_error(INCORRECT_VALUE_TYPE_SUMMARY, e);
                LifecycleResponse::failed(diags)
            }
        }
    }

    async fn import(&self, data: &ProviderData, id: &str) -> LifecycleResponse {
        lifecycle::import::<R>(data, id).await
    }
}

/// Registry of resources by type name
pub struct ResourceRegistry {
    resources: HashMap<String, Arc<dyn Resource>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }

    /// Create a registry with every built-in resource
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::resources::register_builtins(&mut registry);
        registry
    }

    /// Register the resource implemented by `R`
    pub fn register_data<R: ResourceData>(&mut self) {
        self.register(Arc::new(ResourceHandler::<R>::new()));
    }

    /// Register a resource
    pub fn register(&mut self, resource: Arc<dyn Resource>) {
        self.resources
            .insert(resource.type_name().to_string(), resource);
    }

    /// Get a resource by type name
    pub fn get(&self, type_name: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(type_name).cloned()
    }

    /// Check if a resource exists
    pub fn contains(&self, type_name: &str) -> bool {
        self.resources.contains_key(type_name)
    }

    /// Sorted type names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
