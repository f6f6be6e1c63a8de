//! Subcommands module for junos-provider CLI
//!
//! This module contains all the subcommand implementations.

pub mod inspect;
pub mod lifecycle;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use junos_provider::config::ProviderConfig;
use junos_provider::provider::{CliSessionFactory, Diagnostics, Provider, ProviderData};

use crate::cli::output::OutputFormatter;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: ProviderConfig,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: ProviderConfig) -> Self {
        let output = OutputFormatter::new(!cli.no_color, cli.output, cli.verbosity());

        output.debug(&format!(
            "Transport {:?}, host {}",
            config.transport,
            config.host.as_deref().unwrap_or("-")
        ));

        Self { config, output }
    }

    /// Provider for commands that never reach the device
    pub fn offline_provider(&self) -> Provider {
        let sessions = Arc::new(CliSessionFactory::new(self.config.clone()));
        Provider::new(ProviderData::new(self.config.clone(), sessions))
    }

    /// Provider connected through the configured transport
    pub fn provider(&self) -> Result<Provider> {
        Provider::from_config(self.config.clone()).context("Invalid provider configuration")
    }

    /// Print diagnostics and turn them into an exit code
    pub fn finish(&self, diags: &Diagnostics) -> i32 {
        self.output.diagnostics(diags);
        if diags.has_error() {
            1
        } else {
            0
        }
    }
}

/// Read a JSON or YAML resource document
pub fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;

    let value: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML document: {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON document: {}", path.display()))?,
    };

    if !value.is_object() {
        bail!("Document {} must be an object", path.display());
    }
    Ok(value)
}
