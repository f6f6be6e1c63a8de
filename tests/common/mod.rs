//! Shared test utilities and fixtures for the junos-provider test suite.
//!
//! This module provides:
//! - A mock [`Connection`] recording every command it receives
//! - Providers backed by an in-memory Junos device
//! - Assertion helpers for lifecycle responses
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use junos_provider::config::ProviderConfig;
use junos_provider::connection::{
    CommandResult, Connection, ConnectionError, ConnectionResult, ExecuteOptions,
};
use junos_provider::junos::{CliOptions, MemorySession, SetFileSession, SharedSessionFactory};
use junos_provider::provider::{LifecycleResponse, Provider, ProviderData};

// ============================================================================
// Mock Connection Implementation
// ============================================================================

/// A mock connection for testing [`CliSession`](junos_provider::junos::CliSession).
///
/// Results are matched on a substring of the command, first match wins.
#[derive(Debug)]
pub struct MockConnection {
    identifier: String,
    alive: AtomicBool,
    commands_executed: RwLock<Vec<String>>,
    command_results: RwLock<Vec<(String, CommandResult)>>,
    default_result: RwLock<CommandResult>,
    should_fail: AtomicBool,
}

impl MockConnection {
    /// Create a new mock connection with the given identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            alive: AtomicBool::new(true),
            commands_executed: RwLock::new(Vec::new()),
            command_results: RwLock::new(Vec::new()),
            default_result: RwLock::new(CommandResult::success(String::new(), String::new())),
            should_fail: AtomicBool::new(false),
        }
    }

    /// Set the result for commands containing `pattern`.
    pub fn set_command_result(&self, pattern: impl Into<String>, result: CommandResult) {
        self.command_results.write().push((pattern.into(), result));
    }

    /// Set the default result for commands not explicitly configured.
    pub fn set_default_result(&self, result: CommandResult) {
        *self.default_result.write() = result;
    }

    /// Configure the mock to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Get all commands that were executed.
    pub fn get_commands(&self) -> Vec<String> {
        self.commands_executed.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        !self.alive.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn execute(
        &self,
        command: &str,
        _options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ConnectionError::ConnectionFailed(
                "Mock connection failed".to_string(),
            ));
        }

        self.commands_executed.write().push(command.to_string());

        if let Some((_, result)) = self
            .command_results
            .read()
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
        {
            return Ok(result.clone());
        }

        Ok(self.default_result.read().clone())
    }

    async fn close(&self) -> ConnectionResult<()> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Connection wrapper so a test keeps a handle on the mock given to a session.
pub struct SharedMock(pub Arc<MockConnection>);

#[async_trait]
impl Connection for SharedMock {
    fn identifier(&self) -> &str {
        self.0.identifier()
    }

    async fn is_alive(&self) -> bool {
        self.0.is_alive().await
    }

    async fn execute(
        &self,
        command: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        self.0.execute(command, options).await
    }

    async fn close(&self) -> ConnectionResult<()> {
        self.0.close().await
    }
}

/// CLI options without the pause between commands
pub fn fast_cli_options() -> CliOptions {
    CliOptions {
        sleep_short: Duration::ZERO,
        ..CliOptions::default()
    }
}

// ============================================================================
// Providers
// ============================================================================

/// Provider backed by an in-memory device holding `running`.
pub fn memory_provider(running: &[&str]) -> (Provider, Arc<MemorySession>) {
    let device = Arc::new(
        MemorySession::with_running("mem", running.iter().copied())
            .expect("running configuration lines must be valid"),
    );
    let sessions = Arc::new(SharedSessionFactory::new(device.clone()));
    let provider = Provider::new(ProviderData::new(ProviderConfig::default(), sessions));
    (provider, device)
}

/// Provider writing to a set file instead of the in-memory device.
pub fn setfile_provider(
    path: &std::path::Path,
    update_also: bool,
    delete_also: bool,
) -> (Provider, Arc<MemorySession>) {
    let device = Arc::new(MemorySession::new("mem"));
    let config = ProviderConfig {
        fake_create_setfile: Some(path.to_path_buf()),
        fake_update_also: update_also,
        fake_delete_also: delete_also,
        ..ProviderConfig::default()
    };
    let sessions = Arc::new(
        SharedSessionFactory::new(device.clone())
            .with_set_file(Arc::new(SetFileSession::new(path, 0o644))),
    );
    let provider = Provider::new(ProviderData::new(config, sessions));
    (provider, device)
}

// ============================================================================
// Assertions
// ============================================================================

/// Assert the response carries no error and return its state.
pub fn assert_ok(response: &LifecycleResponse) -> serde_json::Value {
    assert!(
        !response.diagnostics.has_error(),
        "unexpected diagnostics: {:#?}",
        response.diagnostics
    );
    response.state.clone().expect("response should carry a state")
}

/// Summaries of the error diagnostics of a response.
pub fn error_summaries(response: &LifecycleResponse) -> Vec<String> {
    response
        .diagnostics
        .errors()
        .map(|d| d.summary.clone())
        .collect()
}
