//! Junos CLI session tests
//!
//! Drives [`CliSession`] over a mock connection to check the exact scripts
//! sent to the device and how their output is interpreted:
//! - `cli -c` wrapping and raw mode
//! - Candidate locking and buffering
//! - `commit check` before committing, commit warnings and errors
//! - `commit confirmed`
//! - Transport failures
//! - A provider running on top of the CLI session

mod common;

use async_trait::async_trait;
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

use junos_provider::config::ProviderConfig;
use junos_provider::connection::CommandResult;
use junos_provider::junos::{
    CliOptions, CliSession, Session, SessionError, SessionFactory, SessionResult,
};
use junos_provider::provider::diag::DUPLICATE_CONFIG_ERROR_SUMMARY;
use junos_provider::provider::{Provider, ProviderData};

fn ok(stdout: &str) -> CommandResult {
    CommandResult::success(stdout.to_string(), String::new())
}

fn session(mock: &Arc<MockConnection>, options: CliOptions) -> CliSession<SharedMock> {
    CliSession::new(SharedMock(Arc::clone(mock)), options)
}

/// Mock device whose `commit check` succeeds and whose commit prints `commit_output`
fn committing_mock(commit_output: &str) -> Arc<MockConnection> {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_command_result("commit check", ok("configuration check succeeds\n"));
    mock.set_command_result("configure exclusive", ok(commit_output));
    mock
}

fn lines(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Operational Commands
// ============================================================================

#[tokio::test]
async fn test_command_is_wrapped_in_cli() {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_command_result("show configuration", ok("set vlan-id 10\n"));
    let sess = session(&mock, fast_cli_options());

    let output = sess
        .command("show configuration vlans v1 | display set relative")
        .await
        .unwrap();
    assert_eq!(output, "set vlan-id 10\n");
    assert_eq!(
        mock.get_commands(),
        vec!["cli -c 'show configuration vlans v1 | display set relative'"]
    );
    assert_eq!(sess.identifier(), "re0");
}

#[tokio::test]
async fn test_command_without_wrapping() {
    let mock = Arc::new(MockConnection::new("re0"));
    let options = CliOptions {
        wrap_cli: false,
        ..fast_cli_options()
    };
    let sess = session(&mock, options);

    sess.command("show version").await.unwrap();
    assert_eq!(mock.get_commands(), vec!["show version"]);
}

#[tokio::test]
async fn test_command_error_output() {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_command_result(
        "show configuration",
        ok("\nerror: syntax error: vlanz\n"),
    );
    let sess = session(&mock, fast_cli_options());

    match sess.command("show configuration vlanz").await {
        Err(SessionError::CommandFailed { command, message }) => {
            assert_eq!(command, "show configuration vlanz");
            assert_eq!(message, "error: syntax error: vlanz");
        }
        other => panic!("expected CommandFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_command_exit_status() {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_default_result(CommandResult::failure(
        127,
        String::new(),
        "cli: not found".to_string(),
    ));
    let sess = session(&mock, fast_cli_options());

    assert!(matches!(
        sess.command("show version").await,
        Err(SessionError::CommandFailed { message, .. }) if message == "cli: not found"
    ));
}

#[tokio::test]
async fn test_transport_failure() {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_should_fail(true);
    let sess = session(&mock, fast_cli_options());

    assert!(matches!(
        sess.command("show version").await,
        Err(SessionError::Connection(_))
    ));
}

// ============================================================================
// Candidate Configuration
// ============================================================================

#[tokio::test]
async fn test_lines_are_buffered_until_commit() {
    let mock = committing_mock("commit complete\n");
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    sess.config_set(&lines(&["delete vlans v1"])).await.unwrap();
    sess.config_set(&lines(&["set vlans v1 vlan-id 10"]))
        .await
        .unwrap();
    assert!(mock.get_commands().is_empty());

    let warnings = sess.commit_conf("update resource junos_vlan").await.unwrap();
    assert!(warnings.is_empty());
    assert_eq!(
        mock.get_commands(),
        vec![
            "cli -c 'configure exclusive; delete vlans v1; set vlans v1 vlan-id 10; \
             commit check; exit'",
            "cli -c 'configure exclusive; delete vlans v1; set vlans v1 vlan-id 10; \
             commit comment \"update resource junos_vlan\"; exit'",
        ]
    );

    // The lock is released by the commit
    assert!(matches!(
        sess.config_set(&lines(&["set vlans v2"])).await,
        Err(SessionError::NotLocked)
    ));
}

#[tokio::test]
async fn test_lock_twice_fails() {
    let mock = Arc::new(MockConnection::new("re0"));
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    assert!(matches!(
        sess.config_lock().await,
        Err(SessionError::ConfigLock(_))
    ));

    sess.config_clear().await.unwrap();
    sess.config_lock().await.unwrap();
}

#[tokio::test]
async fn test_invalid_line_rejected() {
    let mock = Arc::new(MockConnection::new("re0"));
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    assert!(matches!(
        sess.config_set(&lines(&["show vlans"])).await,
        Err(SessionError::InvalidLine(line)) if line == "show vlans"
    ));
}

#[tokio::test]
async fn test_clear_discards_lines() {
    let mock = committing_mock("commit complete\n");
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    sess.config_set(&lines(&["set vlans v1"])).await.unwrap();
    sess.config_clear().await.unwrap();
    sess.config_lock().await.unwrap();
    sess.commit_conf("").await.unwrap();

    assert_eq!(
        mock.get_commands(),
        vec!["cli -c 'configure exclusive; commit; exit'"]
    );
}

// ============================================================================
// Commit
// ============================================================================

#[tokio::test]
async fn test_commit_warnings() {
    let mock = committing_mock(
        "[edit vlans]\n  'v1'\n    warning: statement has no contents; ignored\ncommit complete\n",
    );
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    sess.config_set(&lines(&["set vlans v1"])).await.unwrap();
    let warnings = sess.commit_conf("create").await.unwrap();
    assert_eq!(
        warnings,
        vec!["warning: statement has no contents; ignored"]
    );
}

#[tokio::test]
async fn test_commit_errors() {
    let mock = committing_mock(
        "[edit vlans v1]\n  'l3-interface irb.10'\n    error: interface not found\nerror: configuration check-out failed\n",
    );
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    sess.config_set(&lines(&["set vlans v1 l3-interface irb.10"]))
        .await
        .unwrap();
    match sess.commit_conf("create").await {
        Err(SessionError::Commit(message)) => {
            assert_eq!(
                message,
                "error: interface not found\nerror: configuration check-out failed"
            );
        }
        other => panic!("expected Commit error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_check_sends_no_commit() {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_command_result(
        "commit check",
        ok("set vlanz v1\n        ^\nsyntax error.\nconfiguration check succeeds\n"),
    );
    mock.set_command_result("configure exclusive", ok("commit complete\n"));
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    sess.config_set(&lines(&["set vlans v1 vlan-id 10", "set vlanz v1"]))
        .await
        .unwrap();
    match sess.commit_conf("create").await {
        Err(SessionError::Commit(message)) => assert_eq!(message, "syntax error."),
        other => panic!("expected Commit error, got {:?}", other),
    }

    let commands = mock.get_commands();
    assert_eq!(
        commands,
        vec!["cli -c 'configure exclusive; set vlans v1 vlan-id 10; set vlanz v1; commit check; exit'"]
    );
    assert!(!commands.iter().any(|c| c.contains("; commit;") || c.contains("commit comment")));
}

#[tokio::test]
async fn test_commit_check_errors() {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_command_result(
        "commit check",
        ok("[edit vlans v1]\n  'l3-interface irb.10'\n    error: interface not found\nerror: configuration check-out failed\n"),
    );
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    sess.config_set(&lines(&["set vlans v1 l3-interface irb.10"]))
        .await
        .unwrap();
    assert!(matches!(
        sess.commit_conf("create").await,
        Err(SessionError::Commit(_))
    ));
    assert_eq!(mock.get_commands().len(), 1);
}

#[tokio::test]
async fn test_commit_without_completion() {
    let mock = committing_mock("error: configuration database locked\n");
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    assert!(sess.commit_conf("create").await.is_err());

    // Nothing buffered and no lock held
    assert!(matches!(
        sess.commit_conf("create").await,
        Err(SessionError::NotLocked)
    ));
}

#[tokio::test]
async fn test_commit_confirmed_runs_confirming_commit() {
    let mock = committing_mock("commit complete\n");
    let options = CliOptions {
        commit_confirmed: Some(5),
        ..fast_cli_options()
    };
    let sess = session(&mock, options);

    sess.config_lock().await.unwrap();
    sess.config_set(&lines(&["set vlans v1 vlan-id 10"]))
        .await
        .unwrap();
    sess.commit_conf("create").await.unwrap();

    assert_eq!(
        mock.get_commands(),
        vec![
            "cli -c 'configure exclusive; set vlans v1 vlan-id 10; commit check; exit'",
            "cli -c 'configure exclusive; set vlans v1 vlan-id 10; commit confirmed 5 comment \"create\"; exit'",
            "cli -c 'configure exclusive; commit comment \"create\"; exit'",
        ]
    );
}

#[tokio::test]
async fn test_close_closes_connection() {
    let mock = Arc::new(MockConnection::new("re0"));
    let sess = session(&mock, fast_cli_options());

    sess.config_lock().await.unwrap();
    sess.close().await.unwrap();
    assert!(mock.is_closed());
}

// ============================================================================
// Provider Over A CLI Session
// ============================================================================

struct MockFactory(Arc<MockConnection>);

#[async_trait]
impl SessionFactory for MockFactory {
    async fn start_session(&self) -> SessionResult<Arc<dyn Session>> {
        Ok(Arc::new(session(&self.0, fast_cli_options())))
    }
}

#[tokio::test]
async fn test_provider_detects_existing_resource() {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_command_result(
        "show configuration vlans v1 | display set",
        ok("set vlans v1 vlan-id 10\n"),
    );
    let provider = Provider::new(ProviderData::new(
        ProviderConfig::default(),
        Arc::new(MockFactory(Arc::clone(&mock))),
    ));

    let response = provider
        .create("junos_vlan", json!({"name": "v1", "vlan_id": 10}))
        .await;
    assert_eq!(error_summaries(&response), vec![DUPLICATE_CONFIG_ERROR_SUMMARY]);

    let commands = mock.get_commands();
    assert_eq!(
        commands,
        vec!["cli -c 'show configuration vlans v1 | display set'"]
    );
    assert!(mock.is_closed());
}

#[tokio::test]
async fn test_provider_reads_through_cli() {
    let mock = Arc::new(MockConnection::new("re0"));
    mock.set_command_result(
        "show configuration vlans v1 | display set relative",
        ok("\nset vlan-id 10\nset description \"users\"\n\n"),
    );
    let provider = Provider::new(ProviderData::new(
        ProviderConfig::default(),
        Arc::new(MockFactory(Arc::clone(&mock))),
    ));

    let state = assert_ok(&provider.import("junos_vlan", "v1").await);
    assert_eq!(state["id"], "v1");
    assert_eq!(state["vlan_id"], 10);
    assert_eq!(state["description"], "users");
}
