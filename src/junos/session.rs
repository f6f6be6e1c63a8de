//! Junos CLI session over a [`Connection`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::{check_lines, Session, SessionError, SessionResult};
use crate::connection::{Connection, ExecuteOptions};

const COMMIT_COMPLETE: &str = "commit complete";
const CHECK_SUCCEEDS: &str = "configuration check succeeds";

/// Options of a [`CliSession`].
#[derive(Debug, Clone)]
pub struct CliOptions {
    /// Wrap commands in `cli -c '...'` (the connection lands in a shell)
    pub wrap_cli: bool,
    /// Pause before each command
    pub sleep_short: Duration,
    /// Minutes for `commit confirmed`, followed by a confirming commit
    pub commit_confirmed: Option<u32>,
    /// Per-command timeout in seconds
    pub command_timeout: Option<u64>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            wrap_cli: true,
            sleep_short: Duration::from_millis(100),
            commit_confirmed: None,
            command_timeout: None,
        }
    }
}

/// Session driving the Junos CLI.
///
/// Lines loaded after [`config_lock`](Session::config_lock) are buffered and
/// replayed at commit time inside `configure exclusive` scripts, so the
/// exclusive database lock is held by the device for the duration of the
/// commit only. The lines are first loaded with `commit check` and the
/// candidate discarded on exit; the committing script runs only when that
/// check reports no error.
pub struct CliSession<C: Connection> {
    conn: C,
    options: CliOptions,
    candidate: Mutex<Option<Vec<String>>>,
}

impl<C: Connection> CliSession<C> {
    /// Create a session on `conn`
    pub fn new(conn: C, options: CliOptions) -> Self {
        Self {
            conn,
            options,
            candidate: Mutex::new(None),
        }
    }

    /// Underlying connection
    pub fn connection(&self) -> &C {
        &self.conn
    }

    fn wrap(&self, script: &str) -> String {
        if self.options.wrap_cli {
            format!("cli -c '{}'", script.replace('\'', "'\\''"))
        } else {
            script.to_string()
        }
    }

    fn commit_command(&self, log_message: &str, confirmed: Option<u32>) -> String {
        let mut commit = String::from("commit");
        if let Some(minutes) = confirmed {
            commit.push_str(&format!(" confirmed {}", minutes));
        }
        if !log_message.is_empty() {
            commit.push_str(&format!(r#" comment "{}""#, log_message.replace('"', r#"\""#)));
        }
        commit
    }

    fn configure_script(lines: &[String], commit: &str) -> String {
        let mut parts = Vec::with_capacity(lines.len() + 3);
        parts.push("configure exclusive");
        parts.extend(lines.iter().map(String::as_str));
        parts.push(commit);
        parts.push("exit");
        parts.join("; ")
    }

    async fn run(&self, script: &str) -> SessionResult<String> {
        if !self.options.sleep_short.is_zero() {
            tokio::time::sleep(self.options.sleep_short).await;
        }

        let command = self.wrap(script);
        debug!(device = %self.conn.identifier(), command = %command, "Running command");

        let options = self
            .options
            .command_timeout
            .map(|t| ExecuteOptions::new().with_timeout(t));
        let result = self.conn.execute(&command, options).await?;
        trace!(stdout = %result.stdout, stderr = %result.stderr, "Command output");

        if !result.success {
            return Err(SessionError::CommandFailed {
                command: script.to_string(),
                message: result.combined_output().trim().to_string(),
            });
        }

        Ok(result.stdout)
    }

    /// Split commit output into warnings, failing on any error line.
    fn parse_commit_output(output: &str) -> SessionResult<Vec<String>> {
        Self::parse_configure_output(output, COMMIT_COMPLETE)
    }

    /// Output of a `commit check` script, failing on any error line.
    fn parse_check_output(output: &str) -> SessionResult<()> {
        Self::parse_configure_output(output, CHECK_SUCCEEDS).map(|_| ())
    }

    fn parse_configure_output(output: &str, done: &str) -> SessionResult<Vec<String>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for line in output.lines().map(str::trim) {
            if line.starts_with("error:") || line == "syntax error." {
                errors.push(line.to_string());
            } else if line.starts_with("warning:") {
                warnings.push(line.to_string());
            }
        }

        if !errors.is_empty() {
            return Err(SessionError::Commit(errors.join("\n")));
        }
        if !output.contains(done) {
            return Err(SessionError::Commit(output.trim().to_string()));
        }

        Ok(warnings)
    }
}

#[async_trait]
impl<C: Connection> Session for CliSession<C> {
    fn identifier(&self) -> &str {
        self.conn.identifier()
    }

    async fn command(&self, command: &str) -> SessionResult<String> {
        let output = self.run(command).await?;
        if let Some(line) = output
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("error:"))
        {
            return Err(SessionError::CommandFailed {
                command: command.to_string(),
                message: line.to_string(),
            });
        }
        Ok(output)
    }

    async fn config_lock(&self) -> SessionResult<()> {
        let mut candidate = self.candidate.lock();
        if candidate.is_some() {
            return Err(SessionError::ConfigLock(
                "candidate configuration already locked by this session".to_string(),
            ));
        }
        *candidate = Some(Vec::new());
        debug!(device = %self.conn.identifier(), "Candidate configuration locked");
        Ok(())
    }

    async fn config_clear(&self) -> SessionResult<()> {
        if let Some(lines) = self.candidate.lock().take() {
            debug!(discarded = %lines.len(), "Candidate configuration cleared");
        }
        Ok(())
    }

    async fn config_set(&self, lines: &[String]) -> SessionResult<()> {
        check_lines(lines)?;
        let mut candidate = self.candidate.lock();
        let buffer = candidate.as_mut().ok_or(SessionError::NotLocked)?;
        debug!(count = %lines.len(), "Loading configuration lines");
        buffer.extend(lines.iter().cloned());
        Ok(())
    }

    async fn commit_conf(&self, log_message: &str) -> SessionResult<Vec<String>> {
        let lines = self.candidate.lock().take().ok_or(SessionError::NotLocked)?;

        if !lines.is_empty() {
            let output = self.run(&Self::configure_script(&lines, "commit check")).await?;
            Self::parse_check_output(&output)?;
            debug!(device = %self.conn.identifier(), lines = %lines.len(), "Configuration check succeeded");
        }

        let commit = self.commit_command(log_message, self.options.commit_confirmed);
        let output = self.run(&Self::configure_script(&lines, &commit)).await?;
        let mut warnings = Self::parse_commit_output(&output)?;

        if self.options.commit_confirmed.is_some() {
            let confirm = self.commit_command(log_message, None);
            let output = self.run(&Self::configure_script(&[], &confirm)).await?;
            warnings.extend(Self::parse_commit_output(&output)?);
        }

        for warning in &warnings {
            warn!(device = %self.conn.identifier(), warning = %warning, "Commit warning");
        }
        info!(device = %self.conn.identifier(), log = %log_message, lines = %lines.len(), "Configuration committed");

        Ok(warnings)
    }

    async fn close(&self) -> SessionResult<()> {
        self.candidate.lock().take();
        self.conn.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commit_output() {
        let ok = "configuration check succeeds\ncommit complete\n";
        assert!(CliSession::<crate::connection::LocalConnection>::parse_commit_output(ok)
            .unwrap()
            .is_empty());

        let warn = "warning: statement has no contents; ignored\ncommit complete\n";
        assert_eq!(
            CliSession::<crate::connection::LocalConnection>::parse_commit_output(warn).unwrap(),
            vec!["warning: statement has no contents; ignored".to_string()]
        );

        let err = "error: configuration check-out failed\n";
        assert!(matches!(
            CliSession::<crate::connection::LocalConnection>::parse_commit_output(err),
            Err(SessionError::Commit(_))
        ));

        assert!(
            CliSession::<crate::connection::LocalConnection>::parse_commit_output("").is_err()
        );
    }

    #[test]
    fn test_parse_check_output() {
        assert!(CliSession::<crate::connection::LocalConnection>::parse_check_output(
            "configuration check succeeds\n"
        )
        .is_ok());

        let syntax = "set vlanz v1\n     ^\nsyntax error.\nconfiguration check succeeds\n";
        assert!(matches!(
            CliSession::<crate::connection::LocalConnection>::parse_check_output(syntax),
            Err(SessionError::Commit(message)) if message == "syntax error."
        ));

        // a commit never reports the check marker
        assert!(
            CliSession::<crate::connection::LocalConnection>::parse_check_output("commit complete\n")
                .is_err()
        );
    }

    #[test]
    fn test_configure_script() {
        let script = CliSession::<crate::connection::LocalConnection>::configure_script(
            &["set vlans v1 vlan-id 10".to_string()],
            "commit",
        );
        assert_eq!(script, "configure exclusive; set vlans v1 vlan-id 10; commit; exit");
    }

    #[test]
    fn test_wrap_escapes_single_quotes() {
        let session = CliSession::new(
            crate::connection::LocalConnection::with_identifier("re0"),
            CliOptions::default(),
        );
        assert_eq!(session.wrap("show 'x'"), r#"cli -c 'show '\''x'\'''"#);
        assert_eq!(
            session.commit_command("create \"x\"", Some(5)),
            r#"commit confirmed 5 comment "create \"x\"""#
        );
    }
}
