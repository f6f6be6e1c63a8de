//! In-memory Junos configuration.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{
    check_lines, statement_path, Session, SessionError, SessionResult, CMD_SHOW_CONFIG,
    PIPE_DISPLAY_SET, SET_W,
};

#[derive(Debug, Default)]
struct MemoryState {
    running: Vec<String>,
    candidate: Option<Vec<String>>,
    commits: Vec<String>,
    commands: Vec<String>,
}

/// A Junos device simulated in memory.
///
/// The configuration is kept as flat statement paths. `set` adds a path once,
/// `delete` removes a path and everything below it, and `show configuration
/// <path> | display set [relative]` is answered from the running configuration.
#[derive(Debug)]
pub struct MemorySession {
    identifier: String,
    state: Mutex<MemoryState>,
}

impl MemorySession {
    /// Create an empty device
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Create a device with `lines` already committed
    pub fn with_running<I, S>(identifier: impl Into<String>, lines: I) -> SessionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        check_lines(&lines)?;
        let session = Self::new(identifier);
        {
            let mut state = session.state.lock();
            for line in &lines {
                apply_line(&mut state.running, line);
            }
        }
        Ok(session)
    }

    /// Running configuration as `set` lines
    pub fn running_config(&self) -> Vec<String> {
        self.state
            .lock()
            .running
            .iter()
            .map(|path| format!("{}{}", SET_W, path))
            .collect()
    }

    /// Log messages of every commit, oldest first
    pub fn commit_log(&self) -> Vec<String> {
        self.state.lock().commits.clone()
    }

    /// Commands received, oldest first
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    /// Whether the candidate configuration is locked
    pub fn is_locked(&self) -> bool {
        self.state.lock().candidate.is_some()
    }

    fn show(running: &[String], path: &str, relative: bool) -> String {
        let mut out = String::new();
        for line in running {
            let rest = if path.is_empty() {
                Some(line.as_str())
            } else if line == path {
                Some("")
            } else {
                line.strip_prefix(path).and_then(|r| r.strip_prefix(' '))
            };

            match rest {
                Some(rest) if relative => {
                    out.push_str(SET_W.trim_end());
                    if !rest.is_empty() {
                        out.push(' ');
                        out.push_str(rest);
                    }
                    out.push('\n');
                }
                Some(_) => {
                    out.push_str(SET_W);
                    out.push_str(line);
                    out.push('\n');
                }
                None => {}
            }
        }
        out
    }
}

/// Whether `line` is `path` or sits below it.
fn under(line: &str, path: &str) -> bool {
    line == path
        || line
            .strip_prefix(path)
            .map_or(false, |rest| rest.starts_with(' '))
}

fn apply_line(config: &mut Vec<String>, line: &str) {
    match statement_path(line) {
        Some((verb, path)) if verb == SET_W => {
            if !config.iter().any(|l| l == path) {
                config.push(path.to_string());
            }
        }
        Some((_, path)) => config.retain(|l| !under(l, path)),
        None => {}
    }
}

#[async_trait]
impl Session for MemorySession {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn command(&self, command: &str) -> SessionResult<String> {
        let mut state = self.state.lock();
        state.commands.push(command.to_string());

        let unsupported = || SessionError::CommandFailed {
            command: command.to_string(),
            message: "syntax error".to_string(),
        };
        let target = command.strip_prefix(CMD_SHOW_CONFIG).ok_or_else(unsupported)?;
        let (path, pipe) = target.split_once(PIPE_DISPLAY_SET).ok_or_else(unsupported)?;
        let relative = match pipe.trim() {
            "" => false,
            "relative" => true,
            _ => return Err(unsupported()),
        };

        debug!(path = %path.trim(), relative = %relative, "Showing in-memory configuration");
        Ok(Self::show(&state.running, path.trim(), relative))
    }

    async fn config_lock(&self) -> SessionResult<()> {
        let mut state = self.state.lock();
        if state.candidate.is_some() {
            return Err(SessionError::ConfigLock(
                "configuration database locked by another session".to_string(),
            ));
        }
        state.candidate = Some(state.running.clone());
        Ok(())
    }

    async fn config_clear(&self) -> SessionResult<()> {
        self.state.lock().candidate = None;
        Ok(())
    }

    async fn config_set(&self, lines: &[String]) -> SessionResult<()> {
        check_lines(lines)?;
        let mut state = self.state.lock();
        let candidate = state.candidate.as_mut().ok_or(SessionError::NotLocked)?;
        for line in lines {
            apply_line(candidate, line);
        }
        Ok(())
    }

    async fn commit_conf(&self, log_message: &str) -> SessionResult<Vec<String>> {
        let mut state = self.state.lock();
        let candidate = state.candidate.take().ok_or(SessionError::NotLocked)?;
        state.running = candidate;
        state.commits.push(log_message.to_string());
        info!(device = %self.identifier, log = %log_message, "Configuration committed");
        Ok(Vec::new())
    }

    async fn close(&self) -> SessionResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_set_delete_commit() {
        let sess = MemorySession::new("mem");
        sess.config_lock().await.unwrap();
        sess.config_set(&lines(&[
            "set vlans v1 vlan-id 10",
            "set vlans v10 vlan-id 11",
            "set vlans v1 vlan-id 10",
        ]))
        .await
        .unwrap();
        sess.commit_conf("create").await.unwrap();
        assert_eq!(
            sess.running_config(),
            lines(&["set vlans v1 vlan-id 10", "set vlans v10 vlan-id 11"])
        );

        sess.config_lock().await.unwrap();
        sess.config_set(&lines(&["delete vlans v1"])).await.unwrap();
        sess.commit_conf("delete").await.unwrap();
        assert_eq!(sess.running_config(), lines(&["set vlans v10 vlan-id 11"]));
        assert_eq!(sess.commit_log(), lines(&["create", "delete"]));
    }

    #[tokio::test]
    async fn test_show_relative_and_absolute() {
        let sess = MemorySession::with_running(
            "mem",
            ["set vlans v1 vlan-id 10", "set vlans v1 description \"x\""],
        )
        .unwrap();

        let rel = sess
            .command("show configuration vlans v1 | display set relative")
            .await
            .unwrap();
        assert_eq!(rel, "set vlan-id 10\nset description \"x\"\n");

        let abs = sess
            .command("show configuration vlans v1 | display set")
            .await
            .unwrap();
        assert_eq!(abs, "set vlans v1 vlan-id 10\nset vlans v1 description \"x\"\n");

        let none = sess
            .command("show configuration vlans v | display set relative")
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_show_empty_container_relative() {
        let sess = MemorySession::with_running("mem", ["set routing-instances ri1"]).unwrap();
        let rel = sess
            .command("show configuration routing-instances ri1 | display set relative")
            .await
            .unwrap();
        assert_eq!(rel, "set\n");
    }

    #[tokio::test]
    async fn test_clear_discards_candidate() {
        let sess = MemorySession::new("mem");
        sess.config_lock().await.unwrap();
        assert!(matches!(
            sess.config_lock().await,
            Err(SessionError::ConfigLock(_))
        ));
        sess.config_set(&lines(&["set system host-name r1"]))
            .await
            .unwrap();
        sess.config_clear().await.unwrap();
        assert!(!sess.is_locked());
        assert!(sess.running_config().is_empty());
        assert!(matches!(
            sess.config_set(&lines(&["set system host-name r1"])).await,
            Err(SessionError::NotLocked)
        ));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let sess = MemorySession::new("mem");
        assert!(matches!(
            sess.command("show version").await,
            Err(SessionError::CommandFailed { .. })
        ));
        assert_eq!(sess.commands(), lines(&["show version"]));
    }
}
