//! Session writing configuration lines to a file.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{check_lines, Session, SessionError, SessionResult};

/// Session used in fake-create mode: lines are appended to a set file
/// instead of being loaded on a device.
#[derive(Debug, Clone)]
pub struct SetFileSession {
    identifier: String,
    path: PathBuf,
    permission: u32,
}

impl SetFileSession {
    /// Append to `path`, creating it with `permission` (octal mode) if missing
    pub fn new(path: impl Into<PathBuf>, permission: u32) -> Self {
        let path = path.into();
        Self {
            identifier: format!("setfile:{}", path.display()),
            path,
            permission,
        }
    }

    /// File receiving the lines
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, lines: &[String]) -> std::io::Result<()> {
        let mut options = std::fs::OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.permission);
        }

        let mut file = options.open(&self.path)?;
        for line in lines {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Session for SetFileSession {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn command(&self, command: &str) -> SessionResult<String> {
        Err(SessionError::Unsupported(format!("command '{}'", command)))
    }

    async fn config_lock(&self) -> SessionResult<()> {
        Ok(())
    }

    async fn config_clear(&self) -> SessionResult<()> {
        Ok(())
    }

    async fn config_set(&self, lines: &[String]) -> SessionResult<()> {
        check_lines(lines)?;
        debug!(file = %self.path.display(), count = %lines.len(), "Appending lines to set file");
        self.append(lines)?;
        Ok(())
    }

    async fn commit_conf(&self, _log_message: &str) -> SessionResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn close(&self) -> SessionResult<()> {
        Ok(())
    }
}
