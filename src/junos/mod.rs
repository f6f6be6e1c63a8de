//! Junos session layer.
//!
//! A [`Session`] is what every resource talks to: it runs operational `show`
//! commands and pushes `set`/`delete` lines through a locked candidate
//! configuration that is then committed. Three implementations exist:
//!
//! - [`CliSession`] drives the Junos CLI over any [`Connection`](crate::connection::Connection)
//! - [`MemorySession`] keeps an in-memory configuration, for tests and offline rendering
//! - [`SetFileSession`] appends lines to a file instead of touching a device

mod memory;
mod session;
mod setfile;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::connection::ConnectionError;

pub use memory::MemorySession;
pub use session::{CliOptions, CliSession};
pub use setfile::SetFileSession;

/// Word starting a configuration line to add.
pub const SET_W: &str = "set ";
/// Line start of `display set` output.
pub const SET_LS: &str = "set ";
/// Word starting a configuration line to remove.
pub const DELETE_W: &str = "delete ";
/// Prefix of a configuration show command.
pub const CMD_SHOW_CONFIG: &str = "show configuration ";
/// Pipe to get configuration as set lines.
pub const PIPE_DISPLAY_SET: &str = " | display set";
/// Pipe to get configuration as set lines relative to the shown hierarchy.
pub const PIPE_DISPLAY_SET_RELATIVE: &str = " | display set relative";
/// Separator between keys of a multi-key resource id.
pub const ID_SEPARATOR: &str = "_-_";
/// Name of the master routing instance.
pub const DEFAULT_W: &str = "default";
/// Start tag wrapping configuration output in XML mode.
pub const XML_START_TAG_CONFIG_OUT: &str = "<configuration-output>";
/// End tag wrapping configuration output in XML mode.
pub const XML_END_TAG_CONFIG_OUT: &str = "</configuration-output>";

/// Errors raised by a Junos session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Command ran but the device reported a failure.
    #[error("command '{command}' failed: {message}")]
    CommandFailed {
        /// Command as sent to the device
        command: String,
        /// Device output
        message: String,
    },

    /// Candidate configuration could not be locked.
    #[error("failed to lock config: {0}")]
    ConfigLock(String),

    /// Configuration change attempted without holding the lock.
    #[error("candidate configuration not locked")]
    NotLocked,

    /// Line is neither a `set` nor a `delete` statement.
    #[error("invalid configuration line '{0}'")]
    InvalidLine(String),

    /// Commit was refused by the device.
    #[error("commit failed: {0}")]
    Commit(String),

    /// Operation not available on this kind of session.
    #[error("{0} not supported by this session")]
    Unsupported(String),

    /// Local file I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// A configuration session on a Junos device.
#[async_trait]
pub trait Session: Send + Sync {
    /// Identifier of the device behind the session
    fn identifier(&self) -> &str;

    /// Run an operational command and return its output
    async fn command(&self, command: &str) -> SessionResult<String>;

    /// Lock the candidate configuration
    async fn config_lock(&self) -> SessionResult<()>;

    /// Discard the candidate configuration and release the lock
    async fn config_clear(&self) -> SessionResult<()>;

    /// Load `set`/`delete` lines into the locked candidate
    async fn config_set(&self, lines: &[String]) -> SessionResult<()>;

    /// Commit the candidate with a log message, returning commit warnings
    async fn commit_conf(&self, log_message: &str) -> SessionResult<Vec<String>>;

    /// Close the session
    async fn close(&self) -> SessionResult<()>;
}

/// Opens sessions for the lifecycle operations.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a new session on the device
    async fn start_session(&self) -> SessionResult<Arc<dyn Session>>;

    /// Open a session writing to the fake-create set file, when configured
    fn set_file_session(&self) -> Option<Arc<dyn Session>> {
        None
    }
}

/// Factory handing out one shared session, typically a [`MemorySession`].
#[derive(Clone)]
pub struct SharedSessionFactory {
    session: Arc<dyn Session>,
    set_file: Option<Arc<dyn Session>>,
}

impl SharedSessionFactory {
    /// Share `session` between every operation
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            set_file: None,
        }
    }

    /// Also route fake-create operations to `session`
    pub fn with_set_file(mut self, session: Arc<dyn Session>) -> Self {
        self.set_file = Some(session);
        self
    }
}

#[async_trait]
impl SessionFactory for SharedSessionFactory {
    async fn start_session(&self) -> SessionResult<Arc<dyn Session>> {
        Ok(Arc::clone(&self.session))
    }

    fn set_file_session(&self) -> Option<Arc<dyn Session>> {
        self.set_file.clone()
    }
}

/// Iterate the statements of a `display set` output.
///
/// Blank lines and the XML wrapper tags are skipped, iteration stops at the
/// end tag, and the leading `set ` is removed.
///
/// ```rust
/// use junos_provider::junos::display_set_lines;
///
/// let out = "<configuration-output>\nset vlan-id 10\n\nset description \"x\"\n</configuration-output>\n";
/// let items: Vec<&str> = display_set_lines(out).collect();
/// assert_eq!(items, vec!["vlan-id 10", "description \"x\""]);
/// ```
pub fn display_set_lines(output: &str) -> impl Iterator<Item = &str> {
    output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .take_while(|line| !line.contains(XML_END_TAG_CONFIG_OUT))
        .filter(|line| !line.trim().is_empty() && !line.contains(XML_START_TAG_CONFIG_OUT))
        .filter_map(|line| {
            let line = line.trim();
            if line == SET_LS.trim_end() {
                None
            } else {
                Some(line.strip_prefix(SET_LS).unwrap_or(line))
            }
        })
}

/// Strip `prefix` from `item`.
pub fn cut_prefix<'a>(item: &'a str, prefix: &str) -> Option<&'a str> {
    item.strip_prefix(prefix)
}

/// First token of a statement, keeping a double-quoted token whole.
pub fn first_element(item: &str) -> &str {
    let item = item.trim_start();
    if let Some(rest) = item.strip_prefix('"') {
        match rest.find('"') {
            Some(end) => &item[..end + 2],
            None => item,
        }
    } else {
        item.split(' ').next().unwrap_or(item)
    }
}

/// Wrap `value` in double quotes.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

/// Remove surrounding double quotes.
pub fn trim_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Path of a configuration statement, without the leading verb.
pub(crate) fn statement_path(line: &str) -> Option<(&'static str, &str)> {
    if let Some(path) = line.strip_prefix(SET_W) {
        Some((SET_W, path.trim()))
    } else {
        line.strip_prefix(DELETE_W).map(|path| (DELETE_W, path.trim()))
    }
}

/// Check that every line is a `set` or `delete` statement with a path.
pub(crate) fn check_lines(lines: &[String]) -> SessionResult<()> {
    for line in lines {
        match statement_path(line) {
            Some((_, path)) if !path.is_empty() => {}
            _ => return Err(SessionError::InvalidLine(line.clone())),
        }
    }
    Ok(())
}
