//! Russh connection module
//!
//! SSH connectivity to Junos devices using the russh crate. Each command runs
//! on its own exec channel of a single authenticated SSH session.

use async_trait::async_trait;
use russh::client::{Handle, Handler};
use russh::keys::key::PublicKey;
use russh::keys::load_secret_key;
use russh::ChannelMsg;
use russh_keys::agent::client::AgentClient;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use super::{
    CommandResult, Connection, ConnectionError, ConnectionResult, ExecuteOptions, RusshError,
};

/// Default SSH port for Junos devices
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Result of host key verification
#[derive(Debug, Clone, PartialEq)]
enum HostKeyStatus {
    /// Key matches known_hosts entry
    Verified,
    /// Host not found in known_hosts (first connection)
    Unknown,
    /// Key doesn't match known_hosts entry
    Mismatch,
}

/// A parsed entry from known_hosts file
#[derive(Debug, Clone)]
struct KnownHostEntry {
    /// Hostnames/patterns this entry applies to
    patterns: Vec<String>,
    /// The public key
    key: PublicKey,
}

/// Client handler for russh with host key verification
struct ClientHandler {
    host: String,
    port: u16,
    known_hosts: Vec<KnownHostEntry>,
    /// Whether to accept hosts missing from known_hosts
    accept_unknown: bool,
}

impl ClientHandler {
    fn new(host: &str, port: u16, accept_unknown: bool) -> Self {
        Self {
            host: host.to_string(),
            port,
            known_hosts: Self::load_known_hosts(),
            accept_unknown,
        }
    }

    /// Load and parse ~/.ssh/known_hosts
    fn load_known_hosts() -> Vec<KnownHostEntry> {
        let path = match dirs::home_dir().map(|h| h.join(".ssh").join("known_hosts")) {
            Some(p) if p.exists() => p,
            _ => return Vec::new(),
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "Failed to read known_hosts file");
                return Vec::new();
            }
        };

        let entries: Vec<KnownHostEntry> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(Self::parse_known_hosts_line)
            .collect();

        debug!(entry_count = %entries.len(), "Loaded known_hosts entries");
        entries
    }

    /// Parse `hostname[,hostname...] keytype base64key [comment]`
    fn parse_known_hosts_line(line: &str) -> Option<KnownHostEntry> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return None;
        }

        let patterns = parts[0].split(',').map(str::to_string).collect();
        match russh::keys::parse_public_key_base64(parts[2]) {
            Ok(key) => Some(KnownHostEntry { patterns, key }),
            Err(_) => {
                trace!(key_type = %parts[1], "Failed to parse key, skipping entry");
                None
            }
        }
    }

    fn pattern_matches(pattern: &str, host: &str, port: u16) -> bool {
        // [host]:port form
        if let Some(rest) = pattern.strip_prefix('[') {
            if let Some(end_bracket) = rest.find(']') {
                let pattern_port = rest
                    .get(end_bracket + 2..)
                    .and_then(|p| p.parse::<u16>().ok())
                    .unwrap_or(DEFAULT_SSH_PORT);
                return &rest[..end_bracket] == host && pattern_port == port;
            }
        }

        port == DEFAULT_SSH_PORT && pattern == host
    }

    fn verify_host_key(&self, server_key: &PublicKey) -> HostKeyStatus {
        for entry in &self.known_hosts {
            if entry
                .patterns
                .iter()
                .any(|p| Self::pattern_matches(p, &self.host, self.port))
            {
                if entry.key.fingerprint() == server_key.fingerprint() {
                    return HostKeyStatus::Verified;
                }
                return HostKeyStatus::Mismatch;
            }
        }
        HostKeyStatus::Unknown
    }
}

#[async_trait]
impl Handler for ClientHandler {
    type Error = RusshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.verify_host_key(server_public_key) {
            HostKeyStatus::Verified => {
                debug!(host = %self.host, "Host key verified against known_hosts");
                Ok(true)
            }
            HostKeyStatus::Unknown if self.accept_unknown => {
                warn!(host = %self.host, "Host not found in known_hosts, accepting");
                Ok(true)
            }
            HostKeyStatus::Unknown => {
                warn!(host = %self.host, "Host not found in known_hosts, rejecting");
                Ok(false)
            }
            HostKeyStatus::Mismatch => {
                warn!(
                    host = %self.host,
                    "HOST KEY VERIFICATION FAILED! Server key does not match known_hosts entry."
                );
                Ok(false)
            }
        }
    }
}

/// Authentication material for an SSH connection
#[derive(Debug, Clone, Default)]
pub struct SshAuth {
    /// Password for password authentication
    pub password: Option<String>,
    /// Private key file
    pub key_file: Option<PathBuf>,
    /// Passphrase for the private key
    pub key_pass: Option<String>,
    /// Try identities from the ssh agent
    pub use_agent: bool,
}

/// SSH connection to a Junos device
pub struct RusshConnection {
    identifier: String,
    /// Read lock for channel opens, write lock only on close
    handle: Arc<RwLock<Option<Handle<ClientHandler>>>>,
    connected: Arc<AtomicBool>,
    created_at: Instant,
    commands_executed: AtomicU64,
}

impl RusshConnection {
    /// Connect and authenticate to `host:port` as `user`
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        auth: &SshAuth,
        timeout: Duration,
    ) -> ConnectionResult<Self> {
        debug!(host = %host, port = %port, user = %user, "Connecting via SSH (russh)");

        let mut config = russh::client::Config::default();
        config.inactivity_timeout = Some(timeout);
        let config = Arc::new(config);

        let addr = format!("{}:{}", host, port);
        let socket = tokio::time::timeout(timeout, tokio::net::TcpStream::connect(&addr))
            .await
            .map_err(|_| ConnectionError::Timeout(timeout.as_secs()))?
            .map_err(|e| {
                ConnectionError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
            })?;
        socket.set_nodelay(true).map_err(|e| {
            ConnectionError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
        })?;

        let handler = ClientHandler::new(host, port, true);
        let mut session = russh::client::connect_stream(config, socket, handler)
            .await
            .map_err(|e| {
                ConnectionError::ConnectionFailed(format!("SSH handshake failed: {}", e))
            })?;

        Self::authenticate(&mut session, user, auth).await?;

        let identifier = format!("{}@{}:{}", user, host, port);
        debug!(identifier = %identifier, "SSH connection established");

        Ok(Self {
            identifier,
            handle: Arc::new(RwLock::new(Some(session))),
            connected: Arc::new(AtomicBool::new(true)),
            created_at: Instant::now(),
            commands_executed: AtomicU64::new(0),
        })
    }

    /// Key file first, then agent, then password
    async fn authenticate(
        session: &mut Handle<ClientHandler>,
        user: &str,
        auth: &SshAuth,
    ) -> ConnectionResult<()> {
        if let Some(key_file) = &auth.key_file {
            match Self::try_key_auth(session, user, key_file, auth.key_pass.as_deref()).await {
                Ok(()) => {
                    debug!(key = %key_file.display(), "Authenticated using key");
                    return Ok(());
                }
                Err(e) => debug!(error = %e, "Key authentication failed"),
            }
        }

        if auth.use_agent && Self::try_agent_auth(session, user).await.is_ok() {
            debug!("Authenticated using SSH agent");
            return Ok(());
        }

        if let Some(password) = &auth.password {
            let authenticated = session
                .authenticate_password(user, password)
                .await
                .map_err(|e| {
                    ConnectionError::AuthenticationFailed(format!(
                        "Password authentication failed: {}",
                        e
                    ))
                })?;
            if authenticated {
                debug!("Authenticated using password");
                return Ok(());
            }
        }

        Err(ConnectionError::AuthenticationFailed(
            "All authentication methods failed".to_string(),
        ))
    }

    async fn try_agent_auth(
        session: &mut Handle<ClientHandler>,
        user: &str,
    ) -> ConnectionResult<()> {
        let mut agent = AgentClient::connect_env().await.map_err(|e| {
            ConnectionError::AuthenticationFailed(format!("Failed to connect to SSH agent: {}", e))
        })?;

        let identities = agent.request_identities().await.map_err(|e| {
            ConnectionError::AuthenticationFailed(format!("Failed to get agent identities: {}", e))
        })?;

        for identity in identities {
            let (returned_agent, result) = session
                .authenticate_future(user, identity.clone(), agent)
                .await;
            agent = returned_agent;

            match result {
                Ok(true) => return Ok(()),
                Ok(false) => trace!("Identity rejected, trying next"),
                Err(e) => trace!(error = %e, "Agent authentication attempt failed"),
            }
        }

        Err(ConnectionError::AuthenticationFailed(
            "All SSH agent identities rejected".to_string(),
        ))
    }

    async fn try_key_auth(
        session: &mut Handle<ClientHandler>,
        user: &str,
        key_path: &Path,
        passphrase: Option<&str>,
    ) -> ConnectionResult<()> {
        if !key_path.exists() {
            return Err(ConnectionError::AuthenticationFailed(format!(
                "Key file not found: {}",
                key_path.display()
            )));
        }

        let key_pair = load_secret_key(key_path, passphrase).map_err(|e| {
            ConnectionError::AuthenticationFailed(format!(
                "Failed to load key {}: {}",
                key_path.display(),
                e
            ))
        })?;

        let authenticated = session
            .authenticate_publickey(user, Arc::new(key_pair))
            .await
            .map_err(|e| {
                ConnectionError::AuthenticationFailed(format!(
                    "Key authentication failed for {}: {}",
                    key_path.display(),
                    e
                ))
            })?;

        if authenticated {
            Ok(())
        } else {
            Err(ConnectionError::AuthenticationFailed(
                "Key authentication failed".to_string(),
            ))
        }
    }

    fn build_command_with_env(command: &str, options: &ExecuteOptions) -> String {
        if options.env.is_empty() {
            return command.to_string();
        }
        let mut env: Vec<String> = options
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, shell_words::quote(v)))
            .collect();
        env.sort();
        format!("env {} {}", env.join(" "), command)
    }
}

#[async_trait]
impl Connection for RusshConnection {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn is_alive(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.handle.read().await.is_some()
    }

    async fn execute(
        &self,
        command: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        let options = options.unwrap_or_default();
        let full_command = Self::build_command_with_env(command, &options);

        trace!(command = %full_command, "Executing remote command");
        self.commands_executed.fetch_add(1, Ordering::Relaxed);

        let execute_future = async {
            let handle_guard = self.handle.read().await;
            let handle: &Handle<ClientHandler> = handle_guard
                .as_ref()
                .ok_or(ConnectionError::ConnectionClosed)?;

            let mut channel = handle.channel_open_session().await.map_err(|e| {
                ConnectionError::ExecutionFailed(format!("Failed to open channel: {}", e))
            })?;
            drop(handle_guard);

            channel.exec(true, full_command).await.map_err(|e| {
                ConnectionError::ExecutionFailed(format!("Failed to execute command: {}", e))
            })?;

            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let mut exit_code = None;

            while let Some(msg) = channel.wait().await {
                match msg {
                    ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                    // Extended data type 1 is stderr
                    ChannelMsg::ExtendedData { ref data, ext } if ext == 1 => {
                        stderr.extend_from_slice(data);
                    }
                    ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                    ChannelMsg::Close => break,
                    _ => {}
                }
            }

            let _ = channel.eof().await;

            let exit_code: i32 = exit_code.map(|e| e as i32).unwrap_or(i32::MAX);
            let stdout = String::from_utf8_lossy(&stdout).to_string();
            let stderr = String::from_utf8_lossy(&stderr).to_string();

            trace!(exit_code = %exit_code, "Command completed");

            if exit_code == 0 {
                Ok(CommandResult::success(stdout, stderr))
            } else {
                Ok(CommandResult::failure(exit_code, stdout, stderr))
            }
        };

        if let Some(timeout_secs) = options.timeout {
            match tokio::time::timeout(Duration::from_secs(timeout_secs), execute_future).await {
                Ok(result) => result,
                Err(_) => Err(ConnectionError::Timeout(timeout_secs)),
            }
        } else {
            execute_future.await
        }
    }

    async fn close(&self) -> ConnectionResult<()> {
        debug!(
            identifier = %self.identifier,
            uptime_secs = %self.created_at.elapsed().as_secs(),
            commands_executed = %self.commands_executed.load(Ordering::Relaxed),
            "Closing SSH connection"
        );

        self.connected.store(false, Ordering::SeqCst);
        let handle = self.handle.write().await.take();

        if let Some(handle) = handle {
            let _ = handle
                .disconnect(
                    russh::Disconnect::ByApplication,
                    "Connection closed by client",
                    "en",
                )
                .await;
        }

        Ok(())
    }
}

impl std::fmt::Debug for RusshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RusshConnection")
            .field("identifier", &self.identifier)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish()
    }
}

/// Builder for [`RusshConnection`]
#[derive(Debug, Clone)]
pub struct RusshConnectionBuilder {
    host: String,
    port: u16,
    user: String,
    auth: SshAuth,
    timeout: u64,
}

impl RusshConnectionBuilder {
    /// Create a new builder for `host`
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            user: std::env::var("USER").unwrap_or_else(|_| "root".to_string()),
            auth: SshAuth {
                use_agent: true,
                ..SshAuth::default()
            },
            timeout: 30,
        }
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth.password = Some(password.into());
        self
    }

    /// Set the private key path and its optional passphrase
    pub fn private_key(mut self, path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        self.auth.key_file = Some(path.into());
        self.auth.key_pass = passphrase;
        self
    }

    /// Set the connection timeout in seconds
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build and connect
    pub async fn connect(self) -> ConnectionResult<RusshConnection> {
        RusshConnection::connect(
            &self.host,
            self.port,
            &self.user,
            &self.auth,
            Duration::from_secs(self.timeout),
        )
        .await
    }
}
