//! Configuration module for junos-provider
//!
//! Handles loading and merging provider configuration from multiple sources:
//! - Default values
//! - User configuration (~/.config/junos-provider/config.toml)
//! - Project configuration (./junos-provider.toml)
//! - An explicit file (`--config` or `JUNOS_PROVIDER_CONFIG`)
//! - Environment variables (`JUNOS_*`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::junos::CliOptions;

/// Transport used to reach the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// SSH exec channel
    #[default]
    Ssh,
    /// Local shell, when running on the device itself
    Local,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ssh" => Ok(Transport::Ssh),
            "local" => Ok(Transport::Local),
            other => Err(format!("unknown transport '{}'", other)),
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Device address
    pub host: Option<String>,
    /// SSH port
    pub port: u16,
    /// Login user
    pub username: String,
    /// Login password
    pub password: Option<String>,
    /// Private key file
    pub key_file: Option<PathBuf>,
    /// Private key passphrase
    pub key_pass: Option<String>,
    /// Try identities of the ssh agent
    pub use_agent: bool,
    /// SSH connect timeout in seconds
    pub ssh_timeout: u64,
    /// Transport to the device
    pub transport: Transport,
    /// Wrap commands in `cli -c`
    pub wrap_cli: bool,
    /// Milliseconds to wait before each command
    pub sleep_short: u64,
    /// Minutes for `commit confirmed`
    pub commit_confirmed: Option<u32>,
    /// Octal permission of the fake-create set file
    pub file_permission: String,
    /// Write set lines to this file instead of the device on create
    pub fake_create_setfile: Option<PathBuf>,
    /// Also write update lines to the set file
    pub fake_update_also: bool,
    /// Also write delete lines to the set file
    pub fake_delete_also: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 22,
            username: "netconf".to_string(),
            password: None,
            key_file: None,
            key_pass: None,
            use_agent: true,
            ssh_timeout: 30,
            transport: Transport::Ssh,
            wrap_cli: true,
            sleep_short: 100,
            commit_confirmed: None,
            file_permission: "0644".to_string(),
            fake_create_setfile: None,
            fake_update_also: false,
            fake_delete_also: false,
        }
    }
}

impl ProviderConfig {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = ProviderConfig::default();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(Error::ConfigFileNotFound(path.clone()).into());
            }
        }

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Get the list of configuration file paths to check, lowest priority first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = Vec::new();

        // User config
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("junos-provider").join("config.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("junos-provider.toml"));

        // Environment variable
        if let Ok(env_config) = std::env::var("JUNOS_PROVIDER_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: ProviderConfig = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one, `other` wins for non-default values
    fn merge(&self, other: ProviderConfig) -> ProviderConfig {
        let defaults = ProviderConfig::default();
        ProviderConfig {
            host: other.host.or_else(|| self.host.clone()),
            port: if other.port != defaults.port {
                other.port
            } else {
                self.port
            },
            username: if other.username != defaults.username {
                other.username
            } else {
                self.username.clone()
            },
            password: other.password.or_else(|| self.password.clone()),
            key_file: other.key_file.or_else(|| self.key_file.clone()),
            key_pass: other.key_pass.or_else(|| self.key_pass.clone()),
            use_agent: other.use_agent && self.use_agent,
            ssh_timeout: if other.ssh_timeout != defaults.ssh_timeout {
                other.ssh_timeout
            } else {
                self.ssh_timeout
            },
            transport: if other.transport != defaults.transport {
                other.transport
            } else {
                self.transport
            },
            wrap_cli: other.wrap_cli && self.wrap_cli,
            sleep_short: if other.sleep_short != defaults.sleep_short {
                other.sleep_short
            } else {
                self.sleep_short
            },
            commit_confirmed: other.commit_confirmed.or(self.commit_confirmed),
            file_permission: if other.file_permission != defaults.file_permission {
                other.file_permission
            } else {
                self.file_permission.clone()
            },
            fake_create_setfile: other
                .fake_create_setfile
                .or_else(|| self.fake_create_setfile.clone()),
            fake_update_also: other.fake_update_also || self.fake_update_also,
            fake_delete_also: other.fake_delete_also || self.fake_delete_also,
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("JUNOS_HOST") {
            self.host = Some(host);
        }
        if let Ok(port) = std::env::var("JUNOS_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid JUNOS_PORT: {}", port))?;
        }
        if let Ok(user) = std::env::var("JUNOS_USERNAME") {
            self.username = user;
        }
        if let Ok(password) = std::env::var("JUNOS_PASSWORD") {
            self.password = Some(password);
        }
        if let Ok(file) = std::env::var("JUNOS_KEYFILE") {
            self.key_file = Some(PathBuf::from(file));
        }
        if let Ok(pass) = std::env::var("JUNOS_KEYPASS") {
            self.key_pass = Some(pass);
        }
        if let Ok(transport) = std::env::var("JUNOS_TRANSPORT") {
            self.transport = transport.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(sleep) = std::env::var("JUNOS_SLEEP_SHORT") {
            self.sleep_short = sleep
                .parse()
                .with_context(|| format!("Invalid JUNOS_SLEEP_SHORT: {}", sleep))?;
        }
        if let Ok(timeout) = std::env::var("JUNOS_SSH_TIMEOUT") {
            self.ssh_timeout = timeout
                .parse()
                .with_context(|| format!("Invalid JUNOS_SSH_TIMEOUT: {}", timeout))?;
        }
        if let Ok(minutes) = std::env::var("JUNOS_COMMIT_CONFIRMED") {
            self.commit_confirmed = Some(
                minutes
                    .parse()
                    .with_context(|| format!("Invalid JUNOS_COMMIT_CONFIRMED: {}", minutes))?,
            );
        }
        if let Ok(perm) = std::env::var("JUNOS_FILE_PERMISSION") {
            self.file_permission = perm;
        }
        if let Ok(file) = std::env::var("JUNOS_FAKECREATE_SETFILE") {
            self.fake_create_setfile = Some(PathBuf::from(file));
        }
        if let Ok(v) = std::env::var("JUNOS_FAKEUPDATE_ALSO") {
            self.fake_update_also = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("JUNOS_FAKEDELETE_ALSO") {
            self.fake_delete_also = parse_bool(&v);
        }
        Ok(())
    }

    /// Check value ranges and option combinations
    pub fn validate(&self) -> crate::Result<()> {
        if self.port == 0 {
            return Err(Error::InvalidConfig("port must be between 1 and 65535".into()));
        }
        if let Some(minutes) = self.commit_confirmed {
            if !(1..=65535).contains(&minutes) {
                return Err(Error::InvalidConfig(
                    "commit_confirmed must be between 1 and 65535".into(),
                ));
            }
        }
        if (self.fake_update_also || self.fake_delete_also) && self.fake_create_setfile.is_none()
        {
            return Err(Error::InvalidConfig(
                "fake_update_also and fake_delete_also need fake_create_setfile".into(),
            ));
        }
        self.permission()?;
        if self.transport == Transport::Ssh
            && self.fake_create_setfile.is_none()
            && self.host.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::InvalidConfig("host is required for ssh transport".into()));
        }
        Ok(())
    }

    /// Set file permission as a mode
    pub fn permission(&self) -> crate::Result<u32> {
        let digits = self
            .file_permission
            .strip_prefix("0o")
            .unwrap_or(&self.file_permission);
        match u32::from_str_radix(digits, 8) {
            Ok(mode) if mode <= 0o777 => Ok(mode),
            _ => Err(Error::InvalidConfig(format!(
                "file_permission '{}' is not an octal mode",
                self.file_permission
            ))),
        }
    }

    /// Options for CLI sessions
    pub fn cli_options(&self) -> CliOptions {
        CliOptions {
            wrap_cli: self.wrap_cli,
            sleep_short: Duration::from_millis(self.sleep_short),
            commit_confirmed: self.commit_confirmed,
            command_timeout: None,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "t" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.port, 22);
        assert_eq!(config.username, "netconf");
        assert_eq!(config.transport, Transport::Ssh);
        assert_eq!(config.permission().unwrap(), 0o644);
        assert!(config.wrap_cli);
    }

    #[test]
    fn test_config_merge() {
        let base = ProviderConfig {
            host: Some("r1".into()),
            ..ProviderConfig::default()
        };
        let other = ProviderConfig {
            port: 830,
            ..ProviderConfig::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.port, 830);
        assert_eq!(merged.host.as_deref(), Some("r1"));
    }

    #[test]
    fn test_validate() {
        let mut config = ProviderConfig {
            host: Some("r1".into()),
            ..ProviderConfig::default()
        };
        assert!(config.validate().is_ok());

        config.commit_confirmed = Some(0);
        assert!(config.validate().is_err());
        config.commit_confirmed = Some(5);

        config.fake_delete_also = true;
        assert!(config.validate().is_err());
        config.fake_create_setfile = Some(PathBuf::from("/tmp/junos.set"));
        assert!(config.validate().is_ok());

        config.file_permission = "0999".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_host_required_for_ssh() {
        assert!(ProviderConfig::default().validate().is_err());
        let local = ProviderConfig {
            transport: Transport::Local,
            ..ProviderConfig::default()
        };
        assert!(local.validate().is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }
}
