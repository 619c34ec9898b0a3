//! Configuration management for formrelay.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "formrelay";

/// Default submission log file name.
const SUBMISSIONS_FILE_NAME: &str = "submissions.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FORMRELAY_`, sections split
///    with `__`, e.g. `FORMRELAY_SMTP__PASSWORD`)
/// 2. TOML config file at `~/.config/formrelay/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// SMTP transport configuration.
    pub smtp: SmtpConfig,
    /// Mail content and addressing configuration.
    pub mail: MailConfig,
    /// Submission log configuration.
    pub storage: StorageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:3000`.
    pub bind: String,
}

/// SMTP transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Username for authentication, if required.
    pub username: Option<String>,
    /// Password for authentication, if required.
    pub password: Option<String>,
    /// Use implicit TLS (SMTPS) instead of STARTTLS.
    pub implicit_tls: bool,
    /// Accept invalid TLS certificates. For test setups only.
    pub accept_invalid_certs: bool,
    /// Connection timeout in seconds.
    pub timeout_secs: u64,
}

/// Mail content and addressing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Display name used in the `From` header.
    pub from_name: String,
    /// Address used in the `From` header.
    pub from_address: String,
    /// Address that receives support notifications.
    /// Defaults to `from_address` when unset.
    pub support_address: Option<String>,
}

/// Submission log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the submission log file.
    /// Defaults to `~/.local/share/formrelay/submissions.json`
    pub submissions_path: Option<PathBuf>,
    /// Maximum number of records returned by the view endpoint.
    pub view_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: None,
            password: None,
            implicit_tls: false,
            accept_invalid_certs: false,
            timeout_secs: 30,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_name: "Formrelay".to_string(),
            from_address: String::new(),
            support_address: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FORMRELAY_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("FORMRELAY_").split("__"));

        let config: Config = figment.extract()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration for serving.
    ///
    /// Settings that only matter once mail is actually sent (host, from
    /// address) are checked here rather than at load time, so commands like
    /// `config show` still work on a fresh machine.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.smtp.host.trim().is_empty() {
            return Err(Error::config_validation("smtp.host must be set"));
        }

        if self.smtp.port == 0 {
            return Err(Error::config_validation("smtp.port must not be 0"));
        }

        if !self.mail.from_address.contains('@') {
            return Err(Error::config_validation(format!(
                "mail.from_address '{}' is not an email address",
                self.mail.from_address
            )));
        }

        if let Some(support) = &self.mail.support_address {
            if !support.contains('@') {
                return Err(Error::config_validation(format!(
                    "mail.support_address '{support}' is not an email address"
                )));
            }
        }

        if self.storage.view_limit == 0 {
            return Err(Error::config_validation(
                "storage.view_limit must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Get the submission log path, resolving defaults if not set.
    #[must_use]
    pub fn submissions_path(&self) -> PathBuf {
        self.storage
            .submissions_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SUBMISSIONS_FILE_NAME))
    }

    /// Get the address that receives support notifications.
    #[must_use]
    pub fn support_address(&self) -> &str {
        self.mail
            .support_address
            .as_deref()
            .unwrap_or(&self.mail.from_address)
    }

    /// Get the `From` header value, `"Name <address>"`.
    #[must_use]
    pub fn from_mailbox(&self) -> String {
        format!("{} <{}>", self.mail.from_name, self.mail.from_address)
    }

    /// Get the SMTP connection timeout as a Duration.
    #[must_use]
    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp.timeout_secs)
    }
}

impl StorageConfig {
    /// The view limit the original deployment shipped with.
    pub const DEFAULT_VIEW_LIMIT: usize = 20;
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            submissions_path: None, // Will be resolved to default at runtime
            view_limit: Self::DEFAULT_VIEW_LIMIT,
        }
    }
}
