//! Connection configuration for a session
//!
//! A config is built either from discrete fields (`SessionConfig::new` plus
//! setters) or from a mapping whose keys are the field names. Mapping entries
//! override the discrete values; unknown keys are rejected.

use crate::error::{Result, SessionError};
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Default MySQL port
pub const DEFAULT_PORT: u16 = 3306;

/// Configuration for a single database connection
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    /// Unix socket path, used instead of TCP when set
    pub socket: Option<PathBuf>,
    /// Applied with `SET NAMES` once connected
    pub charset: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            database: String::new(),
            port: DEFAULT_PORT,
            socket: None,
            charset: None,
        }
    }
}

/// Mapping form of a config: every recognized key is optional.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub port: Option<u16>,
    pub socket: Option<PathBuf>,
    pub charset: Option<String>,
}

impl ConfigOverrides {
    /// Build overrides from a TOML table, rejecting unknown keys
    pub fn from_table(table: toml::Table) -> Result<Self> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| SessionError::Configuration(e.message().to_string()))
    }

    /// Build overrides from a JSON object, rejecting unknown keys
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| SessionError::Configuration(e.to_string()))
    }
}

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn socket(mut self, socket: impl Into<PathBuf>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Apply every entry present in the mapping on top of this config
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(username) = overrides.username {
            self.username = username;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if let Some(database) = overrides.database {
            self.database = database;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if overrides.socket.is_some() {
            self.socket = overrides.socket;
        }
        if overrides.charset.is_some() {
            self.charset = overrides.charset;
        }
        self
    }

    /// Parse a TOML mapping and apply it over the defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let overrides: ConfigOverrides =
            toml::from_str(text).map_err(|e| SessionError::Configuration(e.message().to_string()))?;
        Ok(Self::default().with_overrides(overrides))
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = Self::from_toml_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Check the fields a connection attempt depends on
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SessionError::Configuration("host is required".to_string()));
        }

        if let Some(charset) = &self.charset {
            if !is_valid_charset(charset) {
                return Err(SessionError::Configuration(format!(
                    "charset {:?} is not a valid character set name",
                    charset
                )));
            }
        }

        Ok(())
    }
}

/// Charset names are spliced into `SET NAMES`, so only plain identifiers pass
fn is_valid_charset(charset: &str) -> bool {
    static CHARSET: OnceLock<Regex> = OnceLock::new();
    CHARSET
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("charset pattern is valid"))
        .is_match(charset)
}
