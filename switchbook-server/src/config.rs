//! Server configuration.
//!
//! Each setting is resolved in priority order: a `SWITCHBOOK_*` environment
//! variable, then `~/.config/switchbook/server.toml`, then a built-in default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 30;
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_MAIL_FROM: &str = "Switchbook <noreply@localhost>";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Where a setting's value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from an environment variable.
    EnvVar(&'static str),
    /// Loaded from the config file.
    ConfigFile,
    /// Built-in default.
    Default,
    /// Not set anywhere.
    Missing,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// One resolved setting, as reported by `switchbook config show`.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: Option<String>,
    pub source: ConfigSource,
    pub secret: bool,
}

/// Outgoing mail server. Without one, emails are logged instead of sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: String,
    pub database: PathBuf,
    /// Base URL used in links inside emails.
    pub public_url: String,
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    pub secure_cookies: bool,
    pub smtp: Option<SmtpConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database: default_database_path(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            secure_cookies: false,
            smtp: None,
        }
    }
}

// ── Config file ─────────────────────────────────────────────────────────────

/// TOML config file format.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub smtp: SmtpSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub public_url: Option<String>,
    pub session_ttl_hours: Option<i64>,
    pub secure_cookies: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SmtpSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read `path`. A missing file is not an error.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&text).map(Some).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn values(&self) -> HashMap<&'static str, String> {
        let s = &self.server;
        let m = &self.smtp;
        [
            ("server.bind", s.bind.clone()),
            ("server.database", s.database.as_ref().map(|p| p.display().to_string())),
            ("server.public_url", s.public_url.clone()),
            ("server.session_ttl_hours", s.session_ttl_hours.map(|v| v.to_string())),
            ("server.secure_cookies", s.secure_cookies.map(|v| v.to_string())),
            ("smtp.host", m.host.clone()),
            ("smtp.port", m.port.map(|v| v.to_string())),
            ("smtp.username", m.username.clone()),
            ("smtp.password", m.password.clone()),
            ("smtp.from", m.from.clone()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}

/// Return the path to the server config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("switchbook").join("server.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("switchbook").join("switchbook.db"))
        .unwrap_or_else(|| PathBuf::from("switchbook.db"))
}

// ── Resolution ──────────────────────────────────────────────────────────────

struct Resolver<'a> {
    file: HashMap<&'static str, String>,
    env: &'a dyn Fn(&str) -> Option<String>,
    entries: Vec<ConfigEntry>,
}

impl Resolver<'_> {
    fn get(
        &mut self,
        key: &'static str,
        var: &'static str,
        default: Option<String>,
        secret: bool,
    ) -> Option<String> {
        let (value, source) = if let Some(v) = (self.env)(var).filter(|v| !v.trim().is_empty()) {
            (Some(v), ConfigSource::EnvVar(var))
        } else if let Some(v) = self.file.remove(key) {
            (Some(v), ConfigSource::ConfigFile)
        } else if let Some(v) = default {
            (Some(v), ConfigSource::Default)
        } else {
            (None, ConfigSource::Missing)
        };
        self.entries.push(ConfigEntry {
            key,
            value: value.clone(),
            source,
            secret,
        });
        value
    }

    fn parse<T: std::str::FromStr>(
        &mut self,
        key: &'static str,
        var: &'static str,
        default: T,
    ) -> Result<T, ConfigError>
    where
        T: ToString,
    {
        match self.get(key, var, Some(default.to_string()), false) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key,
                value: raw.clone(),
            }),
            None => Ok(default),
        }
    }
}

impl ServerConfig {
    /// Load from the process environment and the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::load_with_sources()?.0)
    }

    /// Like [`load`](Self::load), also reporting where each value came from.
    pub fn load_with_sources() -> Result<(Self, Vec<ConfigEntry>), ConfigError> {
        let file = match config_path() {
            Some(path) => ConfigFile::read(&path)?,
            None => None,
        };
        Self::resolve(file.as_ref(), &|var| std::env::var(var).ok())
    }

    /// Resolve every setting from `env`, then `file`, then defaults.
    pub fn resolve(
        file: Option<&ConfigFile>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<(Self, Vec<ConfigEntry>), ConfigError> {
        let defaults = Self::default();
        let mut r = Resolver {
            file: file.map(ConfigFile::values).unwrap_or_default(),
            env,
            entries: Vec::new(),
        };

        let bind = r
            .get("server.bind", "SWITCHBOOK_BIND", Some(defaults.bind), false)
            .unwrap_or_default();
        let database = r
            .get(
                "server.database",
                "SWITCHBOOK_DATABASE",
                Some(defaults.database.display().to_string()),
                false,
            )
            .map(PathBuf::from)
            .unwrap_or_default();
        let public_url = r
            .get("server.public_url", "SWITCHBOOK_PUBLIC_URL", Some(defaults.public_url), false)
            .unwrap_or_default();
        let session_ttl_hours: i64 = r.parse(
            "server.session_ttl_hours",
            "SWITCHBOOK_SESSION_TTL_HOURS",
            DEFAULT_SESSION_TTL_HOURS,
        )?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "server.session_ttl_hours",
                value: session_ttl_hours.to_string(),
            });
        }
        let secure_cookies: bool =
            r.parse("server.secure_cookies", "SWITCHBOOK_SECURE_COOKIES", false)?;

        let host = r.get("smtp.host", "SWITCHBOOK_SMTP_HOST", None, false);
        let port: u16 = r.parse("smtp.port", "SWITCHBOOK_SMTP_PORT", DEFAULT_SMTP_PORT)?;
        let username = r.get("smtp.username", "SWITCHBOOK_SMTP_USERNAME", None, false);
        let password = r.get("smtp.password", "SWITCHBOOK_SMTP_PASSWORD", None, true);
        let from = r
            .get("smtp.from", "SWITCHBOOK_SMTP_FROM", Some(DEFAULT_MAIL_FROM.to_string()), false)
            .unwrap_or_default();

        let config = Self {
            bind,
            database,
            public_url: public_url.trim_end_matches('/').to_string(),
            session_ttl_hours,
            secure_cookies,
            smtp: host.map(|host| SmtpConfig {
                host,
                port,
                username,
                password,
                from,
            }),
        };
        Ok((config, r.entries))
    }

    /// Apply command-line overrides on top of the resolved values.
    pub fn with_overrides(mut self, database: Option<PathBuf>, bind: Option<String>) -> Self {
        if let Some(db) = database {
            self.database = db;
        }
        if let Some(bind) = bind {
            self.bind = bind;
        }
        self
    }
}
