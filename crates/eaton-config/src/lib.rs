//! Configuration store for the Eaton PDU exporter.
//!
//! A TOML file plus an environment overlay, merged with figment and loaded
//! once at start-up. Device credentials live in `["connection:<name>"]`
//! tables; [`ConfigStore::resolve`] turns a scrape's `target` parameter
//! into a [`Target`]. The store is read-only after loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use eaton_api::{Credentials, DEFAULT_BASE_PATH};

/// Prefix of every target table name.
pub const CONNECTION_PREFIX: &str = "connection:";

/// Environment variable prefix for overrides (`__` separates nesting levels).
pub const ENV_PREFIX: &str = "EATON_EXPORTER_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("connection not found in config: {target}")]
    TargetNotFound { target: String },

    #[error("connection {target} is missing the {field} key")]
    MissingCredentialField { target: String, field: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Device API settings shared by every target.
    #[serde(default)]
    pub exporter: ExporterSettings,

    /// Per-probe field name overrides.
    #[serde(default)]
    pub probes: ProbeSettings,

    /// Every other table. Only `connection:<name>` tables are targets.
    #[serde(flatten)]
    pub sections: BTreeMap<String, Connection>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExporterSettings {
    /// REST root on the management card.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Per-request timeout in seconds for every call to a device.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            timeout: default_timeout(),
        }
    }
}

impl ExporterSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "exporter.timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(())
    }
}

/// Env overrides only reach the settings tables. Target tables are named
/// `connection:<name>`, which no variable name can spell.
fn is_settings_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("exporter__") || key.starts_with("probes__")
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.into()
}
fn default_timeout() -> u64 {
    10
}

/// JSON keys the probes read that differ between firmware revisions.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProbeSettings {
    #[serde(default)]
    pub input: InputProbeSettings,

    #[serde(default)]
    pub branch: BranchProbeSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InputProbeSettings {
    /// Key of the line-to-line voltage inside a phase's `measures`.
    #[serde(default = "default_phase_voltage_field")]
    pub phase_voltage_field: String,
}

impl Default for InputProbeSettings {
    fn default() -> Self {
        Self {
            phase_voltage_field: default_phase_voltage_field(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BranchProbeSettings {
    /// Key of the voltage inside a branch's `measures`.
    /// Older cards report `voltage`, newer ones `voltageLL`.
    #[serde(default = "default_branch_voltage_field")]
    pub voltage_field: String,
}

impl Default for BranchProbeSettings {
    fn default() -> Self {
        Self {
            voltage_field: default_branch_voltage_field(),
        }
    }
}

fn default_phase_voltage_field() -> String {
    "voltageLL".into()
}
fn default_branch_voltage_field() -> String {
    "voltage".into()
}

/// A `["connection:<name>"]` table as written. Every key is optional
/// here so that a missing one can be reported by name.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Connection {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `https` unless set. `http` is accepted for lab setups.
    pub scheme: Option<String>,
}

// ── Resolved target ─────────────────────────────────────────────────

/// Everything needed to talk to one PDU.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub host: String,
    pub base_url: Url,
    pub credentials: Credentials,
}

// ── Store ───────────────────────────────────────────────────────────

/// Loaded configuration, shared read-only by request handlers.
#[derive(Debug, Default)]
pub struct ConfigStore {
    config: Config,
}

impl ConfigStore {
    /// Load `path`, then apply `EATON_EXPORTER_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .filter(|key| is_settings_key(key.as_str()))
                    .split("__"),
            );

        let config: Config = figment.extract()?;
        config.exporter.validate()?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn exporter(&self) -> &ExporterSettings {
        &self.config.exporter
    }

    pub fn probes(&self) -> &ProbeSettings {
        &self.config.probes
    }

    /// Names of all configured targets, sorted.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.config
            .sections
            .keys()
            .filter_map(|key| key.strip_prefix(CONNECTION_PREFIX))
    }

    /// Tables that are neither settings nor `connection:` targets.
    /// Usually a typo; they are otherwise ignored.
    pub fn unknown_sections(&self) -> impl Iterator<Item = &str> {
        self.config
            .sections
            .keys()
            .filter(|key| !key.starts_with(CONNECTION_PREFIX))
            .map(String::as_str)
    }

    /// Look up `connection:<target>` and validate its credentials.
    pub fn resolve(&self, target: &str) -> Result<Target, ConfigError> {
        let section = self
            .config
            .sections
            .get(&format!("{CONNECTION_PREFIX}{target}"))
            .ok_or_else(|| ConfigError::TargetNotFound {
                target: target.into(),
            })?;

        let require = |value: Option<&str>, field: &'static str| {
            value
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| ConfigError::MissingCredentialField {
                    target: target.into(),
                    field,
                })
        };

        let host = require(section.host.as_deref(), "host")?;
        let username = require(section.username.as_deref(), "username")?;
        let password = require(section.password.as_deref(), "password")?;

        let scheme = section.scheme.as_deref().unwrap_or("https");
        if scheme != "https" && scheme != "http" {
            return Err(ConfigError::Validation {
                field: "scheme".into(),
                reason: format!("expected 'https' or 'http' for {target}, got '{scheme}'"),
            });
        }

        let base_url =
            Url::parse(&format!("{scheme}://{host}")).map_err(|_| ConfigError::Validation {
                field: "host".into(),
                reason: format!("invalid host for {target}: {host}"),
            })?;

        Ok(Target {
            name: target.into(),
            host,
            base_url,
            credentials: Credentials::new(username, SecretString::from(password)),
        })
    }
}
