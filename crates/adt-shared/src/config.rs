//! # Configuration
//!
//! Layered configuration for connections, per-step timeouts and workflow
//! policy. Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a TOML file (`adt.toml` in the working directory, or an explicit path)
//! 3. `ADT_`-prefixed environment variables, with `__` separating sections
//!    (`ADT_CONNECTION__BASE_URL`, `ADT_TIMEOUTS__UPDATE`)

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::errors::{AdtError, AdtResult};
use crate::types::StepName;

const DEFAULT_CONFIG_FILE: &str = "adt.toml";
const ENV_PREFIX: &str = "ADT";

/// Root configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdtConfig {
    pub connection: ConnectionConfig,
    pub timeouts: TimeoutConfig,
    pub workflow: WorkflowPolicyConfig,
    pub logging: LoggingConfig,
}

impl AdtConfig {
    /// Load from `./adt.toml` (if present) and the environment.
    pub fn load() -> AdtResult<Self> {
        Self::load_from(None)
    }

    /// Load from an explicit file (required when given) and the environment.
    pub fn load_from(path: Option<&Path>) -> AdtResult<Self> {
        let file_source = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let config: AdtConfig = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(
            base_url = config.connection.base_url.as_deref().unwrap_or("<unset>"),
            check_policy = ?config.workflow.check_policy,
            "Loaded ADT configuration"
        );
        Ok(config)
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml_str(toml: &str) -> AdtResult<Self> {
        let config: AdtConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AdtResult<()> {
        if let Some(url) = &self.connection.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AdtError::config_error(format!(
                    "connection.base_url must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if let Some(client) = &self.connection.client {
            if client.len() != 3 || !client.chars().all(|c| c.is_ascii_digit()) {
                return Err(AdtError::config_error(format!(
                    "connection.client must be a three digit client number, got '{client}'"
                )));
            }
        }
        self.timeouts.validate()
    }
}

/// Remote endpoint and credentials.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub base_url: Option<String>,
    /// Logon client (`sap-client`)
    pub client: Option<String>,
    pub username: Option<String>,
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    /// Logon language (`sap-language`)
    pub language: Option<String>,
    pub insecure_tls: bool,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// Per-step timeouts in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect: u64,
    pub validate: u64,
    pub create: u64,
    pub lock: u64,
    pub update: u64,
    pub check: u64,
    pub unlock: u64,
    pub activate: u64,
    pub delete: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: 15_000,
            validate: 15_000,
            create: 30_000,
            lock: 15_000,
            update: 60_000,
            check: 60_000,
            unlock: 15_000,
            activate: 120_000,
            delete: 30_000,
        }
    }
}

impl TimeoutConfig {
    /// Timeout budget for one remote call of `step`.
    pub fn for_step(&self, step: StepName) -> Duration {
        let millis = match step {
            StepName::Validate => self.validate,
            StepName::Create => self.create,
            StepName::Lock => self.lock,
            StepName::Update => self.update,
            StepName::Check => self.check,
            StepName::Unlock => self.unlock,
            StepName::Activate => self.activate,
            StepName::Delete => self.delete,
        };
        Duration::from_millis(millis)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect)
    }

    fn validate(&self) -> AdtResult<()> {
        for step in StepName::ALL {
            if self.for_step(step).is_zero() {
                return Err(AdtError::config_error(format!(
                    "timeouts.{step} must be greater than zero"
                )));
            }
        }
        if self.connect == 0 {
            return Err(AdtError::config_error("timeouts.connect must be greater than zero"));
        }
        Ok(())
    }
}

/// What a Check step with errors means for the rest of the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPolicy {
    /// Check results are reported only; Activate still runs
    #[default]
    Informational,
    /// Check errors skip Activate (the object stays created and updated)
    BlockActivation,
}

/// Workflow defaults applied by the tool boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowPolicyConfig {
    pub validate_before_create: bool,
    pub check_before_unlock: bool,
    pub default_activate: bool,
    pub check_policy: CheckPolicy,
}

impl Default for WorkflowPolicyConfig {
    fn default() -> Self {
        Self {
            validate_before_create: true,
            check_before_unlock: true,
            default_activate: true,
            check_policy: CheckPolicy::Informational,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
