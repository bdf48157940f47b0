use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use lettre::message::Mailbox;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub trait EnvConfig: Sized {
    fn from_env() -> Result<Self, ::config::ConfigError>;
    fn from_env_with_prefix(prefix: &str) -> Result<Self, ::config::ConfigError>;
    /// Deserialize from an explicit variable map instead of the process environment.
    fn from_vars(vars: HashMap<String, String>) -> Result<Self, ::config::ConfigError>;
}

impl<D> EnvConfig for D
where
    D: DeserializeOwned,
{
    fn from_env() -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(::config::Environment::default().ignore_empty(true))
            .build()?
            .try_deserialize()
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(::config::Environment::with_prefix(prefix).ignore_empty(true))
            .build()?
            .try_deserialize()
    }

    fn from_vars(vars: HashMap<String, String>) -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(
                ::config::Environment::default()
                    .ignore_empty(true)
                    .source(Some(vars)),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}")]
    Env(#[from] ::config::ConfigError),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("MAIL_FROM is not a valid mailbox: {0}")]
    InvalidFrom(String),
    #[error("SEND_TIMEOUT_SECS must be at least 1")]
    ZeroTimeout,
}

/// Which outbound mail service the relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    /// Local postfix MTA on port 25, no authentication.
    Postfix,
    /// Disposable Ethereal account provisioned on first use.
    Ethereal,
}

/// Controls log verbosity only. Any value other than `production` or `test`
/// means development.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AppEnv {
    Production,
    Test,
    #[default]
    Development,
}

impl From<String> for AppEnv {
    fn from(value: String) -> Self {
        match value.as_str() {
            "production" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Process-wide settings, read once at startup.
///
/// | Variable | Required | Default |
/// |----------|----------|---------|
/// | `HOST_NAME` | Yes | |
/// | `SERVER_PORT` | Yes | |
/// | `MAIL_FROM` | Yes | |
/// | `MAIL_HOST_TYPE` | Yes | `postfix` or `ethereal` |
/// | `ENABLE_SEND` | No | `true` |
/// | `APP_ENV` | No | `development` |
/// | `SEND_TIMEOUT_SECS` | No | `10` |
/// | `ETHEREAL_API_URL` | No | `https://api.nodemailer.com/user` |
/// | `ERROR_LOG` | No | `logs/error.log` |
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub host_name: String,
    pub server_port: u16,
    pub mail_from: String,
    pub mail_host_type: HostType,
    #[serde(default = "default_enable_send")]
    pub enable_send: bool,
    #[serde(default)]
    pub app_env: AppEnv,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    #[serde(default = "default_ethereal_api_url")]
    pub ethereal_api_url: String,
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

fn default_enable_send() -> bool {
    true
}

fn default_send_timeout() -> u64 {
    10
}

fn default_ethereal_api_url() -> String {
    "https://api.nodemailer.com/user".to_string()
}

fn default_error_log() -> PathBuf {
    PathBuf::from("logs/error.log")
}

impl RelayConfig {
    /// Read and validate the process environment. Must succeed before any socket is bound.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Same as [`RelayConfig::load`] over an explicit variable map.
    pub fn load_from(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let config = Self::from_vars(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host_name.trim().is_empty() {
            return Err(ConfigError::Empty("HOST_NAME"));
        }
        if self.mail_from.trim().is_empty() {
            return Err(ConfigError::Empty("MAIL_FROM"));
        }
        self.mail_from
            .parse::<Mailbox>()
            .map_err(|_| ConfigError::InvalidFrom(self.mail_from.clone()))?;
        if self.send_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn banner(&self) -> String {
        format!(
            "sendmail-relay server running at http://{}:{}/",
            self.host_name, self.server_port
        )
    }
}
