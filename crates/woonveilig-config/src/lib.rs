//! Shared configuration for WoonVeilig panel hosts.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `woonveilig_core::PanelConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use woonveilig_core::{PanelConfig, RetryPolicy};

const KEYRING_SERVICE: &str = "woonveilig";
const ENV_PREFIX: &str = "WOONVEILIG_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found in config")]
    UnknownProfile { profile: String },

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is requested.
    pub default_profile: Option<String>,

    /// Timings applied to every profile that doesn't override them.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named panel profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `requested`, or the default profile when `None`.
    pub fn profile<'a>(&'a self, requested: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }

    /// Build the `PanelConfig` for a profile, falling back to `[defaults]`.
    pub fn panel_config(&self, requested: Option<&str>) -> Result<PanelConfig, ConfigError> {
        let (name, profile) = self.profile(requested)?;
        build_panel_config(profile, name, &self.defaults)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "default_command_attempts")]
    pub command_attempts: u32,

    /// Pause between mode-change attempts, in milliseconds.
    #[serde(default = "default_command_backoff_ms")]
    pub command_backoff_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            command_attempts: default_command_attempts(),
            command_backoff_ms: default_command_backoff_ms(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    5
}
fn default_command_attempts() -> u32 {
    3
}
fn default_command_backoff_ms() -> u64 {
    2000
}

/// A named panel profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Panel address (e.g., "192.168.1.20" or "http://panel.lan").
    pub host: String,

    /// Panel user; falls back to `WOONVEILIG_USERNAME`.
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Override poll interval (seconds).
    pub poll_interval: Option<u64>,

    pub command_attempts: Option<u32>,

    pub command_backoff_ms: Option<u64>,

    /// Override the User-Agent sent to the panel.
    pub user_agent: Option<String>,

    /// Pin the year assigned to log entries.
    pub log_year: Option<i32>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "woonveilig", "woonveilig")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for runtime state such as the persisted watermark.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("woonveilig");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file is not
/// an error; defaults and env vars still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the panel username: profile, then `WOONVEILIG_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("WOONVEILIG_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the panel password from the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            debug!(profile = profile_name, source = "password_env", "resolved password");
            return Ok(SecretString::from(pw));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("WOONVEILIG_PASSWORD") {
        debug!(profile = profile_name, source = "env", "resolved password");
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            debug!(profile = profile_name, source = "keyring", "resolved password");
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        debug!(profile = profile_name, source = "config", "resolved password");
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `PanelConfig` from a profile using built-in defaults.
pub fn profile_to_panel_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<PanelConfig, ConfigError> {
    build_panel_config(profile, profile_name, &Defaults::default())
}

fn build_panel_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PanelConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;
    let mut config = PanelConfig::new(host, username, password);

    config
        .credentials()
        .base_url()
        .map_err(|e| ConfigError::Validation {
            field: "host".into(),
            reason: e.to_string(),
        })?;

    config.timeout = Duration::from_secs(positive(
        "timeout",
        profile.timeout.unwrap_or(defaults.timeout),
    )?);
    config.poll_interval = Duration::from_secs(positive(
        "poll_interval",
        profile.poll_interval.unwrap_or(defaults.poll_interval),
    )?);
    config.retry = RetryPolicy {
        attempts: positive(
            "command_attempts",
            profile.command_attempts.unwrap_or(defaults.command_attempts),
        )?,
        backoff: Duration::from_millis(
            profile.command_backoff_ms.unwrap_or(defaults.command_backoff_ms),
        ),
    };
    config.user_agent.clone_from(&profile.user_agent);
    config.log_year = profile.log_year;

    Ok(config)
}

fn positive<T: Default + PartialEq>(field: &str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}
