// ── Runtime panel configuration ──
//
// Describes *how* to talk to one panel: credentials plus timing knobs.
// Core never reads config files; the host builds a `PanelConfig` and hands
// it in.

use std::time::Duration;

use secrecy::SecretString;

use woonveilig_api::{Credentials, DEFAULT_USER_AGENT, RequestRetry, TransportConfig};

/// How often and how patiently a mode change is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than one.
    pub attempts: u32,
    /// Pause between attempts. Not slept after the last one.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Configuration for a single panel.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Panel address, with or without `http://`.
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Interval between poll cycles.
    pub poll_interval: Duration,
    /// Mode-change retries.
    pub retry: RetryPolicy,
    /// Login and history request retries.
    pub request_retry: RequestRetry,
    /// Overrides the default `User-Agent`.
    pub user_agent: Option<String>,
    /// Calendar year assigned to log entries. `None` means the current
    /// local year at the time of each cycle.
    pub log_year: Option<i32>,
}

impl PanelConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            request_retry: RequestRetry::default(),
            user_agent: None,
            log_year: None,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.host.clone(), self.username.clone(), self.password.clone())
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            retry: self.request_retry,
            ..TransportConfig::default()
        }
    }
}
