// ── Core error types ──
//
// Errors surfaced to the host. These are NOT HTTP-specific -- consumers
// never see status codes or reqwest errors directly. The
// `From<woonveilig_api::Error>` impl translates transport-layer errors into
// the poll-cycle and command taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach panel at {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Panel did not answer before the request timeout")]
    Timeout,

    #[error("Panel rejected the credentials: {message}")]
    AuthFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed history log: {reason}")]
    MalformedLog { reason: String },

    #[error("Cannot parse log {field} {value:?}: {reason}")]
    Parse {
        field: &'static str,
        value: String,
        reason: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("A poll cycle is already running")]
    Busy,

    #[error("Mode change not confirmed after {attempts} attempt(s)")]
    CommandFailed {
        attempts: u32,
        last_error: Option<String>,
    },

    // ── Host-side errors ─────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Watermark persistence failed: {message}")]
    Persistence { message: String },
}

impl CoreError {
    /// Returns `true` if the failure is likely to clear up on the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<woonveilig_api::Error> for CoreError {
    fn from(err: woonveilig_api::Error) -> Self {
        use woonveilig_api::Error as ApiError;

        match err {
            ApiError::Authentication { status } => CoreError::AuthFailed {
                message: format!("HTTP {status}"),
            },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::Network {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            ApiError::HttpStatus { status, body } => CoreError::Network {
                url: String::new(),
                reason: format!("HTTP {status}: {body}"),
            },
            ApiError::MalformedLog { reason, body: _ } => CoreError::MalformedLog { reason },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid panel address: {e}"),
            },
            ApiError::ClientBuild(message) => CoreError::Config { message },
        }
    }
}
