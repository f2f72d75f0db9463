use thiserror::Error;

/// Top-level error type for the `woonveilig-api` crate.
///
/// Covers every failure mode of the panel's HTTP surface: authentication,
/// transport, unexpected status codes and the history payload format.
/// `woonveilig-core` maps these into poll-cycle and command outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The panel rejected the basic-auth credentials.
    #[error("Authentication failed (HTTP {status})")]
    Authentication { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, timeout, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Building the underlying HTTP client failed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The panel answered with a status code the endpoint doesn't accept.
    #[error("Unexpected HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The history payload could not be normalized into JSON.
    #[error("Malformed history log: {reason}")]
    MalformedLog { reason: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// The panel now and then answers 401 to credentials it accepted a
    /// moment ago, so a 401 counts as transient too.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Authentication { status } => *status == 401,
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 401,
            _ => false,
        }
    }

    /// Build a `MalformedLog` error with a bounded preview of the body.
    pub(crate) fn malformed(reason: impl Into<String>, body: &str) -> Self {
        Self::MalformedLog {
            reason: reason.into(),
            body: preview(body),
        }
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
