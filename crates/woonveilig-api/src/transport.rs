// Shared transport configuration for building reqwest::Client instances.
//
// The panel binds its session to the User-Agent and drops requests that
// don't look like they came from its own web UI, so every client carries
// the same fixed header set.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::error::Error;

/// User-Agent sent when the caller doesn't override it.
pub const DEFAULT_USER_AGENT: &str = concat!("WoonVeilig-rs/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout. The panel has no notion of one; without it a
    /// wedged panel would stall a poll cycle indefinitely.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// How long an idle keep-alive connection stays in the pool.
    pub pool_idle_timeout: Duration,
    pub user_agent: String,
    /// Retry budget for login and history requests.
    pub retry: RequestRetry,
}

/// Request-level retry for the panel's idempotent calls.
///
/// Mode changes are not retried here; the command driver owns those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRetry {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Pause between attempts.
    pub pause: Duration,
}

impl Default for RequestRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            pause: Duration::from_secs(1),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            retry: RequestRetry::default(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the given default headers.
    ///
    /// Used by [`PanelClient`](crate::PanelClient) to inject the
    /// browser-like header set returned by [`panel_headers`].
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

/// The fixed header set the panel's web UI sends with every XHR.
///
/// `Origin` and `Referer` are derived from the panel's base URL, so the
/// set is built per panel. `Authorization` is added per request.
pub fn panel_headers(base_url: &Url) -> Result<HeaderMap, Error> {
    let origin = base_url.as_str().trim_end_matches('/');
    let referer = base_url.join("setting/log.htm")?;

    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(
        reqwest::header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate"),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        reqwest::header::CONNECTION,
        HeaderValue::from_static("keep-alive"),
    );
    headers.insert(reqwest::header::ORIGIN, header_value(origin)?);
    headers.insert(reqwest::header::REFERER, header_value(referer.as_str())?);
    headers.insert(
        "X-Requested-With",
        HeaderValue::from_static("XMLHttpRequest"),
    );
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::ClientBuild(format!("invalid header value {value:?}: {e}")))
}
