// Panel HTTP client
//
// Wraps `reqwest::Client` with the panel's URL scheme, fixed header set
// and basic auth. Endpoint methods live in sibling files (`auth.rs`,
// `history.rs`, `mode.rs`) to keep this module focused on transport.

use std::future::Future;

use reqwest::Method;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::{RequestRetry, TransportConfig, panel_headers};

/// Raw HTTP client for a WoonVeilig panel.
///
/// Cheap to clone: the underlying `reqwest::Client` shares one keep-alive
/// connection pool across clones.
#[derive(Debug, Clone)]
pub struct PanelClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    retry: RequestRetry,
}

impl PanelClient {
    /// Create a client for the panel named in `credentials`.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = credentials.base_url()?;
        let http = transport.build_client_with_headers(panel_headers(&base_url)?)?;
        Ok(Self {
            http,
            base_url,
            credentials,
            retry: transport.retry,
        })
    }

    /// The panel's root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an `/action/{name}` endpoint.
    pub(crate) fn action_url(&self, name: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("action/{name}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Start a request with basic auth applied.
    pub(crate) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        debug!("{method} {url}");
        self.http.request(method, url).basic_auth(
            self.credentials.username(),
            Some(self.credentials.password()),
        )
    }

    /// Send a request and return `(status, body)`.
    ///
    /// Status handling is left to the endpoint: the panel uses plain 200s
    /// for both success and failure on some actions.
    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<(reqwest::StatusCode, String), Error> {
        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        Ok((status, body))
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or
    /// the retry budget is spent.
    pub(crate) async fn with_retry<T, F, Fut>(
        &self,
        endpoint: &'static str,
        mut op: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(endpoint, attempt, attempts, error = %e, "panel request failed, retrying");
                    tokio::time::sleep(self.retry.pause).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
