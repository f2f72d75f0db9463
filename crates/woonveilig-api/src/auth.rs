use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Static basic-auth credentials for a single panel.
///
/// The panel has no session or token flow: every request carries
/// `Authorization: Basic base64(user:pass)`. Immutable once built.
#[derive(Clone)]
pub struct Credentials {
    host: String,
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
        }
    }

    /// Panel address as configured (`192.168.1.20` or `http://192.168.1.20:8080`).
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Root URL of the panel's web interface.
    ///
    /// A bare address gets the `http://` scheme the panel serves on; an
    /// explicit scheme is kept as-is.
    pub fn base_url(&self) -> Result<Url, Error> {
        let host = self.host.trim().trim_end_matches('/');
        let url = if host.contains("://") {
            Url::parse(host)?
        } else {
            Url::parse(&format!("http://{host}"))?
        };
        Ok(url)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
