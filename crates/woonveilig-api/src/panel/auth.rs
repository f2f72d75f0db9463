// Panel login
//
// The panel has no session token: login is a credentials probe. A 200
// means the basic-auth pair is accepted; the body is ignored.

use reqwest::Method;
use tracing::debug;

use crate::error::Error;
use crate::panel::client::PanelClient;

impl PanelClient {
    /// Verify the credentials against `POST /action/login`.
    ///
    /// A 401 or a transport failure is retried under the client's
    /// [`RequestRetry`](crate::RequestRetry) budget before it is reported.
    pub async fn login(&self) -> Result<(), Error> {
        let url = self.action_url("login")?;
        debug!(username = %self.credentials().username(), "logging in at {}", url);

        self.with_retry("login", || self.login_once(url.clone()))
            .await?;

        debug!("login successful");
        Ok(())
    }

    async fn login_once(&self, url: url::Url) -> Result<(), Error> {
        let (status, _body) = self.send(self.request(Method::POST, url)).await?;

        if status != reqwest::StatusCode::OK {
            return Err(Error::Authentication {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
