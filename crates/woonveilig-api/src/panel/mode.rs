// Panel mode changes
//
// `POST /action/panelCondPost` with a form-encoded `mode=<code>`. The panel
// answers 200 whether or not it accepted the change; only a body containing
// `result : 1` means the mode was applied.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::panel::client::PanelClient;

/// Marker the panel puts in the response body when a mode change sticks.
pub const MODE_SUCCESS_MARKER: &str = "result : 1";

/// Arming mode in the panel's own vocabulary.
///
/// The same three words appear as action codes in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelMode {
    /// Fully armed.
    Arm,
    /// Armed at home (perimeter only).
    Home,
    Disarm,
}

impl PanelMode {
    /// The `mode` form value `panelCondPost` expects.
    pub fn wire_code(self) -> u8 {
        match self {
            Self::Arm => 0,
            Self::Home => 1,
            Self::Disarm => 2,
        }
    }

    /// Parse a history log action code. Only exact matches count.
    pub fn from_action_code(code: &str) -> Option<Self> {
        match code {
            "Arm" => Some(Self::Arm),
            "Home" => Some(Self::Home),
            "Disarm" => Some(Self::Disarm),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arm => "Arm",
            Self::Home => "Home",
            Self::Disarm => "Disarm",
        }
    }
}

impl fmt::Display for PanelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PanelClient {
    /// Ask the panel to switch mode. One attempt, no retries.
    ///
    /// Returns `Ok(true)` only when the panel confirms with
    /// [`MODE_SUCCESS_MARKER`]. Any other answer, including non-200
    /// statuses, is `Ok(false)`; transport failures are `Err`.
    pub async fn set_mode(&self, mode: PanelMode) -> Result<bool, Error> {
        let url = self.action_url("panelCondPost")?;
        let code = mode.wire_code().to_string();
        let builder = self
            .request(Method::POST, url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .body(form_body(&[("mode", code.as_str())]));

        let (status, body) = self.send(builder).await?;
        let accepted = status == reqwest::StatusCode::OK && body.contains(MODE_SUCCESS_MARKER);
        debug!(%mode, code = %code, status = status.as_u16(), accepted, "panelCondPost answered");
        Ok(accepted)
    }
}

/// `application/x-www-form-urlencoded` body from key/value pairs.
fn form_body(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
