// Panel history log
//
// `GET /action/historyGet` returns something that is almost JSON:
//
//     /*-secure-
//     {	hisrows : [
//         {d : "10/14", t : "21:03", a : "Disarm", s : "Remote 1"},
//         ...
//     ]
//     }
//     */
//
// Keys are unquoted and the whole thing is wrapped in a comment. `decode`
// normalizes it into real JSON and parses the rows.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, preview};
use crate::panel::client::PanelClient;

const SECURE_PREFIX: &str = "/*-secure-";
const SECURE_SUFFIX: &str = "*/";

/// Unquoted keys in key position: right after `{` or `,`, followed by `:`.
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,])\s*(hisrows|d|t|a|s)\s*:").expect("valid key regex")
});

/// Indentation the panel sprinkles through the payload.
static INDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\t\r\n]| {4}").expect("valid indent regex"));

/// A comma directly before a closing bracket.
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").expect("valid trailing comma regex"));

/// One row of the panel's history log, exactly as delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogRecord {
    /// Day of the entry, `MM/DD`.
    #[serde(rename = "d", default)]
    pub date: String,
    /// Time of the entry, `HH:MM`.
    #[serde(rename = "t", default)]
    pub time: String,
    /// Action code (`Arm`, `Disarm`, `Home`, `Burglary ...`, ...).
    #[serde(rename = "a", default)]
    pub action: String,
    /// Device or user that caused the entry.
    #[serde(rename = "s", default)]
    pub source: String,
}

#[derive(Deserialize)]
struct HistoryPayload {
    hisrows: Vec<RawLogRecord>,
}

impl PanelClient {
    /// Fetch the raw history payload from `GET /action/historyGet`,
    /// retrying transient failures.
    pub async fn fetch_history(&self) -> Result<String, Error> {
        let url = self.action_url("historyGet")?;
        self.with_retry("historyGet", || self.fetch_history_once(url.clone()))
            .await
    }

    async fn fetch_history_once(&self, url: url::Url) -> Result<String, Error> {
        let builder = self.request(Method::GET, url).header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded;charset=UTF-8",
        );
        let (status, body) = self.send(builder).await?;

        match status {
            reqwest::StatusCode::OK => Ok(body),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(Error::Authentication {
                    status: status.as_u16(),
                })
            }
            _ => Err(Error::HttpStatus {
                status: status.as_u16(),
                body: preview(&body),
            }),
        }
    }

    /// Fetch and decode the history log, newest entry first.
    pub async fn history(&self) -> Result<Vec<RawLogRecord>, Error> {
        let body = self.fetch_history().await?;
        let rows = decode(&body)?;
        debug!(rows = rows.len(), "decoded panel history");
        Ok(rows)
    }
}

/// Decode a `historyGet` payload into log records, in payload order.
pub fn decode(raw: &str) -> Result<Vec<RawLogRecord>, Error> {
    let json = normalize(raw)?;
    trace!(%json, "normalized history payload");

    let payload: HistoryPayload =
        serde_json::from_str(&json).map_err(|e| Error::malformed(e.to_string(), raw))?;
    Ok(payload.hisrows)
}

/// Turn the panel's relaxed payload into standard JSON.
fn normalize(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix(SECURE_PREFIX)
        .and_then(|rest| rest.strip_suffix(SECURE_SUFFIX))
        .ok_or_else(|| Error::malformed("missing /*-secure- ... */ wrapper", raw))?;

    let flattened = INDENT_RE.replace_all(inner, "");
    Ok(rewrite_outside_strings(&flattened, |segment| {
        let quoted = KEY_RE.replace_all(segment, "$1\"$2\":");
        TRAILING_COMMA_RE.replace_all(&quoted, "$1").into_owned()
    }))
}

/// Apply `rewrite` to every part of `input` that is outside a JSON string
/// literal. String contents pass through untouched, so a source name that
/// happens to contain `, d :` is never rewritten.
fn rewrite_outside_strings(input: &str, rewrite: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(input.len() + 32);
    let mut segment_start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in input.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                out.push_str(&input[segment_start..=idx]);
                segment_start = idx + 1;
                in_string = false;
            }
        } else if ch == '"' {
            out.push_str(&rewrite(&input[segment_start..idx]));
            segment_start = idx;
            in_string = true;
        }
    }

    let tail = &input[segment_start..];
    if in_string {
        // Unterminated string: leave it for the JSON parser to reject.
        out.push_str(tail);
    } else {
        out.push_str(&rewrite(tail));
    }
    out
}
