// woonveilig-api: Async Rust client for the WoonVeilig alarm panel's HTTP API

pub mod auth;
pub mod error;
pub mod panel;
pub mod transport;

pub use auth::Credentials;
pub use error::Error;
pub use panel::{MODE_SUCCESS_MARKER, PanelClient, PanelMode, RawLogRecord, decode};
pub use transport::{DEFAULT_USER_AGENT, RequestRetry, TransportConfig};
