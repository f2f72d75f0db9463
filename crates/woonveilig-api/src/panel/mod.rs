// Panel endpoint modules
//
// `client` holds the transport mechanics; the other modules add endpoint
// methods to `PanelClient` as inherent impls.

pub mod auth;
pub mod client;
pub mod history;
pub mod mode;

pub use client::PanelClient;
pub use history::{RawLogRecord, decode};
pub use mode::{MODE_SUCCESS_MARKER, PanelMode};
