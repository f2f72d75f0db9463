// ── Domain model ──

pub mod event;
pub mod state;
pub mod watermark;

pub use event::{LogAction, LogEvent, LogOutcome};
pub use state::{AlarmState, Fact};
pub use watermark::Watermark;
