//! Alert formatting and delivery
//!
//! Turns evaluation results into chat-ready text, renders the underutilized
//! and cost reports, and delivers alerts with deduplication.

mod dispatcher;
mod formatter;
mod transport;

pub use dispatcher::{AlertDispatcher, DispatchSummary};
pub use formatter::{Alert, AlertFormatter, AlertKind};
pub use transport::{LogTransport, WebhookTransport};
