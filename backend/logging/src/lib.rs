//! Structured logging for vidlens.
//!
//! Console output, optional NDJSON file rotation, and scrubbing of credentials
//! and signed-URL parameters before they reach a log line.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_sensitive_data;
