//! Prometheus metrics and structured logging for sigx.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters and histograms for order execution

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{gather_text, Metrics};
