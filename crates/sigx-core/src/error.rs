//! Error types for sigx-core.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error taxonomy shared by every crate in the workspace.
///
/// Each crate-level error maps onto exactly one kind so callers can branch
/// on retryability without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or incomplete input; fails before any I/O.
    Validation,
    /// Static configuration problem (missing secret, bad URL).
    Config,
    /// Network or HTTP-layer failure.
    Transport,
    /// Unknown instrument.
    NotFound,
    /// Application-level non-success code from the exchange.
    ExchangeRejected,
    /// Response did not have the expected shape.
    MalformedResponse,
    /// Stream login not acknowledged as success.
    Auth,
    /// Deadline elapsed with orders still unmatched.
    ConfirmationTimeout,
}

impl ErrorKind {
    /// Only transport failures are worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Config => "config",
            Self::Transport => "transport",
            Self::NotFound => "not_found",
            Self::ExchangeRejected => "exchange_rejected",
            Self::MalformedResponse => "malformed_response",
            Self::Auth => "auth",
            Self::ConfirmationTimeout => "confirmation_timeout",
        };
        f.write_str(s)
    }
}

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Invalid instrument: {0}")]
    InvalidInstrument(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
