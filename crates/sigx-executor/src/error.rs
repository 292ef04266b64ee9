//! Executor error types.

use sigx_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Exchange rejected request: code={code}, msg={message}")]
    ExchangeRejected { code: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ExecutorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(e) => e.kind(),
            Self::MissingCredential(_) | Self::Signing(_) => ErrorKind::Config,
            Self::Transport(_) => ErrorKind::Transport,
            Self::ExchangeRejected { .. } => ErrorKind::ExchangeRejected,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Encoding(_) => ErrorKind::Validation,
        }
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
