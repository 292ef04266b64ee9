//! Registry error types.

use sigx_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Instrument not found: {0}")]
    NotFound(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Exchange rejected request: code={code}, msg={message}")]
    Rejected { code: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::HttpClient(_) => ErrorKind::Transport,
            Self::Rejected { .. } => ErrorKind::ExchangeRejected,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
