//! WebSocket error types.

use sigx_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Message parse error: {0}")]
    ParseError(String),

    #[error("Login rejected: code={code}, msg={message}")]
    AuthFailed { code: String, message: String },

    #[error("Subscription rejected: code={code}, msg={message}")]
    SubscriptionFailed { code: String, message: String },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthFailed { .. } => ErrorKind::Auth,
            Self::SubscriptionFailed { .. } => ErrorKind::ExchangeRejected,
            Self::ParseError(_) | Self::Json(_) => ErrorKind::MalformedResponse,
            Self::ConnectionFailed(_)
            | Self::ConnectionClosed { .. }
            | Self::SendFailed(_)
            | Self::Timeout(_)
            | Self::Tungstenite(_) => ErrorKind::Transport,
        }
    }
}

pub type WsResult<T> = Result<T, WsError>;
