//! Application error types.

use sigx_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid signal: {0}")]
    Signal(#[from] CoreError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<sigx_ws::WsError>),

    #[error("Registry error: {0}")]
    Registry(#[from] sigx_registry::RegistryError),

    #[error("Executor error: {0}")]
    Executor(#[from] sigx_executor::ExecutorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] sigx_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sigx_ws::WsError> for AppError {
    fn from(err: sigx_ws::WsError) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Telemetry(_) | Self::Io(_) => ErrorKind::Config,
            Self::Signal(e) => e.kind(),
            Self::WebSocket(e) => e.kind(),
            Self::Registry(e) => e.kind(),
            Self::Executor(e) => e.kind(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passes_through_component_errors() {
        let err: AppError = sigx_ws::WsError::AuthFailed {
            code: "152409".to_string(),
            message: "bad sign".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(!err.is_retryable());

        let err: AppError = CoreError::InvalidSignal("no stop loss".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(AppError::Config("x".to_string()).kind(), ErrorKind::Config);
    }
}
