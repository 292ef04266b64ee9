//! Application configuration.
//!
//! Loaded once at startup from an optional TOML file layered with
//! `SIGX__`-prefixed environment variables (`SIGX__ORDER__LEVERAGE=10`),
//! then passed by value to the components that need it.

use crate::error::{AppError, AppResult};
use config::{Config, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sigx_executor::{CredentialSource, LegMode};
use sigx_ws::SessionConfig;
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SIGX";

/// Sizing and order parameters applied to every signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Margin committed per trade, in USD.
    #[serde(default = "default_usd_amount")]
    pub usd_amount: Decimal,
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    #[serde(default)]
    pub leg_mode: LegMode,
    /// Call set-leverage before placing orders.
    #[serde(default = "default_true")]
    pub set_leverage: bool,
}

fn default_usd_amount() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_leverage() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            usd_amount: default_usd_amount(),
            leverage: default_leverage(),
            leg_mode: LegMode::default(),
            set_leverage: true,
        }
    }
}

/// Private stream settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_login_timeout_ms")]
    pub login_timeout_ms: u64,
    #[serde(default = "default_subscribe_timeout_ms")]
    pub subscribe_timeout_ms: u64,
    /// Capacity of the channel between the reader task and the tracker.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_login_timeout_ms() -> u64 {
    5_000
}

fn default_subscribe_timeout_ms() -> u64 {
    5_000
}

fn default_event_buffer() -> usize {
    256
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            login_timeout_ms: default_login_timeout_ms(),
            subscribe_timeout_ms: default_subscribe_timeout_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Bounded wait for stream confirmations (ms). Default: 10,000.
    #[serde(default = "default_confirmation_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_confirmation_timeout_ms() -> u64 {
    10_000
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_confirmation_timeout_ms(),
        }
    }
}

/// Names of the environment variables holding the API credentials.
///
/// Only the names live in config; the values are read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,
}

fn default_api_key_env() -> String {
    CredentialSource::default().api_key_env
}

fn default_secret_env() -> String {
    CredentialSource::default().secret_env
}

fn default_passphrase_env() -> String {
    CredentialSource::default().passphrase_env
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            secret_env: default_secret_env(),
            passphrase_env: default_passphrase_env(),
        }
    }
}

impl CredentialsConfig {
    pub fn source(&self) -> CredentialSource {
        CredentialSource {
            api_key_env: self.api_key_env.clone(),
            secret_env: self.secret_env.clone(),
            passphrase_env: self.passphrase_env.clone(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// REST base URL.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Private WebSocket URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Quote currency appended to the ticker to form the instrument id.
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    #[serde(default)]
    pub order: OrderConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

fn default_rest_url() -> String {
    "https://openapi.blofin.com".to_string()
}

fn default_ws_url() -> String {
    "wss://openapi.blofin.com/ws/private".to_string()
}

fn default_quote_currency() -> String {
    "USDT".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            ws_url: default_ws_url(),
            quote_currency: default_quote_currency(),
            order: OrderConfig::default(),
            stream: StreamConfig::default(),
            confirmation: ConfirmationConfig::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file plus `SIGX__` environment overrides.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`AppConfig::load`] with a custom environment prefix.
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> AppResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let config: Self = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without environment overrides.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.rest_url.trim().is_empty() {
            return Err(AppError::Config("rest_url is empty".to_string()));
        }
        if self.ws_url.trim().is_empty() {
            return Err(AppError::Config("ws_url is empty".to_string()));
        }
        if self.quote_currency.trim().is_empty() {
            return Err(AppError::Config("quote_currency is empty".to_string()));
        }
        if self.order.leverage == 0 {
            return Err(AppError::Config("order.leverage must be at least 1".to_string()));
        }
        if self.order.usd_amount <= Decimal::ZERO {
            return Err(AppError::Config(format!(
                "order.usd_amount must be positive, got {}",
                self.order.usd_amount
            )));
        }
        if self.stream.event_buffer == 0 {
            return Err(AppError::Config("stream.event_buffer must be positive".to_string()));
        }
        if self.confirmation.timeout_ms == 0 {
            return Err(AppError::Config("confirmation.timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            url: self.ws_url.clone(),
            login_timeout: Duration::from_millis(self.stream.login_timeout_ms),
            subscribe_timeout: Duration::from_millis(self.stream.subscribe_timeout_ms),
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation.timeout_ms)
    }
}
