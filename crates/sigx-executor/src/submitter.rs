//! Signed REST writes: leverage setting and order placement.
//!
//! Submission is not idempotent. Nothing here retries; a transport error
//! after the request left the process may still have placed the order.

use crate::error::{ExecutorError, ExecutorResult};
use crate::nonce::{NonceManager, SystemClock};
use crate::signer::RequestSigner;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sigx_core::{
    ClientOrderId, MarginMode, OrderLeg, OrderSide, OrderType, PositionSide, Price, Size,
};
use sigx_registry::{optional_code_as_string, ApiResponse, SUCCESS_CODE};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const SET_LEVERAGE_PATH: &str = "/api/v1/account/set-leverage";
pub const ORDER_PATH: &str = "/api/v1/trade/order";

/// Trigger order price meaning "execute at market when triggered".
pub const MARKET_ON_TRIGGER: &str = "-1";

// ============================================================================
// Request bodies
// ============================================================================

/// `POST /api/v1/trade/order` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub inst_id: String,
    pub margin_mode: MarginMode,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Price,
    pub size: Size,
    pub sl_trigger_price: Price,
    pub sl_order_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp_trigger_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp_order_price: Option<String>,
    pub leverage: String,
    pub position_side: PositionSide,
    pub client_order_id: ClientOrderId,
}

impl OrderRequest {
    pub fn from_leg(leg: &OrderLeg, inst_id: &str) -> Self {
        Self {
            inst_id: inst_id.to_string(),
            margin_mode: leg.margin_mode,
            side: leg.side,
            order_type: OrderType::Limit,
            price: leg.price,
            size: leg.size,
            sl_trigger_price: leg.stop_loss,
            sl_order_price: MARKET_ON_TRIGGER.to_string(),
            tp_trigger_price: leg.take_profit,
            tp_order_price: leg.take_profit.map(|_| MARKET_ON_TRIGGER.to_string()),
            leverage: leg.leverage.to_string(),
            position_side: leg.position_side,
            client_order_id: leg.client_order_id.clone(),
        }
    }
}

/// `POST /api/v1/account/set-leverage` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLeverageRequest {
    pub inst_id: String,
    pub leverage: String,
    pub margin_mode: MarginMode,
}

// ============================================================================
// Responses
// ============================================================================

/// One element of the order response `data` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    #[serde(default, deserialize_with = "optional_code_as_string")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default, deserialize_with = "optional_code_as_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Extract the exchange order id from an order response body.
///
/// The envelope code and the per-order code must both be success.
pub fn parse_order_ack(body: &str) -> ExecutorResult<String> {
    let envelope: ApiResponse<Vec<OrderAck>> = serde_json::from_str(body)
        .map_err(|e| ExecutorError::MalformedResponse(format!("order response: {e}")))?;

    if !envelope.is_success() {
        // The envelope only says "failed"; the item carries the reason.
        let item = envelope
            .data
            .as_ref()
            .and_then(|acks| acks.first())
            .and_then(|ack| Some((ack.code.clone()?, ack.msg.clone().unwrap_or_default())))
            .filter(|(code, _)| code != SUCCESS_CODE);
        let (code, message) = item.unwrap_or((envelope.code, envelope.msg));
        return Err(ExecutorError::ExchangeRejected { code, message });
    }

    let ack = envelope
        .data
        .and_then(|acks| acks.into_iter().next())
        .ok_or_else(|| ExecutorError::MalformedResponse("order response has no data".to_string()))?;

    if let Some(code) = ack.code.as_deref().filter(|c| *c != SUCCESS_CODE) {
        return Err(ExecutorError::ExchangeRejected {
            code: code.to_string(),
            message: ack.msg.unwrap_or_default(),
        });
    }

    ack.order_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ExecutorError::MalformedResponse("order ack without orderId".to_string()))
}

/// Check a set-leverage response. The payload itself is not needed.
pub fn parse_leverage_ack(body: &str) -> ExecutorResult<()> {
    let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| ExecutorError::MalformedResponse(format!("set-leverage response: {e}")))?;

    if !envelope.is_success() {
        return Err(ExecutorError::ExchangeRejected {
            code: envelope.code,
            message: envelope.msg,
        });
    }
    Ok(())
}

// ============================================================================
// Submitter
// ============================================================================

/// Builds, signs and sends authenticated writes.
pub struct OrderSubmitter {
    client: Client,
    base_url: String,
    signer: Arc<RequestSigner>,
    nonces: NonceManager<SystemClock>,
}

impl OrderSubmitter {
    pub fn new(base_url: impl Into<String>, signer: Arc<RequestSigner>) -> ExecutorResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ExecutorError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url, signer))
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        signer: Arc<RequestSigner>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer,
            nonces: NonceManager::with_system_clock(),
        }
    }

    /// Set cross-margin leverage for an instrument.
    pub async fn set_leverage(&self, inst_id: &str, leverage: u32) -> ExecutorResult<()> {
        let request = SetLeverageRequest {
            inst_id: inst_id.to_string(),
            leverage: leverage.to_string(),
            margin_mode: MarginMode::Cross,
        };
        let body = self.post_signed(SET_LEVERAGE_PATH, &request).await?;
        parse_leverage_ack(&body)?;
        info!(inst_id, leverage, "Leverage set");
        Ok(())
    }

    /// Place one leg. Returns the exchange order id.
    pub async fn submit(&self, leg: &OrderLeg, inst_id: &str) -> ExecutorResult<String> {
        let request = OrderRequest::from_leg(leg, inst_id);
        info!(
            inst_id,
            leg = %leg.role,
            side = %leg.side,
            price = %leg.price,
            size = %leg.size,
            sl = %leg.stop_loss,
            tp = ?leg.take_profit.map(|p| p.to_string()),
            client_order_id = %leg.client_order_id,
            "Submitting order"
        );

        let body = self.post_signed(ORDER_PATH, &request).await?;
        match parse_order_ack(&body) {
            Ok(order_id) => {
                info!(inst_id, leg = %leg.role, order_id = %order_id, "Order accepted");
                Ok(order_id)
            }
            Err(e) => {
                warn!(inst_id, leg = %leg.role, error = %e, "Order not accepted");
                Err(e)
            }
        }
    }

    /// Serialize once, sign exactly those bytes, send them.
    async fn post_signed<B: Serialize>(&self, path: &str, request: &B) -> ExecutorResult<String> {
        let body = serde_json::to_string(request)?;
        let stamp = self.nonces.stamp();
        let sign = self
            .signer
            .sign(path, "POST", &stamp.timestamp, &stamp.nonce, &body)?;
        let credentials = self.signer.credentials();

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, nonce = %stamp.nonce, "POST signed request");

        let response = self
            .client
            .post(&url)
            .header("ACCESS-KEY", credentials.api_key())
            .header("ACCESS-SIGN", sign)
            .header("ACCESS-TIMESTAMP", &stamp.timestamp)
            .header("ACCESS-NONCE", &stamp.nonce)
            .header("ACCESS-PASSPHRASE", credentials.passphrase())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ExecutorError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExecutorError::Transport(format!("Failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(ExecutorError::Transport(format!("HTTP {status}: {text}")));
        }
        Ok(text)
    }
}
