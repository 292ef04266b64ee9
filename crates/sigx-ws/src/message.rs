//! WebSocket message types.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Private order channel.
pub const ORDERS_CHANNEL: &str = "orders";

/// Success code in `login` / `subscribe` replies.
pub const SUCCESS_CODE: &str = "0";

// ============================================================================
// Outgoing
// ============================================================================

/// `{op, args}` request frame.
#[derive(Debug, Clone, Serialize)]
pub struct WsRequest<A> {
    pub op: String,
    pub args: Vec<A>,
}

impl WsRequest<LoginArgs> {
    pub fn login(args: LoginArgs) -> Self {
        Self {
            op: "login".to_string(),
            args: vec![args],
        }
    }
}

impl WsRequest<ChannelArg> {
    pub fn subscribe(arg: ChannelArg) -> Self {
        Self {
            op: "subscribe".to_string(),
            args: vec![arg],
        }
    }
}

/// Signed login arguments.
///
/// Built by the signer; the session only transports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginArgs {
    pub api_key: String,
    pub passphrase: String,
    pub timestamp: String,
    pub sign: String,
    pub nonce: String,
}

/// Channel selector used in subscribe requests and echoed back in pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelArg {
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_id: Option<String>,
}

impl ChannelArg {
    pub fn orders(inst_id: impl Into<String>) -> Self {
        Self {
            channel: ORDERS_CHANNEL.to_string(),
            inst_id: Some(inst_id.into()),
        }
    }
}

// ============================================================================
// Incoming
// ============================================================================

/// Control reply: `login`, `subscribe` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventMessage {
    pub event: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub arg: Option<ChannelArg>,
}

impl EventMessage {
    /// `true` when the reply is `event` and carries no failing code.
    ///
    /// Subscribe acks omit `code` entirely; login replies always send one.
    pub fn is_success_for(&self, event: &str) -> bool {
        self.event == event && self.code.as_deref().map_or(true, |c| c == SUCCESS_CODE)
    }

    pub fn is_error(&self) -> bool {
        self.event == "error"
    }

    pub fn code_or_default(&self) -> String {
        self.code.clone().unwrap_or_default()
    }

    pub fn msg_or_default(&self) -> String {
        self.msg.clone().unwrap_or_default()
    }
}

/// Push action on a data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushAction {
    Snapshot,
    Update,
}

/// One element of an `orders` push.
///
/// Only `orderId` is required. The rest of the payload is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[serde(deserialize_with = "string_or_number")]
    pub order_id: String,
    #[serde(default)]
    pub inst_id: Option<String>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Raw data push before the channel is inspected.
///
/// Order updates may arrive without `arg`; those belong to `orders`.
#[derive(Debug, Clone, Deserialize)]
struct PushFrame {
    #[serde(default)]
    action: Option<PushAction>,
    #[serde(default)]
    arg: Option<ChannelArg>,
    data: serde_json::Value,
}

/// Classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Text "pong" heartbeat reply.
    Pong,
    /// Control reply.
    Event(EventMessage),
    /// Push on the `orders` channel.
    Orders {
        action: PushAction,
        inst_id: Option<String>,
        orders: Vec<OrderUpdate>,
    },
    /// Push on any other channel, left undecoded.
    Push {
        channel: String,
        data: serde_json::Value,
    },
}

impl StreamEvent {
    /// Classify one text frame.
    ///
    /// Elements of an `orders` push without a usable `orderId` are skipped;
    /// the rest of the frame is kept.
    ///
    /// # Errors
    /// Returns a JSON error when the frame is neither `pong` nor a known
    /// envelope, or when an `orders` push carries no `data` array.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        if text == "pong" {
            return Ok(Self::Pong);
        }

        let value: serde_json::Value = serde_json::from_str(text)?;
        if value.get("event").is_some() {
            return serde_json::from_value(value).map(Self::Event);
        }

        let frame: PushFrame = serde_json::from_value(value)?;
        match frame.arg {
            Some(arg) if arg.channel != ORDERS_CHANNEL => Ok(Self::Push {
                channel: arg.channel,
                data: frame.data,
            }),
            arg => {
                let elements: Vec<serde_json::Value> = serde_json::from_value(frame.data)?;
                let orders = elements
                    .into_iter()
                    .filter_map(|element| match serde_json::from_value(element) {
                        Ok(update) => Some(update),
                        Err(e) => {
                            debug!(error = %e, "Skipping order push element");
                            None
                        }
                    })
                    .collect();
                Ok(Self::Orders {
                    // Blofin omits `action` on some order pushes; treat as update
                    action: frame.action.unwrap_or(PushAction::Update),
                    inst_id: arg.and_then(|a| a.inst_id),
                    orders,
                })
            }
        }
    }

    /// Order ids carried by an `orders` update push. Empty otherwise.
    pub fn updated_order_ids(&self) -> impl Iterator<Item = &str> {
        let orders: &[OrderUpdate] = match self {
            Self::Orders {
                action: PushAction::Update,
                orders,
                ..
            } => orders,
            _ => &[],
        };
        orders.iter().map(|o| o.order_id.as_str())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
