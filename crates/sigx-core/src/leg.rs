//! Sized order legs and their submission records.

use crate::order::{ClientOrderId, MarginMode, OrderSide, PositionSide};
use crate::{Price, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which half of a split position a leg is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegRole {
    /// Carries the take-profit at the first target.
    TakeProfit,
    /// Stop-only remainder that rides until stopped out.
    Runner,
}

impl fmt::Display for LegRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TakeProfit => write!(f, "take_profit"),
            Self::Runner => write!(f, "runner"),
        }
    }
}

/// One independently submitted limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLeg {
    pub role: LegRole,
    pub side: OrderSide,
    /// Limit price, quantized to tick size.
    pub price: Price,
    /// Contracts, quantized to lot size. Always > 0.
    pub size: Size,
    pub stop_loss: Price,
    /// None for a stop-only leg.
    pub take_profit: Option<Price>,
    pub leverage: u32,
    pub margin_mode: MarginMode,
    pub position_side: PositionSide,
    pub client_order_id: ClientOrderId,
}

impl OrderLeg {
    pub fn is_stop_only(&self) -> bool {
        self.take_profit.is_none()
    }
}

/// Outcome of submitting a single leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    Rejected { reason: String },
}

/// A leg together with the identifier the exchange assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub leg: OrderLeg,
    /// Opaque exchange order id. Absent when the leg was rejected.
    pub order_id: Option<String>,
    pub status: SubmissionStatus,
}

impl OrderRecord {
    pub fn submitted(leg: OrderLeg, order_id: String) -> Self {
        Self {
            leg,
            order_id: Some(order_id),
            status: SubmissionStatus::Submitted,
        }
    }

    pub fn rejected(leg: OrderLeg, reason: impl Into<String>) -> Self {
        Self {
            leg,
            order_id: None,
            status: SubmissionStatus::Rejected {
                reason: reason.into(),
            },
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.status, SubmissionStatus::Submitted)
    }
}
