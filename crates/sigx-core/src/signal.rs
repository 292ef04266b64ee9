//! Trade signal handed to the engine by the (external) parser.

use crate::error::{CoreError, Result};
use crate::order::OrderSide;
use crate::Price;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "LONG", alias = "long", alias = "Long")]
    Long,
    #[serde(rename = "SHORT", alias = "short", alias = "Short")]
    Short,
}

impl Direction {
    /// Entry side: buy for LONG, sell for SHORT.
    pub fn side(&self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Buy,
            Self::Short => OrderSide::Sell,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(Self::Long),
            "SHORT" => Ok(Self::Short),
            other => Err(CoreError::InvalidSignal(format!(
                "unknown direction '{other}'"
            ))),
        }
    }
}

/// A normalized trade signal.
///
/// Field names follow the parser's output (`trade_type`, `entry`) so a
/// parsed message deserializes directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    #[serde(alias = "trade_type")]
    pub direction: Direction,
    /// Quoted entry prices, in message order.
    #[serde(alias = "entry")]
    pub entries: Vec<Price>,
    /// Target prices, in message order. The first one is the take-profit.
    pub targets: Vec<Price>,
    #[serde(default)]
    pub stoploss: Option<Price>,
}

impl Signal {
    pub fn new(
        ticker: impl Into<String>,
        direction: Direction,
        entries: Vec<Price>,
        targets: Vec<Price>,
        stoploss: Option<Price>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            direction,
            entries,
            targets,
            stoploss,
        }
    }

    /// Check completeness and positivity before any arithmetic.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(CoreError::InvalidSignal("ticker is empty".to_string()));
        }
        if self.entries.is_empty() {
            return Err(CoreError::InvalidSignal("no entry prices".to_string()));
        }
        if self.targets.is_empty() {
            return Err(CoreError::InvalidSignal("no target prices".to_string()));
        }
        let stoploss = self
            .stoploss
            .ok_or_else(|| CoreError::InvalidSignal("no stop loss".to_string()))?;

        let all_positive = self
            .entries
            .iter()
            .chain(self.targets.iter())
            .chain(std::iter::once(&stoploss))
            .all(Price::is_positive);
        if !all_positive {
            return Err(CoreError::InvalidSignal(
                "prices must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Least optimistic quoted entry: highest for LONG, lowest for SHORT.
    pub fn entry_price(&self) -> Option<Price> {
        match self.direction {
            Direction::Long => self.entries.iter().max().copied(),
            Direction::Short => self.entries.iter().min().copied(),
        }
    }

    /// First listed target, regardless of how extreme later targets are.
    pub fn take_profit(&self) -> Option<Price> {
        self.targets.first().copied()
    }

    /// Exchange instrument id, e.g. `SOL` + `USDT` -> `SOL-USDT`.
    pub fn instrument_id(&self, quote_currency: &str) -> String {
        format!("{}-{}", self.ticker.trim().to_uppercase(), quote_currency)
    }
}
