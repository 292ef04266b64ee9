//! Instrument quantization constants.

use crate::error::{CoreError, Result};
use crate::{Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-instrument constants needed before sizing.
///
/// All three increments are strictly positive; construction enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentMeta {
    /// Exchange instrument id (e.g. "SOL-USDT").
    pub inst_id: String,
    /// Minimum price increment.
    pub tick_size: Price,
    /// Minimum size increment (contracts).
    pub lot_size: Size,
    /// Units of underlying per contract.
    pub contract_value: Decimal,
}

impl InstrumentMeta {
    pub fn new(
        inst_id: impl Into<String>,
        tick_size: Price,
        lot_size: Size,
        contract_value: Decimal,
    ) -> Result<Self> {
        let inst_id = inst_id.into();
        if !tick_size.is_positive() {
            return Err(CoreError::InvalidInstrument(format!(
                "{inst_id}: tick_size must be positive, got {tick_size}"
            )));
        }
        if !lot_size.is_positive() {
            return Err(CoreError::InvalidInstrument(format!(
                "{inst_id}: lot_size must be positive, got {lot_size}"
            )));
        }
        if contract_value <= Decimal::ZERO {
            return Err(CoreError::InvalidInstrument(format!(
                "{inst_id}: contract_value must be positive, got {contract_value}"
            )));
        }
        Ok(Self {
            inst_id,
            tick_size,
            lot_size,
            contract_value,
        })
    }
}
