//! Position sizing and leg splitting.
//!
//! Notional = budget × leverage. Contracts = notional / (entry × contract value),
//! snapped to the lot size. In split mode the total becomes a take-profit leg
//! and a stop-only runner of (roughly) equal size.

use crate::error::ExecutorResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sigx_core::{
    ClientOrderId, CoreError, InstrumentMeta, LegRole, MarginMode, OrderLeg, PositionSide, Price,
    Signal, Size,
};
use tracing::debug;

/// How a sized position is turned into legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegMode {
    /// Take-profit leg plus stop-only runner.
    #[default]
    Split,
    /// One leg carrying the full size and the take-profit.
    Single,
}

/// Split `total` into a take-profit half and a runner.
///
/// - half = quantize(total / 2); if it rounds to zero the position collapses
///   to one leg of quantize(total)
/// - runner = quantize(total - half); dropped when it rounds to zero
///
/// # Errors
/// `InvalidSize` when even the collapsed leg rounds to zero.
pub fn split_size(total: Size, lot_size: Size) -> ExecutorResult<(Size, Option<Size>)> {
    let half = Size::new(total.inner() / Decimal::TWO).quantize(lot_size);
    if !half.is_positive() {
        let full = total.quantize(lot_size);
        if !full.is_positive() {
            return Err(CoreError::InvalidSize(format!(
                "size {total} rounds to zero at lot size {lot_size}"
            ))
            .into());
        }
        return Ok((full, None));
    }

    let runner = (total - half).quantize(lot_size);
    if !runner.is_positive() {
        return Ok((half, None));
    }
    Ok((half, Some(runner)))
}

/// Converts a signal into quantized order legs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionSizer {
    leg_mode: LegMode,
}

impl PositionSizer {
    pub fn new(leg_mode: LegMode) -> Self {
        Self { leg_mode }
    }

    pub fn leg_mode(&self) -> LegMode {
        self.leg_mode
    }

    /// Size `signal` against `meta` for a USD budget at `leverage`.
    ///
    /// Legs are returned in submission order: take-profit leg first.
    ///
    /// # Errors
    /// `Validation` for an incomplete signal, a non-positive budget or
    /// leverage, or a price or size that rounds to zero. Nothing is computed before
    /// the signal is validated.
    pub fn size(
        &self,
        signal: &Signal,
        meta: &InstrumentMeta,
        usd_budget: Decimal,
        leverage: u32,
    ) -> ExecutorResult<Vec<OrderLeg>> {
        signal.validate()?;
        if usd_budget <= Decimal::ZERO {
            return Err(
                CoreError::InvalidSize(format!("budget must be positive, got {usd_budget}")).into(),
            );
        }
        if leverage == 0 {
            return Err(CoreError::InvalidSize("leverage must be positive".to_string()).into());
        }

        // validate() guarantees entries, targets and stoploss are present
        let (Some(entry), Some(take_profit), Some(stop_loss)) =
            (signal.entry_price(), signal.take_profit(), signal.stoploss)
        else {
            return Err(CoreError::InvalidSignal("incomplete signal".to_string()).into());
        };

        let price = entry.quantize(meta.tick_size);
        if !price.is_positive() {
            return Err(CoreError::InvalidSize(format!(
                "entry {entry} rounds to zero at tick size {}",
                meta.tick_size
            ))
            .into());
        }

        let total = total_size(price, meta, usd_budget, leverage);
        if !total.is_positive() {
            return Err(CoreError::InvalidSize(format!(
                "budget {usd_budget} x{leverage} buys less than one lot of {} at {price}",
                meta.inst_id
            ))
            .into());
        }

        let stop_loss = snap_trigger("stop-loss", stop_loss, meta.tick_size)?;
        let take_profit = snap_trigger("take-profit", take_profit, meta.tick_size)?;
        let side = signal.direction.side();

        let leg = |role: LegRole, size: Size, take_profit: Option<Price>| OrderLeg {
            role,
            side,
            price,
            size,
            stop_loss,
            take_profit,
            leverage,
            margin_mode: MarginMode::Cross,
            position_side: PositionSide::Net,
            client_order_id: ClientOrderId::new(),
        };

        let legs = match self.leg_mode {
            LegMode::Single => vec![leg(LegRole::TakeProfit, total, Some(take_profit))],
            LegMode::Split => match split_size(total, meta.lot_size)? {
                (first, Some(runner)) => vec![
                    leg(LegRole::TakeProfit, first, Some(take_profit)),
                    leg(LegRole::Runner, runner, None),
                ],
                (only, None) => vec![leg(LegRole::TakeProfit, only, Some(take_profit))],
            },
        };

        debug!(
            inst_id = %meta.inst_id,
            %side,
            %price,
            total = %total,
            legs = legs.len(),
            "Sized position"
        );
        Ok(legs)
    }
}

/// Contracts affordable at `price`, snapped to the lot size.
pub fn total_size(price: Price, meta: &InstrumentMeta, usd_budget: Decimal, leverage: u32) -> Size {
    let notional = usd_budget * Decimal::from(leverage);
    let cost_per_contract = price.inner() * meta.contract_value;
    if cost_per_contract.is_zero() {
        return Size::ZERO;
    }
    Size::new(notional / cost_per_contract).quantize(meta.lot_size)
}

fn snap_trigger(name: &str, trigger: Price, tick_size: Price) -> Result<Price, CoreError> {
    let snapped = trigger.quantize(tick_size);
    if !snapped.is_positive() {
        return Err(CoreError::InvalidSignal(format!(
            "{name} {trigger} rounds to zero at tick size {tick_size}"
        )));
    }
    Ok(snapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExecutorError;
    use rust_decimal_macros::dec;
    use sigx_core::{Direction, ErrorKind, OrderSide};

    fn sol_meta() -> InstrumentMeta {
        InstrumentMeta::new(
            "SOL-USDT",
            Price::new(dec!(0.01)),
            Size::new(dec!(0.1)),
            dec!(1),
        )
        .unwrap()
    }

    fn sol_long() -> Signal {
        Signal::new(
            "SOL",
            Direction::Long,
            vec![Price::new(dec!(122.34))],
            vec![Price::new(dec!(200))],
            Some(Price::new(dec!(80))),
        )
    }

    #[test]
    fn test_single_leg_long() {
        let legs = PositionSizer::new(LegMode::Single)
            .size(&sol_long(), &sol_meta(), dec!(100), 5)
            .unwrap();

        assert_eq!(legs.len(), 1);
        let leg = &legs[0];
        assert_eq!(leg.side, OrderSide::Buy);
        assert_eq!(leg.price, Price::new(dec!(122.34)));
        assert_eq!(leg.size, Size::new(dec!(4.1)));
        assert_eq!(leg.stop_loss, Price::new(dec!(80)));
        assert_eq!(leg.take_profit, Some(Price::new(dec!(200))));
        assert_eq!(leg.leverage, 5);
        assert_eq!(leg.margin_mode, MarginMode::Cross);
        assert_eq!(leg.position_side, PositionSide::Net);
    }

    #[test]
    fn test_split_legs_long() {
        let legs = PositionSizer::new(LegMode::Split)
            .size(&sol_long(), &sol_meta(), dec!(100), 5)
            .unwrap();

        // total 4.1 -> 2.05 rounds to 2.1, runner 2.0
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].role, LegRole::TakeProfit);
        assert_eq!(legs[0].size, Size::new(dec!(2.1)));
        assert_eq!(legs[0].take_profit, Some(Price::new(dec!(200))));
        assert_eq!(legs[1].role, LegRole::Runner);
        assert_eq!(legs[1].size, Size::new(dec!(2)));
        assert!(legs[1].is_stop_only());
        assert_eq!(legs[1].stop_loss, Price::new(dec!(80)));
        assert_ne!(legs[0].client_order_id, legs[1].client_order_id);
    }

    #[test]
    fn test_short_uses_lowest_entry_and_first_target() {
        let signal = Signal::new(
            "SOL",
            Direction::Short,
            vec![Price::new(dec!(125.005)), Price::new(dec!(121.004))],
            vec![Price::new(dec!(110)), Price::new(dec!(90))],
            Some(Price::new(dec!(130))),
        );
        let legs = PositionSizer::new(LegMode::Single)
            .size(&signal, &sol_meta(), dec!(100), 5)
            .unwrap();

        assert_eq!(legs[0].side, OrderSide::Sell);
        assert_eq!(legs[0].price, Price::new(dec!(121)));
        assert_eq!(legs[0].take_profit, Some(Price::new(dec!(110))));
    }

    #[test]
    fn test_long_uses_highest_entry() {
        let mut signal = sol_long();
        signal.entries = vec![Price::new(dec!(120)), Price::new(dec!(125))];
        let legs = PositionSizer::new(LegMode::Single)
            .size(&signal, &sol_meta(), dec!(100), 5)
            .unwrap();
        assert_eq!(legs[0].price, Price::new(dec!(125)));
        assert_eq!(legs[0].size, Size::new(dec!(4)));
    }

    #[test]
    fn test_contract_value_scales_size() {
        let meta =
            InstrumentMeta::new("BTC-USDT", Price::new(dec!(0.1)), Size::new(dec!(1)), dec!(0.001))
                .unwrap();
        let signal = Signal::new(
            "BTC",
            Direction::Long,
            vec![Price::new(dec!(50000))],
            vec![Price::new(dec!(55000))],
            Some(Price::new(dec!(48000))),
        );
        // 1000 / (50000 * 0.001) = 20 contracts
        let legs = PositionSizer::new(LegMode::Split)
            .size(&signal, &meta, dec!(100), 10)
            .unwrap();
        assert_eq!(legs[0].size, Size::new(dec!(10)));
        assert_eq!(legs[1].size, Size::new(dec!(10)));
    }

    #[test]
    fn test_split_even_and_odd() {
        let lot = Size::new(dec!(1));
        assert_eq!(
            split_size(Size::new(dec!(10.0)), lot).unwrap(),
            (Size::new(dec!(5)), Some(Size::new(dec!(5))))
        );
        assert_eq!(
            split_size(Size::new(dec!(9.3)), lot).unwrap(),
            (Size::new(dec!(5)), Some(Size::new(dec!(4))))
        );
    }

    #[test]
    fn test_split_collapses_when_half_rounds_to_zero() {
        let (only, runner) = split_size(Size::new(dec!(0.05)), Size::new(dec!(0.1))).unwrap();
        assert_eq!(only, Size::new(dec!(0.1)));
        assert!(runner.is_none());
        assert!(only.is_positive());
    }

    #[test]
    fn test_split_drops_runner_when_it_rounds_to_zero() {
        // half 0.6 -> 1, remainder 0.2 -> 0
        let (first, runner) = split_size(Size::new(dec!(1.2)), Size::new(dec!(1))).unwrap();
        assert_eq!(first, Size::new(dec!(1)));
        assert!(runner.is_none());
    }

    #[test]
    fn test_split_fails_when_everything_rounds_to_zero() {
        let err = split_size(Size::new(dec!(0.04)), Size::new(dec!(0.1))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_split_conserves_total_within_one_lot() {
        let lot = Size::new(dec!(0.1));
        for raw in [dec!(0.3), dec!(1.05), dec!(7.77), dec!(12.34), dec!(99.95)] {
            let total = Size::new(raw);
            let (a, b) = split_size(total, lot).unwrap();
            let sum = a.inner() + b.map(|s| s.inner()).unwrap_or_default();
            assert!((sum - raw).abs() <= lot.inner(), "raw={raw} sum={sum}");
        }
    }

    #[test]
    fn test_tiny_budget_is_validation_error() {
        let err = PositionSizer::default()
            .size(&sol_long(), &sol_meta(), dec!(0.01), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::Validation(CoreError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_trigger_rounding_to_zero_is_validation_error() {
        let mut signal = sol_long();
        signal.stoploss = Some(Price::new(dec!(0.004)));
        let err = PositionSizer::default()
            .size(&signal, &sol_meta(), dec!(100), 5)
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::Validation(CoreError::InvalidSignal(ref msg)) if msg.contains("stop-loss")
        ));

        let mut signal = sol_long();
        signal.targets = vec![Price::new(dec!(0.004))];
        let err = PositionSizer::default()
            .size(&signal, &sol_meta(), dec!(100), 5)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_incomplete_signal_fails_before_arithmetic() {
        let mut signal = sol_long();
        signal.targets.clear();
        let err = PositionSizer::default()
            .size(&signal, &sol_meta(), dec!(100), 5)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut signal = sol_long();
        signal.stoploss = None;
        assert!(PositionSizer::default()
            .size(&signal, &sol_meta(), dec!(100), 5)
            .is_err());
    }

    #[test]
    fn test_zero_leverage_rejected() {
        let err = PositionSizer::default()
            .size(&sol_long(), &sol_meta(), dec!(100), 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_leg_mode_serde() {
        let mode: LegMode = serde_json::from_str("\"single\"").unwrap();
        assert_eq!(mode, LegMode::Single);
        assert_eq!(LegMode::default(), LegMode::Split);
    }
}
