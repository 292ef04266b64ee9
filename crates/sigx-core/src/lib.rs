//! Core domain types for the sigx signal execution engine.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Price`, `Size`: precision-safe numeric types with exchange quantization
//! - `Signal`, `Direction`: the validated trade signal handed to the engine
//! - `InstrumentMeta`: per-instrument quantization constants
//! - `OrderLeg`, `OrderRecord`: sized legs and their submission outcome
//! - `ErrorKind`: the error taxonomy callers branch on

pub mod decimal;
pub mod error;
pub mod instrument;
pub mod leg;
pub mod order;
pub mod signal;

pub use decimal::{quantize, Price, Size, QUANTIZE_DP};
pub use error::{CoreError, ErrorKind, Result};
pub use instrument::InstrumentMeta;
pub use leg::{LegRole, OrderLeg, OrderRecord, SubmissionStatus};
pub use order::{ClientOrderId, MarginMode, OrderSide, OrderType, PositionSide};
pub use signal::{Direction, Signal};
