//! sigx: signal execution engine.
//!
//! Turns a parsed trade signal into sized, signed margin orders and waits
//! for the exchange's private stream to confirm them:
//! - Instrument metadata resolution
//! - Position sizing and leg splitting
//! - Leverage setup and order placement
//! - Authenticated stream session and confirmation tracking

pub mod app;
pub mod config;
pub mod error;

pub use app::{
    ExecutionOrchestrator, ExecutionOutcome, ExecutionPlan, ExecutionPlanner, ExecutionReport,
};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
