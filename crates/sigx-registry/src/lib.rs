//! Instrument metadata resolution for sigx.
//!
//! Fetches per-instrument quantization constants (tick size, lot size,
//! contract value) from the exchange's public catalog, and optionally
//! caches them with explicit invalidation.

pub mod cache;
pub mod client;
pub mod error;
pub mod rest;

pub use cache::InstrumentCache;
pub use client::{InstrumentClient, RawInstrument, INSTRUMENTS_PATH};
pub use error::{RegistryError, RegistryResult};
pub use rest::{optional_code_as_string, ApiResponse, SUCCESS_CODE};
