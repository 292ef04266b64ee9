//! Order execution for sigx.
//!
//! Turns a validated signal into signed exchange orders and confirms them
//! on the private stream.
//!
//! # Key Components
//!
//! - [`RequestSigner`]: HMAC request signing for REST and stream login
//! - [`NonceManager`]: unique, monotonic nonces for signed writes
//! - [`PositionSizer`]: notional sizing, quantization and leg splitting
//! - [`OrderSubmitter`]: set-leverage and order placement over REST
//! - [`ConfirmationTracker`]: bounded wait for order ids on the stream
//!
//! Nothing in this crate retries. Order placement is not idempotent.

pub mod confirmation;
pub mod error;
pub mod nonce;
pub mod signer;
pub mod sizer;
pub mod submitter;

pub use confirmation::{
    Confirmation, ConfirmationOutcome, ConfirmationSet, ConfirmationTracker,
    DEFAULT_CONFIRMATION_TIMEOUT,
};
pub use error::{ExecutorError, ExecutorResult};
pub use nonce::{Clock, NonceManager, RequestStamp, SystemClock};
pub use signer::{ApiCredentials, CredentialSource, RequestSigner, LOGIN_VERIFY_PATH};
pub use sizer::{split_size, total_size, LegMode, PositionSizer};
pub use submitter::{
    parse_leverage_ack, parse_order_ack, OrderAck, OrderRequest, OrderSubmitter,
    SetLeverageRequest, MARKET_ON_TRIGGER, ORDER_PATH, SET_LEVERAGE_PATH,
};
