//! Private WebSocket stream for order confirmations.
//!
//! Provides:
//! - `StreamSession`: connect, signed login, channel subscription
//! - `StreamEvent`: classified inbound frames (control replies, order pushes)
//! - `spawn_reader`: single-owner background reader forwarding events

pub mod error;
pub mod message;
pub mod reader;
pub mod session;

pub use error::{WsError, WsResult};
pub use message::{
    ChannelArg, EventMessage, LoginArgs, OrderUpdate, PushAction, StreamEvent, WsRequest,
    ORDERS_CHANNEL,
};
pub use reader::{spawn_reader, spawn_reader_with_heartbeat, EventStream, HEARTBEAT_INTERVAL};
pub use session::{SessionConfig, StreamSession};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
