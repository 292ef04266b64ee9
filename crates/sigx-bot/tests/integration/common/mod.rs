//! Mock exchange: REST endpoints plus the private stream, sharing one
//! order book so accepted orders are pushed to stream subscribers.

pub mod mock_rest;
pub mod mock_ws;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Knobs for one test run.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub reject_leverage: bool,
    pub reject_login: bool,
    /// 1-based order number answered with an item-level rejection.
    pub reject_order: Option<usize>,
    /// 1-based order number accepted but never pushed on the stream.
    pub silent_order: Option<usize>,
}

/// A request the REST side received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

pub struct ExchangeState {
    pub behavior: Behavior,
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub ws_frames: Mutex<Vec<String>>,
    pub ws_connections: AtomicUsize,
    order_count: AtomicUsize,
    pushes: broadcast::Sender<String>,
}

impl ExchangeState {
    fn new(behavior: Behavior) -> Self {
        let (pushes, _) = broadcast::channel(64);
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
            ws_frames: Mutex::new(Vec::new()),
            ws_connections: AtomicUsize::new(0),
            order_count: AtomicUsize::new(0),
            pushes,
        }
    }

    pub fn next_order_number(&self) -> usize {
        self.order_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Push an `orders` update to every subscribed stream connection.
    pub fn push_order_update(&self, order_id: &str, inst_id: &str) {
        let frame = serde_json::json!({
            "action": "update",
            "arg": {"channel": "orders", "instId": inst_id},
            "data": [{"orderId": order_id, "instId": inst_id, "state": "live"}]
        });
        let _ = self.pushes.send(frame.to_string());
    }

    pub fn subscribe_pushes(&self) -> broadcast::Receiver<String> {
        self.pushes.subscribe()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

pub struct MockExchange {
    pub state: Arc<ExchangeState>,
    pub rest_url: String,
    pub ws_url: String,
}

impl MockExchange {
    pub async fn start(behavior: Behavior) -> Self {
        let state = Arc::new(ExchangeState::new(behavior));
        let rest_url = mock_rest::start(state.clone()).await;
        let ws_url = mock_ws::start(state.clone()).await;
        Self {
            state,
            rest_url,
            ws_url,
        }
    }

    pub fn ws_connection_count(&self) -> usize {
        self.state.ws_connections.load(Ordering::SeqCst)
    }
}
