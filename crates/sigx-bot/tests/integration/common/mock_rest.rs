//! REST half of the mock exchange.

use super::{ExchangeState, RecordedRequest};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use sigx_executor::{ORDER_PATH, SET_LEVERAGE_PATH};
use sigx_registry::INSTRUMENTS_PATH;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

type Shared = Arc<ExchangeState>;

fn record(state: &ExchangeState, method: &str, path: &str, body: String) {
    state.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: path.to_string(),
        body,
    });
}

async fn instruments(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let inst_id = params.get("instId").cloned().unwrap_or_default();
    record(&state, "GET", INSTRUMENTS_PATH, inst_id.clone());

    let data = if inst_id == "SOL-USDT" {
        json!([{
            "instId": "SOL-USDT",
            "instType": "SWAP",
            "tickSize": "0.01",
            "lotSize": "1",
            "contractValue": "1",
            "maxLeverage": "50"
        }])
    } else {
        json!([])
    };
    Json(json!({"code": "0", "msg": "success", "data": data}))
}

async fn set_leverage(State(state): State<Shared>, body: String) -> Json<Value> {
    record(&state, "POST", SET_LEVERAGE_PATH, body.clone());
    if state.behavior.reject_leverage {
        return Json(json!({"code": "152406", "msg": "Leverage exceeds the maximum"}));
    }
    let parsed: Value = serde_json::from_str(&body).unwrap_or_default();
    Json(json!({"code": "0", "msg": "success", "data": parsed}))
}

async fn place_order(State(state): State<Shared>, body: String) -> Json<Value> {
    record(&state, "POST", ORDER_PATH, body.clone());
    let n = state.next_order_number();

    if state.behavior.reject_order == Some(n) {
        return Json(json!({
            "code": "1",
            "msg": "All operations failed",
            "data": [{"orderId": null, "code": "102015", "msg": "Insufficient margin"}]
        }));
    }

    let parsed: Value = serde_json::from_str(&body).unwrap_or_default();
    let inst_id = parsed["instId"].as_str().unwrap_or_default().to_string();
    let order_id = format!("7000{n}");

    if state.behavior.silent_order != Some(n) {
        // Another execution's order first; the tracker must skip it.
        state.push_order_update(&format!("9900{n}"), &inst_id);
        state.push_order_update(&order_id, &inst_id);
    }

    Json(json!({
        "code": "0",
        "msg": "",
        "data": [{
            "orderId": order_id,
            "clientOrderId": parsed["clientOrderId"],
            "code": "0",
            "msg": "full"
        }]
    }))
}

/// Serve the REST endpoints; returns the base URL.
pub async fn start(state: Shared) -> String {
    let router = Router::new()
        .route(INSTRUMENTS_PATH, get(instruments))
        .route(SET_LEVERAGE_PATH, post(set_leverage))
        .route(ORDER_PATH, post(place_order))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
