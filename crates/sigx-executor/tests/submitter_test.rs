//! OrderSubmitter against a mock REST exchange.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use sigx_core::{
    ClientOrderId, ErrorKind, LegRole, MarginMode, OrderLeg, OrderSide, PositionSide, Price, Size,
};
use sigx_executor::{
    ApiCredentials, ExecutorError, OrderSubmitter, RequestSigner, ORDER_PATH, SET_LEVERAGE_PATH,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    headers: HeaderMap,
    body: String,
}

#[derive(Clone, Default)]
struct Exchange {
    requests: Arc<Mutex<Vec<Recorded>>>,
    /// Per-order response override.
    order_reply: Arc<Mutex<Option<(StatusCode, String)>>>,
}

async fn order(
    State(exchange): State<Exchange>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let n = {
        let mut requests = exchange.requests.lock();
        requests.push(Recorded {
            path: ORDER_PATH.to_string(),
            headers,
            body,
        });
        requests.len()
    };
    if let Some(reply) = exchange.order_reply.lock().clone() {
        return reply;
    }
    (
        StatusCode::OK,
        serde_json::json!({
            "code": "0",
            "msg": "",
            "data": [{"orderId": format!("9000{n}"), "code": "0", "msg": ""}]
        })
        .to_string(),
    )
}

async fn set_leverage(
    State(exchange): State<Exchange>,
    headers: HeaderMap,
    body: String,
) -> Json<serde_json::Value> {
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    exchange.requests.lock().push(Recorded {
        path: SET_LEVERAGE_PATH.to_string(),
        headers,
        body,
    });
    if parsed["leverage"] == "150" {
        return Json(serde_json::json!({"code": "152406", "msg": "leverage too high"}));
    }
    Json(serde_json::json!({"code": "0", "msg": "success", "data": parsed}))
}

async fn start(exchange: Exchange) -> String {
    let router = Router::new()
        .route(ORDER_PATH, post(order))
        .route(SET_LEVERAGE_PATH, post(set_leverage))
        .with_state(exchange);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn signer() -> Arc<RequestSigner> {
    Arc::new(RequestSigner::new(ApiCredentials::new("key-1", "secret-1", "phrase-1")).unwrap())
}

fn leg(role: LegRole, take_profit: Option<Price>) -> OrderLeg {
    OrderLeg {
        role,
        side: OrderSide::Sell,
        price: Price::new(dec!(121)),
        size: Size::new(dec!(2)),
        stop_loss: Price::new(dec!(130)),
        take_profit,
        leverage: 5,
        margin_mode: MarginMode::Cross,
        position_side: PositionSide::Net,
        client_order_id: ClientOrderId::new(),
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_submit_signs_exact_body() {
    let exchange = Exchange::default();
    let url = start(exchange.clone()).await;
    let signer = signer();
    let submitter = OrderSubmitter::new(&url, signer.clone()).unwrap();

    let order_id = submitter
        .submit(&leg(LegRole::TakeProfit, Some(Price::new(dec!(110)))), "SOL-USDT")
        .await
        .unwrap();
    assert_eq!(order_id, "90001");

    let recorded = exchange.requests.lock()[0].clone();
    let h = &recorded.headers;
    assert_eq!(header(h, "ACCESS-KEY"), "key-1");
    assert_eq!(header(h, "ACCESS-PASSPHRASE"), "phrase-1");
    assert_eq!(header(h, "content-type"), "application/json");

    let expected = signer
        .sign(
            ORDER_PATH,
            "POST",
            header(h, "ACCESS-TIMESTAMP"),
            header(h, "ACCESS-NONCE"),
            &recorded.body,
        )
        .unwrap();
    assert_eq!(header(h, "ACCESS-SIGN"), expected);

    let body: serde_json::Value = serde_json::from_str(&recorded.body).unwrap();
    assert_eq!(body["instId"], "SOL-USDT");
    assert_eq!(body["side"], "sell");
    assert_eq!(body["tpTriggerPrice"], "110");
    assert_eq!(body["positionSide"], "net");
}

#[tokio::test]
async fn test_sequential_legs_get_distinct_nonces() {
    let exchange = Exchange::default();
    let url = start(exchange.clone()).await;
    let submitter = OrderSubmitter::new(&url, signer()).unwrap();

    let a = submitter
        .submit(&leg(LegRole::TakeProfit, Some(Price::new(dec!(110)))), "SOL-USDT")
        .await
        .unwrap();
    let b = submitter
        .submit(&leg(LegRole::Runner, None), "SOL-USDT")
        .await
        .unwrap();
    assert_ne!(a, b);

    let requests = exchange.requests.lock().clone();
    let nonce = |i: usize| header(&requests[i].headers, "ACCESS-NONCE").to_string();
    assert_ne!(nonce(0), nonce(1));

    let runner: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert!(runner.get("tpTriggerPrice").is_none());
}

#[tokio::test]
async fn test_rejection_is_not_retryable() {
    let exchange = Exchange::default();
    *exchange.order_reply.lock() = Some((
        StatusCode::OK,
        r#"{"code":"0","msg":"","data":[{"orderId":"","code":"102015","msg":"Price out of range"}]}"#
            .to_string(),
    ));
    let url = start(exchange.clone()).await;
    let submitter = OrderSubmitter::new(&url, signer()).unwrap();

    let err = submitter
        .submit(&leg(LegRole::TakeProfit, None), "SOL-USDT")
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::ExchangeRejected { ref code, .. } if code == "102015"));
    assert!(!err.kind().is_retryable());
    assert_eq!(exchange.requests.lock().len(), 1, "no automatic retry");
}

#[tokio::test]
async fn test_http_error_is_transport() {
    let exchange = Exchange::default();
    *exchange.order_reply.lock() = Some((StatusCode::BAD_GATEWAY, "upstream down".to_string()));
    let url = start(exchange.clone()).await;
    let submitter = OrderSubmitter::new(&url, signer()).unwrap();

    let err = submitter
        .submit(&leg(LegRole::TakeProfit, None), "SOL-USDT")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(exchange.requests.lock().len(), 1);
}

#[tokio::test]
async fn test_set_leverage() {
    let exchange = Exchange::default();
    let url = start(exchange.clone()).await;
    let submitter = OrderSubmitter::new(&url, signer()).unwrap();

    tokio_test::assert_ok!(submitter.set_leverage("SOL-USDT", 5).await);
    let recorded = exchange.requests.lock()[0].clone();
    assert_eq!(
        recorded.body,
        r#"{"instId":"SOL-USDT","leverage":"5","marginMode":"cross"}"#
    );

    let err = submitter.set_leverage("SOL-USDT", 150).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExchangeRejected);
}
