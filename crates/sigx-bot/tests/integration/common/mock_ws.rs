//! Private stream half of the mock exchange.
//!
//! Each connection:
//! - Answers `login` (success or error per behavior)
//! - Acks `subscribe` and from then on forwards order pushes
//! - Replies `pong` to text `ping`
//! - Records every text frame it receives

use super::ExchangeState;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Accept stream connections; returns the `ws://` URL.
pub async fn start(state: Arc<ExchangeState>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_connection(stream, state.clone()));
        }
    });

    format!("ws://{addr}")
}

async fn handle_connection(stream: TcpStream, state: Arc<ExchangeState>) {
    state.ws_connections.fetch_add(1, Ordering::SeqCst);
    // Subscribe before the handshake so no push after the subscribe ack is missed.
    let mut pushes = state.subscribe_pushes();

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {e}");
            return;
        }
    };
    let (mut write, mut read) = ws_stream.split();
    let mut subscribed = false;

    loop {
        tokio::select! {
            msg = read.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                state.ws_frames.lock().push(text.clone());

                if text == "ping" {
                    let _ = write.send(Message::Text("pong".to_string())).await;
                    continue;
                }

                let Ok(request) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                let reply = match request["op"].as_str() {
                    Some("login") if state.behavior.reject_login => json!({
                        "event": "error",
                        "code": "152409",
                        "msg": "Signature verification failed"
                    }),
                    Some("login") => json!({"event": "login", "code": "0", "msg": ""}),
                    Some("subscribe") => {
                        subscribed = true;
                        json!({"event": "subscribe", "arg": request["args"][0]})
                    }
                    _ => continue,
                };
                if write.send(Message::Text(reply.to_string())).await.is_err() {
                    break;
                }
            }

            push = pushes.recv() => {
                let Ok(frame) = push else { break };
                if subscribed && write.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
        }
    }
}
