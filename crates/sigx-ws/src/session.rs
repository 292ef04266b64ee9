//! Authenticated private stream session.
//!
//! One session owns one socket: connect, log in, subscribe, then read
//! classified events until the server closes or the caller closes.

use crate::error::{WsError, WsResult};
use crate::message::{ChannelArg, EventMessage, LoginArgs, StreamEvent, WsRequest};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Private WebSocket URL.
    pub url: String,
    /// How long to wait for the login reply.
    pub login_timeout: Duration,
    /// How long to wait for a subscribe ack.
    pub subscribe_timeout: Duration,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            login_timeout: Duration::from_secs(5),
            subscribe_timeout: Duration::from_secs(5),
        }
    }
}

/// A connected private stream.
pub struct StreamSession {
    config: SessionConfig,
    stream: WsStream,
    /// Frames that arrived while waiting for a control reply.
    pending: VecDeque<StreamEvent>,
    authenticated: bool,
    close_frame: Option<(u16, String)>,
}

impl StreamSession {
    /// Open the socket. No frames are sent.
    pub async fn connect(config: SessionConfig) -> WsResult<Self> {
        info!(url = %config.url, "Connecting to WebSocket");

        // TCP_NODELAY on; confirmations are latency-sensitive
        let (stream, _response) = connect_async_tls_with_config(&config.url, None, true, None)
            .await
            .map_err(|e| WsError::ConnectionFailed(format!("{}: {e}", config.url)))?;

        info!("WebSocket connected");
        Ok(Self {
            config,
            stream,
            pending: VecDeque::new(),
            authenticated: false,
            close_frame: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Send the signed login frame and wait for exactly one reply.
    ///
    /// # Errors
    /// - `AuthFailed` when the reply is not a successful `login` event
    /// - `Timeout` when no reply arrives within `login_timeout`
    pub async fn login(&mut self, args: LoginArgs) -> WsResult<()> {
        self.send_json(&WsRequest::login(args)).await?;

        let reply = self
            .await_event("login reply", self.config.login_timeout)
            .await?;
        if !reply.is_success_for("login") {
            warn!(
                event = %reply.event,
                code = ?reply.code,
                msg = ?reply.msg,
                "Stream login rejected"
            );
            return Err(WsError::AuthFailed {
                code: reply.code_or_default(),
                message: reply.msg_or_default(),
            });
        }

        self.authenticated = true;
        info!("Stream login acknowledged");
        Ok(())
    }

    /// Subscribe to one channel and wait for its ack.
    pub async fn subscribe(&mut self, arg: ChannelArg) -> WsResult<()> {
        debug!(channel = %arg.channel, inst_id = ?arg.inst_id, "Subscribing");
        self.send_json(&WsRequest::subscribe(arg.clone())).await?;

        let reply = self
            .await_event("subscribe ack", self.config.subscribe_timeout)
            .await?;
        if reply.is_success_for("subscribe") {
            info!(channel = %arg.channel, inst_id = ?arg.inst_id, "Subscription acknowledged");
            return Ok(());
        }

        let message = if reply.is_error() {
            reply.msg_or_default()
        } else {
            format!("unexpected {} reply", reply.event)
        };
        Err(WsError::SubscriptionFailed {
            code: reply.code_or_default(),
            message,
        })
    }

    /// Next classified event, or `None` once the connection is closed.
    pub async fn next_event(&mut self) -> WsResult<Option<StreamEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        self.read_event().await
    }

    /// Application-level heartbeat. The server answers with text `pong`.
    pub async fn ping(&mut self) -> WsResult<()> {
        self.stream
            .send(Message::Text("ping".to_string()))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    /// Send a Close frame and flush. Already-closed sockets are fine.
    pub async fn close(mut self) -> WsResult<()> {
        match self.stream.close(None).await {
            Ok(()) => {
                debug!("WebSocket closed");
                Ok(())
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn send_json<T: Serialize>(&mut self, request: &T) -> WsResult<()> {
        let text = serde_json::to_string(request)?;
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    /// Wait for the next control event, parking data pushes for `next_event`.
    async fn await_event(&mut self, what: &str, timeout: Duration) -> WsResult<EventMessage> {
        let wait = async {
            loop {
                match self.read_event().await {
                    Err(e) => return Err(e),
                    Ok(Some(StreamEvent::Event(event))) => return Ok(event),
                    Ok(Some(StreamEvent::Pong)) => {}
                    Ok(Some(other)) => self.pending.push_back(other),
                    Ok(None) => {
                        let (code, reason) = self
                            .close_frame
                            .clone()
                            .unwrap_or((1006, "stream ended".to_string()));
                        return Err(WsError::ConnectionClosed { code, reason });
                    }
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(WsError::Timeout(what.to_string())),
        }
    }

    async fn read_event(&mut self) -> WsResult<Option<StreamEvent>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return StreamEvent::parse(&text)
                        .map(Some)
                        .map_err(|e| WsError::ParseError(format!("{e}: {text}")));
                }
                Some(Ok(Message::Ping(data))) => {
                    debug!("Received ping, sending pong");
                    self.stream.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason): (u16, String) = frame
                        .map(|f| (f.code.into(), f.reason.to_string()))
                        .unwrap_or((1000, "Normal close".to_string()));
                    warn!(code, %reason, "WebSocket closed by server");
                    self.close_frame = Some((code, reason));
                    return Ok(None);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => {
                    debug!("WebSocket stream ended");
                    return Ok(None);
                }
            }
        }
    }
}
