//! Background reader that owns a session and forwards its events.
//!
//! The session is moved into the task, so exactly one consumer ever reads
//! the socket. Shutdown cancels the task and closes the socket.

use crate::error::WsError;
use crate::message::StreamEvent;
use crate::session::StreamSession;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Blofin drops idle private sockets after 30s without a ping.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// Receiving end of a spawned reader.
pub struct EventStream {
    rx: mpsc::Receiver<StreamEvent>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl EventStream {
    /// Next forwarded event. `None` once the reader has stopped.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Direct access to the channel for consumers that select on it.
    pub fn receiver(&mut self) -> &mut mpsc::Receiver<StreamEvent> {
        &mut self.rx
    }

    /// Stop the reader and wait for the socket to be closed.
    pub async fn shutdown(self) {
        let Self {
            rx,
            shutdown,
            handle,
        } = self;
        shutdown.cancel();
        // Unblocks a reader parked on a full channel
        drop(rx);
        if let Err(e) = handle.await {
            warn!(?e, "Stream reader task panicked");
        }
    }
}

/// Move `session` into a task that forwards every event into a bounded channel.
pub fn spawn_reader(session: StreamSession, buffer: usize) -> EventStream {
    spawn_reader_with_heartbeat(session, buffer, HEARTBEAT_INTERVAL)
}

pub fn spawn_reader_with_heartbeat(
    session: StreamSession,
    buffer: usize,
    heartbeat: Duration,
) -> EventStream {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(run_reader(session, tx, shutdown.clone(), heartbeat));
    EventStream {
        rx,
        shutdown,
        handle,
    }
}

async fn run_reader(
    mut session: StreamSession,
    tx: mpsc::Sender<StreamEvent>,
    shutdown: CancellationToken,
    heartbeat: Duration,
) {
    let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                debug!("Stream reader shutdown requested");
                break;
            }

            event = session.next_event() => {
                match event {
                    Ok(Some(StreamEvent::Pong)) => {
                        debug!("Received pong");
                    }
                    Ok(Some(event)) => {
                        if tx.send(event).await.is_err() {
                            debug!("Event receiver dropped");
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Private stream closed");
                        break;
                    }
                    Err(WsError::ParseError(e)) => {
                        warn!(error = %e, "Skipping unparseable stream frame");
                    }
                    Err(e) => {
                        error!(?e, "Private stream read error");
                        break;
                    }
                }
            }

            _ = ticker.tick() => {
                if let Err(e) = session.ping().await {
                    error!(?e, "Failed to send heartbeat ping");
                    break;
                }
                debug!("Sent heartbeat ping");
            }
        }
    }

    if let Err(e) = session.close().await {
        warn!(?e, "Failed to close private stream");
    }
}
