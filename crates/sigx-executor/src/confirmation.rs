//! Confirmation tracking over the private order stream.
//!
//! A [`ConfirmationSet`] holds the ids one execution is waiting for. Events
//! for other ids are discarded; an id matches at most once and keeps the
//! payload of its first update. [`ConfirmationTracker::track`] drives a set
//! from an event channel until it is complete, the deadline passes, or the
//! stream goes away.

use serde::Serialize;
use sigx_ws::{OrderUpdate, PushAction, StreamEvent};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default bounded wait.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(10);

/// First update received for an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confirmation {
    pub order_id: String,
    pub payload: OrderUpdate,
    /// Time from tracking start to the match.
    pub latency: Duration,
}

/// Outstanding ids for one execution.
#[derive(Debug)]
pub struct ConfirmationSet {
    /// Ids in submission order.
    order_ids: Vec<String>,
    matched: HashMap<String, Confirmation>,
    started: Instant,
    deadline: Instant,
}

impl ConfirmationSet {
    pub fn new(order_ids: Vec<String>, timeout: Duration) -> Self {
        let mut unique = Vec::with_capacity(order_ids.len());
        for id in order_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        let started = Instant::now();
        Self {
            order_ids: unique,
            matched: HashMap::new(),
            started,
            deadline: started + timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_complete(&self) -> bool {
        self.matched.len() == self.order_ids.len()
    }

    /// Ids still waiting for an update, in submission order.
    pub fn remaining(&self) -> Vec<String> {
        self.order_ids
            .iter()
            .filter(|id| !self.matched.contains_key(*id))
            .cloned()
            .collect()
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    /// Feed one stream event. Returns how many ids it newly matched.
    ///
    /// Only `update` pushes on the orders channel can match.
    pub fn on_event(&mut self, event: &StreamEvent) -> usize {
        match event {
            StreamEvent::Orders {
                action: PushAction::Update,
                orders,
                ..
            } => orders.iter().filter(|u| self.on_update(u)).count(),
            _ => 0,
        }
    }

    /// Match a single order update. Returns `true` on a first match.
    pub fn on_update(&mut self, update: &OrderUpdate) -> bool {
        let id = &update.order_id;
        if !self.order_ids.contains(id) {
            debug!(order_id = %id, "Ignoring update for untracked order");
            return false;
        }
        if self.matched.contains_key(id) {
            debug!(order_id = %id, "Ignoring repeat update for confirmed order");
            return false;
        }

        let latency = self.started.elapsed();
        info!(
            order_id = %id,
            state = ?update.state,
            latency_ms = latency.as_millis() as u64,
            "Order confirmed on stream"
        );
        self.matched.insert(
            id.clone(),
            Confirmation {
                order_id: id.clone(),
                payload: update.clone(),
                latency,
            },
        );
        true
    }

    /// Matched confirmations in submission order.
    fn confirmations(&self) -> Vec<Confirmation> {
        self.order_ids
            .iter()
            .filter_map(|id| self.matched.get(id).cloned())
            .collect()
    }

    fn finish(self, end: TrackEnd) -> ConfirmationOutcome {
        let confirmations = self.confirmations();
        let remaining = self.remaining();
        match end {
            TrackEnd::Complete => ConfirmationOutcome::AllConfirmed { confirmations },
            TrackEnd::Deadline => ConfirmationOutcome::TimedOut {
                confirmations,
                remaining,
            },
            TrackEnd::StreamClosed => ConfirmationOutcome::StreamClosed {
                confirmations,
                remaining,
            },
        }
    }
}

enum TrackEnd {
    Complete,
    Deadline,
    StreamClosed,
}

/// Terminal state of one tracked set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmationOutcome {
    AllConfirmed {
        confirmations: Vec<Confirmation>,
    },
    /// Deadline elapsed. Unmatched orders may still be live.
    TimedOut {
        confirmations: Vec<Confirmation>,
        remaining: Vec<String>,
    },
    /// The event stream ended before every id matched.
    StreamClosed {
        confirmations: Vec<Confirmation>,
        remaining: Vec<String>,
    },
}

impl ConfirmationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::AllConfirmed { .. })
    }

    pub fn confirmations(&self) -> &[Confirmation] {
        match self {
            Self::AllConfirmed { confirmations }
            | Self::TimedOut { confirmations, .. }
            | Self::StreamClosed { confirmations, .. } => confirmations,
        }
    }

    pub fn remaining(&self) -> &[String] {
        match self {
            Self::AllConfirmed { .. } => &[],
            Self::TimedOut { remaining, .. } | Self::StreamClosed { remaining, .. } => remaining,
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AllConfirmed { .. } => "confirmed",
            Self::TimedOut { .. } => "timed_out",
            Self::StreamClosed { .. } => "stream_closed",
        }
    }
}

/// Waits for a set of order ids on an event channel.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationTracker {
    timeout: Duration,
}

impl Default for ConfirmationTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRMATION_TIMEOUT)
    }
}

impl ConfirmationTracker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Consume events until every id in `order_ids` matched or the wait ends.
    ///
    /// The deadline is fixed when tracking starts and does not move however
    /// many unrelated events are skipped. Expiry ends only the wait.
    pub async fn track(
        &self,
        events: &mut mpsc::Receiver<StreamEvent>,
        order_ids: Vec<String>,
    ) -> ConfirmationOutcome {
        let mut set = ConfirmationSet::new(order_ids, self.timeout);
        if set.is_complete() {
            return set.finish(TrackEnd::Complete);
        }

        let sleep = tokio::time::sleep_until(set.deadline());
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;

                () = &mut sleep => {
                    let remaining = set.remaining();
                    warn!(
                        ?remaining,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Confirmation deadline elapsed"
                    );
                    return set.finish(TrackEnd::Deadline);
                }

                event = events.recv() => {
                    let Some(event) = event else {
                        warn!(remaining = ?set.remaining(), "Event stream closed while awaiting confirmations");
                        return set.finish(TrackEnd::StreamClosed);
                    };
                    if set.on_event(&event) > 0 && set.is_complete() {
                        info!(count = set.matched_count(), "All orders confirmed");
                        return set.finish(TrackEnd::Complete);
                    }
                }
            }
        }
    }
}
