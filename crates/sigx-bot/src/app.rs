//! Execution orchestration.
//!
//! One signal, one execution:
//! resolve metadata -> size legs -> set leverage -> open and authenticate
//! the private stream -> subscribe order updates -> submit legs in order ->
//! wait for confirmations -> report.
//!
//! Leverage failure aborts before any order. Leg A failure aborts before
//! leg B. Leg B failing after leg A was accepted is reported as a partial
//! execution; nothing is cancelled or compensated.

use crate::config::AppConfig;
use crate::error::AppResult;
use serde::Serialize;
use sigx_core::{ErrorKind, InstrumentMeta, OrderLeg, OrderRecord, Signal};
use sigx_executor::{
    ApiCredentials, Clock, ConfirmationOutcome, ConfirmationTracker, OrderSubmitter,
    PositionSizer, RequestSigner, SystemClock,
};
use sigx_registry::{InstrumentCache, InstrumentClient};
use sigx_telemetry::Metrics;
use sigx_ws::{spawn_reader, ChannelArg, StreamSession};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Sized legs for one signal, before anything is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub inst_id: String,
    pub meta: InstrumentMeta,
    pub legs: Vec<OrderLeg>,
}

/// Final classification of an execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Every leg accepted and seen on the stream.
    Confirmed,
    /// A later leg failed after an earlier one was accepted.
    PartiallySubmitted { kind: ErrorKind, error: String },
    /// Deadline elapsed with orders unmatched. They may still be live.
    ConfirmationTimedOut { unmatched: Vec<String> },
    /// The stream ended with orders unmatched.
    StreamClosed { unmatched: Vec<String> },
}

impl ExecutionOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::PartiallySubmitted { .. } => "partially_submitted",
            Self::ConfirmationTimedOut { .. } => "confirmation_timed_out",
            Self::StreamClosed { .. } => "stream_closed",
        }
    }

    /// Error kind behind a non-confirmed outcome.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Confirmed => None,
            Self::PartiallySubmitted { kind, .. } => Some(*kind),
            Self::ConfirmationTimedOut { .. } => Some(ErrorKind::ConfirmationTimeout),
            Self::StreamClosed { .. } => Some(ErrorKind::Transport),
        }
    }
}

/// What happened to every leg of one execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub inst_id: String,
    /// One record per attempted leg, in submission order.
    pub records: Vec<OrderRecord>,
    pub confirmation: ConfirmationOutcome,
    pub outcome: ExecutionOutcome,
}

impl ExecutionReport {
    /// Exchange ids of the accepted legs, in submission order.
    pub fn order_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.order_id.clone())
            .collect()
    }
}

/// Resolves instrument metadata and sizes legs. No credentials needed.
pub struct ExecutionPlanner {
    instruments: InstrumentClient,
    cache: Option<Arc<InstrumentCache>>,
    sizer: PositionSizer,
    quote_currency: String,
    usd_amount: rust_decimal::Decimal,
    leverage: u32,
}

impl ExecutionPlanner {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            instruments: InstrumentClient::new(config.rest_url.clone())?,
            cache: None,
            sizer: PositionSizer::new(config.order.leg_mode),
            quote_currency: config.quote_currency.clone(),
            usd_amount: config.order.usd_amount,
            leverage: config.order.leverage,
        })
    }

    /// Serve metadata from `cache`, fetching only on a miss.
    pub fn with_cache(mut self, cache: Arc<InstrumentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn resolve(&self, inst_id: &str) -> AppResult<InstrumentMeta> {
        let meta = match &self.cache {
            Some(cache) => cache.resolve(&self.instruments, inst_id).await?,
            None => self.instruments.resolve(inst_id).await?,
        };
        Ok(meta)
    }

    /// Validate the signal, resolve its instrument and size the legs.
    pub async fn plan(&self, signal: &Signal) -> AppResult<ExecutionPlan> {
        signal.validate()?;
        let inst_id = signal.instrument_id(&self.quote_currency);
        let meta = self.resolve(&inst_id).await?;
        let legs = self
            .sizer
            .size(signal, &meta, self.usd_amount, self.leverage)?;
        debug!(inst_id = %inst_id, legs = legs.len(), "Execution planned");
        Ok(ExecutionPlan {
            inst_id,
            meta,
            legs,
        })
    }
}

/// Runs signals end to end against the exchange.
pub struct ExecutionOrchestrator {
    config: AppConfig,
    planner: ExecutionPlanner,
    signer: Arc<RequestSigner>,
    submitter: OrderSubmitter,
    tracker: ConfirmationTracker,
}

impl ExecutionOrchestrator {
    pub fn new(config: AppConfig, credentials: ApiCredentials) -> AppResult<Self> {
        let planner = ExecutionPlanner::new(&config)?;
        let signer = Arc::new(RequestSigner::new(credentials)?);
        let submitter = OrderSubmitter::new(config.rest_url.clone(), signer.clone())?;
        let tracker = ConfirmationTracker::new(config.confirmation_timeout());
        Ok(Self {
            config,
            planner,
            signer,
            submitter,
            tracker,
        })
    }

    pub fn with_instrument_cache(mut self, cache: Arc<InstrumentCache>) -> Self {
        self.planner = self.planner.with_cache(cache);
        self
    }

    pub fn planner(&self) -> &ExecutionPlanner {
        &self.planner
    }

    /// Execute one signal.
    ///
    /// Returns `Err` when nothing was placed (validation, metadata, leverage,
    /// stream setup, or leg A failure). Once any order is live the result is
    /// an [`ExecutionReport`], whatever happened afterwards.
    pub async fn execute(&self, signal: &Signal) -> AppResult<ExecutionReport> {
        let plan = self.planner.plan(signal).await?;
        let inst_id = plan.inst_id.as_str();
        info!(
            inst_id,
            direction = %signal.direction,
            legs = plan.legs.len(),
            "Executing signal"
        );

        if self.config.order.set_leverage {
            if let Err(e) = self
                .submitter
                .set_leverage(inst_id, self.config.order.leverage)
                .await
            {
                Metrics::leverage_failed();
                error!(inst_id, error = %e, "Set leverage failed, aborting");
                return Err(e.into());
            }
        }

        let mut session = StreamSession::connect(self.config.session_config()).await?;
        let login = self.signer.login_args(SystemClock.now_ms())?;
        session.login(login).await?;
        session.subscribe(ChannelArg::orders(inst_id)).await?;

        // Reader starts before submission; early updates wait in the channel.
        let mut events = spawn_reader(session, self.config.stream.event_buffer);

        let mut records = Vec::with_capacity(plan.legs.len());
        let mut partial = None;
        for leg in plan.legs {
            let side = leg.side.as_str();
            match self.submitter.submit(&leg, inst_id).await {
                Ok(order_id) => {
                    Metrics::order_submitted(side, &leg.role.to_string());
                    records.push(OrderRecord::submitted(leg, order_id));
                }
                Err(e) => {
                    Metrics::order_rejected(side, &e.kind().to_string());
                    if records.is_empty() {
                        error!(inst_id, leg = %leg.role, error = %e, "First leg failed, aborting");
                        events.shutdown().await;
                        return Err(e.into());
                    }
                    warn!(
                        inst_id,
                        leg = %leg.role,
                        error = %e,
                        "Leg failed after an earlier leg was accepted"
                    );
                    partial = Some((e.kind(), e.to_string()));
                    records.push(OrderRecord::rejected(leg, e.to_string()));
                    break;
                }
            }
        }

        let order_ids: Vec<String> = records.iter().filter_map(|r| r.order_id.clone()).collect();
        let confirmation = self.tracker.track(events.receiver(), order_ids).await;
        events.shutdown().await;

        Metrics::confirmation_outcome(confirmation.label());
        for c in confirmation.confirmations() {
            Metrics::confirmation_latency(c.latency.as_secs_f64() * 1000.0);
        }

        let outcome = match (partial, &confirmation) {
            (Some((kind, error)), _) => ExecutionOutcome::PartiallySubmitted { kind, error },
            (None, ConfirmationOutcome::AllConfirmed { .. }) => ExecutionOutcome::Confirmed,
            (None, ConfirmationOutcome::TimedOut { remaining, .. }) => {
                ExecutionOutcome::ConfirmationTimedOut {
                    unmatched: remaining.clone(),
                }
            }
            (None, ConfirmationOutcome::StreamClosed { remaining, .. }) => {
                ExecutionOutcome::StreamClosed {
                    unmatched: remaining.clone(),
                }
            }
        };
        Metrics::execution_finished(outcome.label());
        match outcome.error_kind() {
            None => info!(inst_id, outcome = outcome.label(), "Execution finished"),
            Some(kind) => warn!(
                inst_id,
                outcome = outcome.label(),
                kind = %kind,
                "Execution finished unconfirmed"
            ),
        }

        Ok(ExecutionReport {
            inst_id: plan.inst_id,
            records,
            confirmation,
            outcome,
        })
    }
}
