//! The refresh loop.
//!
//! One [`RefreshScheduler`] drives one instrument:
//!
//! ```text
//! Idle -> Fetching -> Computing -> Publishing -> Sleeping -> Fetching ...
//!            \            \             \          ^
//!             +------------+-------------+--> Faulted(reason)
//! ```
//!
//! Every cycle publishes exactly one snapshot. A failed cycle publishes the
//! previous snapshot's data under an error status and retries sooner.
//! [`Shutdown`] stops the loop before the next fetch or during a sleep.

use std::{any::Any, fmt, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use chrono::Utc;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    acquisition::{AcquisitionRequest, BarSource},
    config::MonitorOptions,
    errors::{CycleError, OptionsError, PublishError},
    indicators::IndicatorEngine,
    models::{Snapshot, SnapshotStatus},
    news::HeadlineFeed,
    publish::{SnapshotSink, SnapshotSlot},
    sentiment::{PolarityScorer, SentimentAggregator},
    snapshot::MarketSnapshotBuilder,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Computing,
    Publishing,
    Sleeping,
    Faulted(String),
    Stopped,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleState::Idle => f.write_str("idle"),
            CycleState::Fetching => f.write_str("fetching"),
            CycleState::Computing => f.write_str("computing"),
            CycleState::Publishing => f.write_str("publishing"),
            CycleState::Sleeping => f.write_str("sleeping"),
            CycleState::Faulted(reason) => write!(f, "faulted: {reason}"),
            CycleState::Stopped => f.write_str("stopped"),
        }
    }
}

/// Result of a single cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub status: SnapshotStatus,
    /// How long the loop waits before the next cycle.
    pub next_delay: Duration,
    /// What was published.
    pub snapshot: Arc<Snapshot>,
}

/// Sending half of the cancellation signal.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Receiving half of the cancellation signal. Clones observe the same trigger.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the trigger fires. Never resolves if the trigger was
    /// dropped without firing.
    pub async fn triggered(&mut self) {
        if self.0.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), Shutdown(rx))
}

enum Produced {
    Fresh(Snapshot),
    NoData,
}

pub struct RefreshScheduler {
    options: MonitorOptions,
    request: AcquisitionRequest,
    source: Box<dyn BarSource>,
    feed: Box<dyn HeadlineFeed>,
    scorer: Box<dyn PolarityScorer>,
    sink: Box<dyn SnapshotSink>,
    engine: IndicatorEngine,
    aggregator: SentimentAggregator,
    builder: MarketSnapshotBuilder,
    slot: SnapshotSlot,
    state: watch::Sender<CycleState>,
    last_fault: ArcSwapOption<String>,
}

impl RefreshScheduler {
    /// Validates `options` and wires the collaborators together.
    pub fn new(
        options: MonitorOptions,
        source: Box<dyn BarSource>,
        feed: Box<dyn HeadlineFeed>,
        scorer: Box<dyn PolarityScorer>,
        sink: Box<dyn SnapshotSink>,
    ) -> Result<Self, OptionsError> {
        let options = options.validate()?;
        let (state, _) = watch::channel(CycleState::Idle);
        Ok(Self {
            request: AcquisitionRequest::from_options(&options),
            engine: IndicatorEngine::new(options.sma_window, options.rsi_span),
            aggregator: SentimentAggregator::new(
                options.positive_threshold,
                options.negative_threshold,
            ),
            builder: MarketSnapshotBuilder::new(&options),
            options,
            source,
            feed,
            scorer,
            sink,
            slot: SnapshotSlot::new(),
            state,
            last_fault: ArcSwapOption::empty(),
        })
    }

    /// Publishes into `slot` instead of a private one.
    pub fn with_slot(mut self, slot: SnapshotSlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    pub fn slot(&self) -> SnapshotSlot {
        self.slot.clone()
    }

    pub fn state(&self) -> CycleState {
        self.state.borrow().clone()
    }

    /// Receiver of the current state. A slow reader only sees the latest one.
    pub fn subscribe(&self) -> watch::Receiver<CycleState> {
        self.state.subscribe()
    }

    /// Why the most recent cycle failed, `None` if it did not.
    pub fn last_fault(&self) -> Option<String> {
        self.last_fault.load_full().map(|reason| reason.as_ref().clone())
    }

    fn set_state(&self, state: CycleState) {
        debug!(symbol = %self.options.symbol, state = %state, "state");
        self.state.send_replace(state);
    }

    /// Runs cycles until `shutdown` fires, then moves to `Stopped`.
    pub async fn run(&self, mut shutdown: Shutdown) {
        info!(symbol = %self.options.symbol, "refresh loop started");
        loop {
            if shutdown.is_triggered() {
                break;
            }
            let outcome = self.run_cycle().await;
            if shutdown.is_triggered() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(outcome.next_delay) => {}
                _ = shutdown.triggered() => break,
            }
        }
        self.set_state(CycleState::Stopped);
        info!(symbol = %self.options.symbol, "refresh loop stopped");
    }

    /// Performs one fetch, compute and publish pass without sleeping.
    ///
    /// Never fails: an error or panic inside the cycle passes through
    /// `Faulted`, publishes an error snapshot and is kept in
    /// [`last_fault`](Self::last_fault). Every cycle ends in `Sleeping`.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let produced = AssertUnwindSafe(self.produce())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(CycleError::Panicked(panic_message(panic.as_ref()))));

        let outcome = match produced {
            Ok(Produced::Fresh(snapshot)) => {
                self.publish(Arc::new(snapshot), self.options.success_interval())
            }
            Ok(Produced::NoData) => {
                warn!(symbol = %self.options.symbol, "no bars returned, market may be closed");
                self.publish(
                    self.unavailable(SnapshotStatus::NoData),
                    self.options.retry_interval(),
                )
            }
            Err(err) => {
                self.fault(&err);
                let snapshot = self.unavailable(SnapshotStatus::Error(err.to_string()));
                if let Err(publish_err) = self.deliver(&snapshot) {
                    error!(
                        symbol = %self.options.symbol,
                        error = %publish_err,
                        "error snapshot was not rendered"
                    );
                }
                CycleOutcome {
                    status: snapshot.status.clone(),
                    next_delay: self.options.retry_interval(),
                    snapshot,
                }
            }
        };
        self.set_state(CycleState::Sleeping);

        info!(
            symbol = %self.options.symbol,
            status = %outcome.status,
            delay_secs = outcome.next_delay.as_secs(),
            "cycle complete"
        );
        outcome
    }

    async fn produce(&self) -> Result<Produced, CycleError> {
        self.set_state(CycleState::Fetching);
        let bars = self.source.fetch(&self.request).await?;
        if bars.is_empty() {
            return Ok(Produced::NoData);
        }
        let headlines = match self.feed.fetch().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(symbol = %self.options.symbol, error = %err, "headline feed unavailable");
                Vec::new()
            }
        };

        self.set_state(CycleState::Computing);
        let indicators = self.engine.compute(&bars);
        let sentiment =
            self.aggregator
                .aggregate(&headlines, self.scorer.as_ref(), self.options.headline_limit);
        let snapshot = self.builder.build_at(&bars, &indicators, sentiment, Utc::now())?;
        Ok(Produced::Fresh(snapshot))
    }

    /// Publishes the cycle's snapshot. If the sink rejects it, the slot gets
    /// a copy under the error status so slot and outcome agree.
    fn publish(&self, snapshot: Arc<Snapshot>, next_delay: Duration) -> CycleOutcome {
        self.set_state(CycleState::Publishing);
        match self.deliver(&snapshot) {
            Ok(()) => {
                self.last_fault.store(None);
                CycleOutcome {
                    status: snapshot.status.clone(),
                    next_delay,
                    snapshot,
                }
            }
            Err(err) => {
                let err = CycleError::from(err);
                self.fault(&err);
                let status = SnapshotStatus::Error(err.to_string());
                let failed = Arc::new(Snapshot {
                    status: status.clone(),
                    ..(*snapshot).clone()
                });
                self.slot.store(Arc::clone(&failed));
                CycleOutcome {
                    status,
                    next_delay: self.options.retry_interval(),
                    snapshot: failed,
                }
            }
        }
    }

    /// Swaps `snapshot` into the slot, then renders it.
    fn deliver(&self, snapshot: &Arc<Snapshot>) -> Result<(), PublishError> {
        self.slot.store(Arc::clone(snapshot));
        std::panic::catch_unwind(AssertUnwindSafe(|| self.sink.render(snapshot)))
            .unwrap_or_else(|panic| Err(PublishError(panic_message(panic.as_ref()))))
    }

    fn unavailable(&self, status: SnapshotStatus) -> Arc<Snapshot> {
        let previous = self.slot.load();
        Arc::new(
            self.builder
                .unavailable(previous.as_deref(), status, Utc::now()),
        )
    }

    fn fault(&self, err: &CycleError) {
        error!(
            symbol = %self.options.symbol,
            stage = err.stage(),
            transient = err.is_transient(),
            error = %err,
            "cycle failed"
        );
        let reason = err.to_string();
        self.last_fault.store(Some(Arc::new(reason.clone())));
        self.set_state(CycleState::Faulted(reason));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
