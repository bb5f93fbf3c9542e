//! Transfer tracker
//!
//! Merges three asynchronous evidence sources — attestation polling,
//! destination-chain flow-record polling, and the announcement event
//! channel — into one monotonic transfer status with event emission and
//! one-shot wait semantics.
//!
//! Transition rules:
//! - A status only advances along
//!   `Initiated → Attested → Announced → Minted → Executed`; whichever
//!   source reports a transition first wins, and duplicate or older-than-
//!   current signals are ignored (no event emitted).
//! - `Failed` is reachable from any non-terminal state, driven only by an
//!   explicit execution-failed signal; transient source errors are logged
//!   and swallowed, never escalated to `Failed`.
//! - `Announced` is synthesized locally a fixed short delay after
//!   `Attested` — a heuristic for "the announcement should be out by now",
//!   not an observed fact. Callers needing authoritative progress should
//!   wait on `Minted` or `Executed`.
//! - Terminal states stop all polling; results arriving after `stop()`
//!   cannot resurrect a stopped tracker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::announce::{Announcer, EventFilter, TransferEvent};
use crate::attestation::{AttestationSource, AttestationStatus};
use crate::error::{TrackerError, TransportError};
use crate::metrics;
use crate::types::{FlowRecord, TransferRecord, TransferStatus};

/// Capability to read the per-nonce flow record on the destination chain.
#[async_trait]
pub trait FlowReader: Send + Sync {
    async fn flow_record(
        &self,
        destination_account: Address,
        nonce: U256,
    ) -> Result<Option<FlowRecord>, TransportError>;
}

/// Emitted on every accepted status change, on the tracker's broadcast
/// channel.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub status: TransferStatus,
    pub timestamp: DateTime<Utc>,
    pub source_tx_hash: B256,
    pub metadata: serde_json::Value,
}

/// Identity of the tracked transfer.
#[derive(Debug, Clone)]
pub struct TransferKeys {
    pub source_tx_hash: B256,
    pub source_domain: u32,
    pub destination_chain_id: u64,
    pub destination_account: Address,
    pub nonce: U256,
}

/// Evidence sources the tracker polls and subscribes to.
#[derive(Clone)]
pub struct TrackerSources {
    pub attestation: Arc<dyn AttestationSource>,
    pub flow: Arc<dyn FlowReader>,
    pub announcer: Arc<dyn Announcer>,
}

/// Polling cadence and the announced-synthesis delay.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub attestation_interval: Duration,
    pub flow_interval: Duration,
    /// Delay after `Attested` before `Announced` is synthesized.
    pub announced_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            attestation_interval: Duration::from_secs(2),
            flow_interval: Duration::from_secs(2),
            announced_delay: Duration::from_secs(5),
        }
    }
}

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct Inner {
    record: Mutex<TransferRecord>,
    /// Cleared by `stop()` and by terminal transitions; checked before any
    /// late-arriving result is applied.
    active: AtomicBool,
    /// Makes `start()` idempotent.
    started: AtomicBool,
    events: broadcast::Sender<StatusEvent>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    keys: TransferKeys,
    sources: TrackerSources,
    config: TrackerConfig,
}

/// Tracks one transfer from burn to execution.
#[derive(Clone)]
pub struct TransferTracker {
    inner: Arc<Inner>,
}

impl TransferTracker {
    pub fn new(keys: TransferKeys, sources: TrackerSources, config: TrackerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let record = TransferRecord {
            source_tx_hash: keys.source_tx_hash,
            destination_account: keys.destination_account,
            nonce: keys.nonce,
            status: TransferStatus::Initiated,
            last_event_at: Utc::now(),
        };

        Self {
            inner: Arc::new(Inner {
                record: Mutex::new(record),
                active: AtomicBool::new(true),
                started: AtomicBool::new(false),
                events,
                tasks: Mutex::new(Vec::new()),
                keys,
                sources,
                config,
            }),
        }
    }

    /// Begin all polling loops and the announcement subscription.
    /// Idempotent: a second call is a no-op.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!("Tracker already started");
            return;
        }
        if !self.inner.active.load(Ordering::SeqCst) {
            return;
        }

        info!(
            source_tx_hash = %self.inner.keys.source_tx_hash,
            nonce = %self.inner.keys.nonce,
            "Tracker started"
        );

        let attestation_task = tokio::spawn(attestation_loop(self.inner.clone()));
        let flow_task = tokio::spawn(flow_loop(self.inner.clone()));
        let events_task = tokio::spawn(announcement_loop(self.inner.clone()));

        let mut tasks = self.inner.tasks.lock().unwrap();
        tasks.push(attestation_task);
        tasks.push(flow_task);
        tasks.push(events_task);
    }

    /// Halt all loops and unsubscribe. Safe to call repeatedly, and safe
    /// concurrently with in-flight polls.
    pub fn stop(&self) {
        if !self.inner.active.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.abort_tasks();
        info!(
            source_tx_hash = %self.inner.keys.source_tx_hash,
            "Tracker stopped"
        );
    }

    /// Last-known status, synchronously.
    pub fn current_status(&self) -> TransferStatus {
        self.inner.record.lock().unwrap().status
    }

    /// Snapshot of the tracked record.
    pub fn record(&self) -> TransferRecord {
        self.inner.record.lock().unwrap().clone()
    }

    /// Subscribe to every accepted status change.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.events.subscribe()
    }

    /// Subscribe to one specific status only. The backing filter task ends
    /// when either side of the channel goes away.
    pub fn subscribe_status(&self, status: TransferStatus) -> tokio::sync::mpsc::Receiver<StatusEvent> {
        let mut rx = self.inner.events.subscribe();
        let (tx, filtered) = tokio::sync::mpsc::channel(8);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.status == status => {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
        filtered
    }

    /// Resolve once `target` (or a later status) is reached, or fail with
    /// `Timeout` after `timeout`.
    ///
    /// If the target arrives in the same scheduling turn as the timeout
    /// fires, resolution wins: the select below is biased toward the event
    /// channel and the timeout arm re-checks the status one final time.
    /// The internal listener is dropped on both paths.
    pub async fn wait_for_status(
        &self,
        target: TransferStatus,
        timeout: Duration,
    ) -> Result<StatusEvent, TrackerError> {
        // Subscribe before the fast-path check so no event can slip between.
        let mut rx = self.inner.events.subscribe();

        if let Some(result) = self.check_reached(target) {
            return result;
        }

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                event = rx.recv() => match event {
                    Ok(event) => {
                        if event.status == TransferStatus::Failed
                            && target != TransferStatus::Failed
                        {
                            return Err(TrackerError::TransferFailed {
                                reason: event
                                    .metadata
                                    .get("reason")
                                    .and_then(|r| r.as_str())
                                    .unwrap_or("transfer failed")
                                    .to_string(),
                            });
                        }
                        if status_reaches(event.status, target) {
                            return Ok(event);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        if let Some(result) = self.check_reached(target) {
                            return result;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return self
                            .check_reached(target)
                            .unwrap_or(Err(TrackerError::Stopped));
                    }
                },

                _ = &mut deadline => {
                    // Defined tie: if the condition is genuinely true by
                    // now, resolve instead of rejecting.
                    if let Some(result) = self.check_reached(target) {
                        return result;
                    }
                    return Err(TrackerError::Timeout { target, waited: timeout });
                }
            }
        }
    }

    fn check_reached(
        &self,
        target: TransferStatus,
    ) -> Option<Result<StatusEvent, TrackerError>> {
        let record = self.inner.record.lock().unwrap();
        if record.status == TransferStatus::Failed && target != TransferStatus::Failed {
            return Some(Err(TrackerError::TransferFailed {
                reason: "transfer failed".to_string(),
            }));
        }
        if status_reaches(record.status, target) {
            return Some(Ok(StatusEvent {
                status: record.status,
                timestamp: record.last_event_at,
                source_tx_hash: record.source_tx_hash,
                metadata: serde_json::Value::Null,
            }));
        }
        None
    }
}

/// Whether being at `current` satisfies a wait for `target`.
fn status_reaches(current: TransferStatus, target: TransferStatus) -> bool {
    if target == TransferStatus::Failed {
        current == TransferStatus::Failed
    } else {
        current != TransferStatus::Failed && current.rank() >= target.rank()
    }
}

impl Inner {
    fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn current_status(&self) -> TransferStatus {
        self.record.lock().unwrap().status
    }

    fn abort_tasks(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    /// The single status-advance entry point. Applies the monotonic rule,
    /// ignores stale/duplicate signals, emits on acceptance, and shuts the
    /// loops down on a terminal transition.
    fn advance(self: &Arc<Self>, next: TransferStatus, metadata: serde_json::Value) {
        if !self.active() {
            return;
        }

        let event = {
            let mut record = self.record.lock().unwrap();
            let current = record.status;

            let accept = if current.is_terminal() {
                false
            } else if next == TransferStatus::Failed {
                true
            } else {
                next.rank() > current.rank()
            };
            if !accept {
                debug!(%current, requested = %next, "Ignoring stale status signal");
                return;
            }

            record.status = next;
            record.last_event_at = Utc::now();
            StatusEvent {
                status: next,
                timestamp: record.last_event_at,
                source_tx_hash: record.source_tx_hash,
                metadata,
            }
        };

        info!(
            source_tx_hash = %event.source_tx_hash,
            status = %event.status,
            "Transfer status advanced"
        );
        metrics::record_status_transition(event.status.as_str());

        // Receivers may have come and gone; a send error just means nobody
        // is listening right now.
        let _ = self.events.send(event.clone());

        if event.status == TransferStatus::Attested {
            let inner = self.clone();
            let timer = tokio::spawn(async move {
                tokio::time::sleep(inner.config.announced_delay).await;
                inner.advance(
                    TransferStatus::Announced,
                    serde_json::json!({ "synthesized": true }),
                );
            });
            self.tasks.lock().unwrap().push(timer);
        }

        if event.status.is_terminal() {
            self.active.store(false, Ordering::SeqCst);
            self.abort_tasks();
        }
    }
}

async fn attestation_loop(inner: Arc<Inner>) {
    loop {
        tokio::time::sleep(inner.config.attestation_interval).await;
        if !inner.active() {
            return;
        }
        if inner.current_status().rank() >= TransferStatus::Attested.rank() {
            return;
        }

        metrics::record_attestation_poll();
        match inner
            .sources
            .attestation
            .message_status(inner.keys.source_domain, inner.keys.source_tx_hash)
            .await
        {
            Ok(AttestationStatus::Complete { .. }) => {
                inner.advance(
                    TransferStatus::Attested,
                    serde_json::json!({ "source": "attestation" }),
                );
                return;
            }
            Ok(AttestationStatus::Pending) => {}
            // Transient failure: log and keep polling, never fail the
            // transfer over a flaky poll.
            Err(error) => {
                warn!(%error, "Attestation poll failed; will retry");
                metrics::record_tracker_error("attestation");
            }
        }
    }
}

async fn flow_loop(inner: Arc<Inner>) {
    loop {
        tokio::time::sleep(inner.config.flow_interval).await;
        if !inner.active() {
            return;
        }
        if inner.current_status().is_terminal() {
            return;
        }

        match inner
            .sources
            .flow
            .flow_record(inner.keys.destination_account, inner.keys.nonce)
            .await
        {
            Ok(Some(record)) => {
                if record.executed {
                    inner.advance(
                        TransferStatus::Executed,
                        serde_json::json!({
                            "source": "flow",
                            "executor": record.executor.to_string(),
                        }),
                    );
                    return;
                }
                if !record.amount.is_zero() {
                    inner.advance(
                        TransferStatus::Minted,
                        serde_json::json!({
                            "source": "flow",
                            "amount": record.amount.to_string(),
                        }),
                    );
                }
            }
            Ok(None) => {}
            Err(error) => {
                warn!(%error, "Flow record poll failed; will retry");
                metrics::record_tracker_error("flow");
            }
        }
    }
}

async fn announcement_loop(inner: Arc<Inner>) {
    let filter = EventFilter {
        destination_chain_id: inner.keys.destination_chain_id,
        destination_account: inner.keys.destination_account,
        nonce: inner.keys.nonce,
    };

    let mut subscription = match inner.sources.announcer.subscribe(filter).await {
        Ok(subscription) => subscription,
        Err(error) => {
            // The polling paths still cover every transition; the
            // subscription is redundancy, not a requirement.
            warn!(%error, "Announcement subscription unavailable");
            metrics::record_tracker_error("announce_subscribe");
            return;
        }
    };

    while inner.active() {
        match subscription.recv().await {
            Some(TransferEvent::Minted { amount }) => {
                inner.advance(
                    TransferStatus::Minted,
                    serde_json::json!({
                        "source": "announcement",
                        "amount": amount.to_string(),
                    }),
                );
            }
            Some(TransferEvent::Executed) => {
                inner.advance(
                    TransferStatus::Executed,
                    serde_json::json!({ "source": "announcement" }),
                );
                return;
            }
            Some(TransferEvent::ExecutionFailed { reason }) => {
                inner.advance(
                    TransferStatus::Failed,
                    serde_json::json!({
                        "source": "announcement",
                        "reason": reason,
                    }),
                );
                return;
            }
            None => return,
        }
    }
}
