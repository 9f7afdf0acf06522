//! Refresh loop
//!
//! Fetches once at start and then on every interval tick. Each fetch runs as
//! its own task with a child cancellation token; the overlap policy decides
//! what a tick does while an earlier fetch is still outstanding.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Notify, RwLock};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{FeedError, RecordSource};
use crate::chart::ChartView;
use crate::config::{OverlapPolicy, PollerConfig};
use crate::records::Record;
use crate::websocket::{ConnectionHub, WsEvent};

/// Poller counters, served by the status endpoint
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedStatus {
    pub running: bool,
    pub source: String,
    pub interval_ms: u64,
    pub overlap: OverlapPolicy,
    /// Cycle of the held snapshot
    pub cycle: u64,
    pub fetches_started: u64,
    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,
    pub cancelled: u64,
    pub in_flight: usize,
    /// Records in the held snapshot
    pub records: usize,
    pub last_added: usize,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
}

impl FeedStatus {
    /// At least one refresh has been applied
    pub fn is_ready(&self) -> bool {
        self.successes > 0
    }
}

type FetchOutcome = (u64, Result<Vec<Record>, FeedError>);

/// Outstanding fetch tasks and their cancellation tokens
#[derive(Default)]
struct Fetches {
    tasks: JoinSet<FetchOutcome>,
    tokens: HashMap<u64, CancellationToken>,
    next_seq: u64,
}

impl Fetches {
    fn len(&self) -> usize {
        self.tasks.len()
    }

    fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn spawn(&mut self, source: Arc<dyn RecordSource>, parent: &CancellationToken) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        let token = parent.child_token();
        self.tokens.insert(seq, token.clone());
        self.tasks.spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => Err(FeedError::Cancelled),
                result = source.fetch() => result,
            };
            (seq, result)
        });
        seq
    }

    fn cancel_all(&self) {
        for token in self.tokens.values() {
            token.cancel();
        }
    }

    async fn next(&mut self) -> Option<Result<FetchOutcome, JoinError>> {
        let joined = self.tasks.join_next().await?;
        match &joined {
            Ok((seq, _)) => {
                self.tokens.remove(seq);
            }
            // A panicked task cannot name its sequence number
            Err(_) if self.tasks.is_empty() => self.tokens.clear(),
            Err(_) => {}
        }
        Some(joined)
    }
}

/// Drives the refresh cycle against a `RecordSource`
pub struct Poller {
    source: Arc<dyn RecordSource>,
    view: Arc<RwLock<ChartView>>,
    hub: Arc<ConnectionHub>,
    config: PollerConfig,
    status: Arc<RwLock<FeedStatus>>,
    trigger: Arc<Notify>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn RecordSource>,
        view: Arc<RwLock<ChartView>>,
        hub: Arc<ConnectionHub>,
        config: PollerConfig,
    ) -> Self {
        let status = FeedStatus {
            source: source.describe(),
            interval_ms: config.interval().as_millis() as u64,
            overlap: config.overlap,
            ..FeedStatus::default()
        };

        Self {
            source,
            view,
            hub,
            config,
            status: Arc::new(RwLock::new(status)),
            trigger: Arc::new(Notify::new()),
        }
    }

    /// Shared status handle
    pub fn status(&self) -> Arc<RwLock<FeedStatus>> {
        Arc::clone(&self.status)
    }

    /// Notify this to request an immediate refresh
    pub fn trigger(&self) -> Arc<Notify> {
        Arc::clone(&self.trigger)
    }

    pub fn view(&self) -> Arc<RwLock<ChartView>> {
        Arc::clone(&self.view)
    }

    pub fn hub(&self) -> Arc<ConnectionHub> {
        Arc::clone(&self.hub)
    }

    /// Run the loop on its own task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until `cancel` fires, then cancel every outstanding fetch
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut fetches = Fetches::default();

        self.status.write().await.running = true;
        tracing::info!(
            source = %self.source.describe(),
            interval_ms = self.config.interval().as_millis() as u64,
            overlap = ?self.config.overlap,
            "Poller started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.start_fetch(&mut fetches, &cancel).await;
                }
                _ = self.trigger.notified() => {
                    tracing::debug!("Refresh requested");
                    ticker.reset();
                    self.start_fetch(&mut fetches, &cancel).await;
                }
                Some(joined) = fetches.next(), if !fetches.is_empty() => {
                    self.finish_fetch(joined).await;
                    self.status.write().await.in_flight = fetches.len();
                }
            }
        }

        fetches.cancel_all();
        fetches.tasks.shutdown().await;

        let mut status = self.status.write().await;
        status.running = false;
        status.in_flight = 0;
        tracing::info!(
            successes = status.successes,
            failures = status.failures,
            "Poller stopped"
        );
    }

    async fn start_fetch(&self, fetches: &mut Fetches, cancel: &CancellationToken) {
        if !fetches.is_empty() {
            match self.config.overlap {
                OverlapPolicy::Skip => {
                    self.status.write().await.skipped += 1;
                    tracing::debug!(in_flight = fetches.len(), "Tick skipped, fetch in flight");
                    self.hub
                        .publish(WsEvent::refresh_skipped("previous fetch still in flight"))
                        .await;
                    return;
                }
                OverlapPolicy::Replace => {
                    tracing::debug!(in_flight = fetches.len(), "Cancelling outstanding fetch");
                    fetches.cancel_all();
                }
                OverlapPolicy::Allow => {}
            }
        }

        let seq = fetches.spawn(Arc::clone(&self.source), cancel);
        let mut status = self.status.write().await;
        status.fetches_started += 1;
        status.in_flight = fetches.len();
        tracing::trace!(seq, "Fetch started");
    }

    async fn finish_fetch(&self, joined: Result<FetchOutcome, JoinError>) {
        let result = match joined {
            Ok((_, result)) => result,
            Err(e) => Err(FeedError::Unavailable(format!("fetch task failed: {}", e))),
        };

        match result {
            Ok(records) => {
                let (patch, held) = {
                    let mut view = self.view.write().await;
                    let patch = view.apply(records, Instant::now());
                    (patch, view.snapshot().len())
                };

                {
                    let mut status = self.status.write().await;
                    status.successes += 1;
                    status.cycle = patch.cycle;
                    status.records = held;
                    status.last_added = patch.added;
                    status.last_success = Some(Utc::now());
                }

                tracing::info!(
                    cycle = patch.cycle,
                    added = patch.added,
                    entered = patch.entered.len(),
                    updated = patch.updated.len(),
                    exited = patch.exited.len(),
                    "Refresh applied"
                );
                self.hub.publish(WsEvent::scene_patch(patch)).await;
            }
            Err(FeedError::Cancelled) => {
                self.status.write().await.cancelled += 1;
                tracing::debug!("Fetch cancelled");
            }
            Err(e) => {
                let cycle = self.view.read().await.snapshot().cycle + 1;
                {
                    let mut status = self.status.write().await;
                    status.failures += 1;
                    status.last_error = Some(e.to_string());
                    status.last_error_at = Some(Utc::now());
                }

                tracing::warn!(cycle, error = %e, "Refresh failed, keeping current scene");
                self.hub.publish(WsEvent::refresh_failed(cycle, &e)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::websocket::ServerMessage;

    /// Replies from a script; an exhausted script returns an empty collection
    #[derive(Default)]
    struct ScriptedSource {
        script: Mutex<VecDeque<(Duration, Result<Vec<Record>, FeedError>)>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<(Duration, Result<Vec<Record>, FeedError>)>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecordSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        async fn fetch(&self) -> Result<Vec<Record>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some((delay, result)) => {
                    tokio::time::sleep(delay).await;
                    result
                }
                None => Ok(Vec::new()),
            }
        }
    }

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter().map(|id| Record::new(*id, *id, 0.5)).collect()
    }

    struct Harness {
        source: Arc<ScriptedSource>,
        view: Arc<RwLock<ChartView>>,
        hub: Arc<ConnectionHub>,
        status: Arc<RwLock<FeedStatus>>,
        trigger: Arc<Notify>,
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    }

    fn start(script: Vec<(Duration, Result<Vec<Record>, FeedError>)>, overlap: OverlapPolicy) -> Harness {
        let source = ScriptedSource::new(script);
        let view = Arc::new(RwLock::new(ChartView::default()));
        let hub = Arc::new(ConnectionHub::default());
        let config = PollerConfig {
            interval_ms: 5000,
            overlap,
        };

        let poller = Poller::new(
            Arc::clone(&source) as Arc<dyn RecordSource>,
            Arc::clone(&view),
            Arc::clone(&hub),
            config,
        );
        let status = poller.status();
        let trigger = poller.trigger();
        let cancel = CancellationToken::new();
        let handle = poller.spawn(cancel.clone());

        Harness {
            source,
            view,
            hub,
            status,
            trigger,
            cancel,
            handle,
        }
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_immediately() {
        let h = start(
            vec![(Duration::ZERO, Ok(records(&["c", "b", "a"])))],
            OverlapPolicy::Skip,
        );
        advance(10).await;

        assert_eq!(h.source.calls(), 1);
        let status = h.status.read().await.clone();
        assert!(status.running);
        assert!(status.is_ready());
        assert_eq!(status.cycle, 1);
        assert_eq!(status.records, 3);
        assert_eq!(status.last_added, 3);

        let view = h.view.read().await;
        let ids: Vec<&str> = view.snapshot().records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        drop(view);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval() {
        let h = start(Vec::new(), OverlapPolicy::Skip);

        advance(4_900).await;
        assert_eq!(h.source.calls(), 1);

        advance(200).await;
        assert_eq!(h.source.calls(), 2);

        advance(5_000).await;
        assert_eq!(h.source.calls(), 3);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_policy_skips_tick_while_in_flight() {
        let h = start(
            vec![(Duration::from_millis(7_000), Ok(records(&["a"])))],
            OverlapPolicy::Skip,
        );
        let mut events = h.hub.subscribe_broadcast();

        advance(5_500).await;
        assert_eq!(h.source.calls(), 1);
        assert_eq!(h.status.read().await.skipped, 1);
        let event = events.recv().await.unwrap();
        assert!(matches!(event.message, ServerMessage::RefreshSkipped { .. }));

        advance(2_000).await;
        let status = h.status.read().await.clone();
        assert_eq!(status.successes, 1);
        assert_eq!(status.in_flight, 0);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_policy_cancels_outstanding_fetch() {
        let h = start(
            vec![
                (Duration::from_millis(7_000), Ok(records(&["stale"]))),
                (Duration::ZERO, Ok(records(&["fresh"]))),
            ],
            OverlapPolicy::Replace,
        );

        advance(5_500).await;
        assert_eq!(h.source.calls(), 2);
        let status = h.status.read().await.clone();
        assert_eq!(status.cancelled, 1);
        assert_eq!(status.successes, 1);

        advance(2_000).await;
        let view = h.view.read().await;
        assert_eq!(view.snapshot().records[0].id.as_str(), "fresh");
        assert_eq!(view.snapshot().cycle, 1);
        drop(view);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_allow_policy_last_completion_wins() {
        let h = start(
            vec![
                (Duration::from_millis(7_000), Ok(records(&["slow"]))),
                (Duration::from_millis(500), Ok(records(&["quick"]))),
            ],
            OverlapPolicy::Allow,
        );

        advance(5_600).await;
        assert_eq!(h.view.read().await.snapshot().records[0].id.as_str(), "quick");

        advance(1_500).await;
        let view = h.view.read().await;
        assert_eq!(view.snapshot().records[0].id.as_str(), "slow");
        assert_eq!(view.snapshot().cycle, 2);
        drop(view);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_held_state() {
        let h = start(
            vec![
                (Duration::ZERO, Ok(records(&["b", "a"]))),
                (
                    Duration::ZERO,
                    Err(FeedError::Status {
                        status: 500,
                        message: "boom".to_string(),
                    }),
                ),
            ],
            OverlapPolicy::Skip,
        );
        let mut events = h.hub.subscribe_broadcast();

        advance(5_100).await;
        assert_eq!(h.source.calls(), 2);

        let status = h.status.read().await.clone();
        assert_eq!(status.successes, 1);
        assert_eq!(status.failures, 1);
        assert_eq!(status.last_error.as_deref(), Some("Upstream returned 500: boom"));

        let view = h.view.read().await;
        assert_eq!(view.snapshot().cycle, 1);
        assert_eq!(view.snapshot().len(), 2);
        assert_eq!(view.scene().live_len(), 2);
        drop(view);

        assert!(matches!(
            events.recv().await.unwrap().message,
            ServerMessage::ScenePatch { cycle: 1, added: 2, .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap().message,
            ServerMessage::RefreshFailed { cycle: 2, .. }
        ));

        // Timer keeps firing after a failure
        advance(5_000).await;
        assert_eq!(h.source.calls(), 3);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    fn decode(body: &str) -> Result<Vec<Record>, FeedError> {
        serde_json::from_str::<crate::records::QueryResponse>(body)
            .map(|response| response.into_records())
            .map_err(|e| FeedError::Decode(e.to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_without_data_keeps_scene() {
        let h = start(
            vec![
                (Duration::ZERO, Ok(records(&["c", "b", "a"]))),
                (Duration::ZERO, decode(r#"{"result": {}}"#)),
            ],
            OverlapPolicy::Skip,
        );

        advance(5_100).await;
        assert_eq!(h.source.calls(), 2);

        let status = h.status.read().await.clone();
        assert_eq!(status.successes, 1);
        assert_eq!(status.failures, 1);
        assert!(status.last_error.is_some());
        assert_eq!(status.records, 3);

        let view = h.view.read().await;
        assert_eq!(view.snapshot().cycle, 1);
        assert_eq!(view.snapshot().len(), 3);
        assert_eq!(view.scene().live_len(), 3);
        drop(view);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_refreshes_immediately() {
        let h = start(Vec::new(), OverlapPolicy::Skip);
        advance(10).await;
        assert_eq!(h.source.calls(), 1);

        h.trigger.notify_one();
        advance(10).await;
        assert_eq!(h.source.calls(), 2);

        // The ticker restarted from the trigger
        advance(4_900).await;
        assert_eq!(h.source.calls(), 2);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_poller_and_fetches() {
        let h = start(
            vec![(Duration::from_secs(60), Ok(records(&["never"])))],
            OverlapPolicy::Skip,
        );
        advance(10).await;
        assert_eq!(h.status.read().await.in_flight, 1);

        h.cancel.cancel();
        h.handle.await.unwrap();

        let status = h.status.read().await.clone();
        assert!(!status.running);
        assert_eq!(status.in_flight, 0);
        assert_eq!(status.successes, 0);
        assert!(h.view.read().await.snapshot().is_empty());
    }
}
