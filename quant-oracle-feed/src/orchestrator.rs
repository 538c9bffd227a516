//! Periodic multi-feed refresh.
//!
//! The [`RefreshOrchestrator`] is the single writer of [`DashboardState`]. Each
//! refresh cycle fetches metrics, posts and timeline concurrently and, only if
//! all three succeed, publishes them as one new snapshot. Readers hold
//! `watch::Receiver<Arc<DashboardState>>` handles and never see a mix of cycles.
//!
//! Cycles are numbered at dispatch. Under [`ApplyPolicy::Sequenced`] a cycle
//! that completes after a later-dispatched one has already been applied is
//! dropped as stale.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures::{FutureExt, future::BoxFuture};
use parking_lot::Mutex;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::{ApplyPolicy, DashboardConfig},
    error::{FeedError, FeedKind},
    source::FeedSource,
    types::{MetricsSnapshot, Post, TimelineSample},
};

/// Everything the dashboard displays from the periodic feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    /// `None` until the first successful cycle
    pub metrics: Option<MetricsSnapshot>,
    pub posts: Arc<[Post]>,
    pub timeline: Arc<[TimelineSample]>,
    pub loading: bool,
    /// Dispatch number of the cycle these values came from
    pub cycle: Option<u64>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            metrics: None,
            posts: Arc::from(Vec::new()),
            timeline: Arc::from(Vec::new()),
            loading: false,
            cycle: None,
            refreshed_at: None,
        }
    }
}

/// What happened to a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// All feeds succeeded and the state was replaced.
    Applied,
    /// At least one feed failed; previous state kept.
    Failed,
    /// All feeds succeeded but a later cycle was already applied.
    Stale,
    /// Completed after the orchestrator was deactivated.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
struct RefreshSettings {
    posts_limit: usize,
    timeline_limit: usize,
    apply_policy: ApplyPolicy,
}

struct Shared<S> {
    source: Arc<S>,
    settings: RefreshSettings,
    state_tx: watch::Sender<Arc<DashboardState>>,
    last_dispatched: AtomicU64,
    deactivated: AtomicBool,
}

impl<S> Shared<S>
where
    S: FeedSource,
{
    /// Tag a new cycle.
    fn dispatch(&self) -> u64 {
        self.last_dispatched.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn run_cycle(&self, cycle: u64) -> CycleOutcome {
        debug!(cycle, "refresh cycle dispatched");

        let (metrics, posts, timeline) = tokio::join!(
            self.source.fetch_metrics(),
            self.source.fetch_posts(self.settings.posts_limit),
            self.source.fetch_timeline(self.settings.timeline_limit),
        );

        match (metrics, posts, timeline) {
            (Ok(metrics), Ok(posts), Ok(timeline)) => {
                self.apply(cycle, metrics, posts, timeline)
            }
            (metrics, posts, timeline) => {
                log_failure(cycle, FeedKind::Metrics, metrics.err());
                log_failure(cycle, FeedKind::Posts, posts.err());
                log_failure(cycle, FeedKind::Timeline, timeline.err());
                self.settle_failed(cycle)
            }
        }
    }

    fn apply(
        &self,
        cycle: u64,
        metrics: MetricsSnapshot,
        posts: Vec<Post>,
        timeline: Vec<TimelineSample>,
    ) -> CycleOutcome {
        let mut outcome = CycleOutcome::Applied;

        self.state_tx.send_if_modified(|state| {
            if self.deactivated.load(Ordering::Acquire) {
                outcome = CycleOutcome::Discarded;
                return false;
            }

            let supersedes = match self.settings.apply_policy {
                ApplyPolicy::Sequenced => state.cycle.is_none_or(|applied| cycle > applied),
                ApplyPolicy::LastWriterWins => true,
            };

            if !supersedes {
                outcome = CycleOutcome::Stale;
                return clear_loading(state);
            }

            *state = Arc::new(DashboardState {
                metrics: Some(metrics),
                posts: Arc::from(posts),
                timeline: Arc::from(timeline),
                loading: false,
                cycle: Some(cycle),
                refreshed_at: Some(Utc::now()),
            });
            true
        });

        match outcome {
            CycleOutcome::Applied => info!(cycle, "dashboard state refreshed"),
            CycleOutcome::Stale => debug!(cycle, "refresh cycle superseded by a later cycle, discarding"),
            _ => debug!(cycle, "refresh cycle completed after deactivation, discarding"),
        }
        outcome
    }

    fn settle_failed(&self, cycle: u64) -> CycleOutcome {
        let mut outcome = CycleOutcome::Failed;

        self.state_tx.send_if_modified(|state| {
            if self.deactivated.load(Ordering::Acquire) {
                outcome = CycleOutcome::Discarded;
                return false;
            }
            clear_loading(state)
        });

        if outcome == CycleOutcome::Discarded {
            debug!(cycle, "failed refresh cycle completed after deactivation");
        }
        outcome
    }
}

/// Replace the snapshot with one that has `loading` cleared, if it was set.
fn clear_loading(state: &mut Arc<DashboardState>) -> bool {
    if !state.loading {
        return false;
    }
    *state = Arc::new(DashboardState {
        loading: false,
        ..DashboardState::clone(state)
    });
    true
}

fn log_failure(cycle: u64, feed: FeedKind, error: Option<FeedError>) {
    let Some(error) = error else {
        return;
    };

    if error.is_transient() {
        warn!(cycle, %feed, %error, "feed request failed, keeping previous dashboard state");
    } else {
        error!(cycle, %feed, %error, "feed request failed, keeping previous dashboard state");
    }
}

/// Drives periodic retrieval of the dashboard feeds and owns [`DashboardState`].
///
/// Dropping the orchestrator deactivates it.
pub struct RefreshOrchestrator<S> {
    shared: Arc<Shared<S>>,
    refresh_interval: Duration,
    schedule: Mutex<Option<JoinHandle<()>>>,
}

impl<S> RefreshOrchestrator<S>
where
    S: FeedSource,
{
    pub fn new(source: Arc<S>, config: &DashboardConfig) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(DashboardState::default()));

        Self {
            shared: Arc::new(Shared {
                source,
                settings: RefreshSettings {
                    posts_limit: config.posts_limit,
                    timeline_limit: config.timeline_limit,
                    apply_policy: config.apply_policy,
                },
                state_tx,
                last_dispatched: AtomicU64::new(0),
                deactivated: AtomicBool::new(false),
            }),
            refresh_interval: config.refresh_interval.max(Duration::from_millis(1)),
            schedule: Mutex::new(None),
        }
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.shared.state_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<DashboardState> {
        Arc::clone(&self.shared.state_tx.borrow())
    }

    /// Whether the periodic schedule is running.
    pub fn is_active(&self) -> bool {
        self.schedule.lock().is_some()
    }

    /// Run one refresh cycle.
    ///
    /// The cycle number is assigned when this is called, not when the returned
    /// future is first polled. Errors are logged, never returned.
    pub fn refresh(&self) -> BoxFuture<'static, CycleOutcome> {
        let shared = Arc::clone(&self.shared);
        let cycle = shared.dispatch();
        async move { shared.run_cycle(cycle).await }.boxed()
    }

    /// Run one extra cycle in the background without touching the schedule.
    pub fn manual_refresh(&self) -> JoinHandle<CycleOutcome> {
        info!("manual refresh requested");
        tokio::spawn(self.refresh())
    }

    /// Set `loading`, start an initial cycle and schedule one every refresh interval.
    ///
    /// Must be called from within a tokio runtime. Calling it on an active or
    /// deactivated orchestrator does nothing.
    pub fn activate(&self) {
        let mut schedule = self.schedule.lock();
        if schedule.is_some() {
            return;
        }
        if self.shared.deactivated.load(Ordering::Acquire) {
            warn!("refresh orchestrator already deactivated, ignoring activate");
            return;
        }

        info!(interval = ?self.refresh_interval, "activating refresh orchestrator");

        self.shared.state_tx.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            *state = Arc::new(DashboardState {
                loading: true,
                ..DashboardState::clone(state)
            });
            true
        });

        tokio::spawn(self.refresh());

        let shared = Arc::clone(&self.shared);
        let period = self.refresh_interval;
        *schedule = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let shared = Arc::clone(&shared);
                let cycle = shared.dispatch();
                // In-flight cycles outlive the schedule; deactivation only stops new ones
                tokio::spawn(async move { shared.run_cycle(cycle).await });
            }
        }));
    }

    /// Cancel the schedule. Cycles still in flight complete but publish nothing.
    pub fn deactivate(&self) {
        // Set the flag under the watch lock so no apply can interleave with it
        self.shared.state_tx.send_if_modified(|_| {
            self.shared.deactivated.store(true, Ordering::Release);
            false
        });

        if let Some(schedule) = self.schedule.lock().take() {
            schedule.abort();
            info!("refresh orchestrator deactivated");
        }
    }
}

impl<S> Drop for RefreshOrchestrator<S> {
    fn drop(&mut self) {
        self.shared.deactivated.store(true, Ordering::Release);
        if let Some(schedule) = self.schedule.get_mut().take() {
            schedule.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        source::HttpFeedSource,
        test_support::{ScriptedSource, metrics, post, sample, serve_http},
    };
    use std::time::Duration;

    fn config() -> DashboardConfig {
        DashboardConfig::default().with_ws_url(None)
    }

    fn orchestrator(source: &Arc<ScriptedSource>) -> RefreshOrchestrator<ScriptedSource> {
        RefreshOrchestrator::new(Arc::clone(source), &config())
    }

    #[tokio::test]
    async fn test_refresh_success_replaces_whole_state() {
        let source = Arc::new(ScriptedSource::new());
        source.set_metrics(Ok(metrics(15)));
        source.set_posts(Ok(vec![post("a", 0.7), post("b", -0.6)]));
        source.set_timeline(Ok(vec![sample(2000, 0.1), sample(1000, -0.2)]));

        let orchestrator = orchestrator(&source);
        let outcome = orchestrator.refresh().await;

        let state = orchestrator.state();
        assert_eq!(outcome, CycleOutcome::Applied);
        assert_eq!(state.metrics, Some(metrics(15)));
        assert_eq!(state.posts.len(), 2);
        assert_eq!(&*state.timeline, &[sample(2000, 0.1), sample(1000, -0.2)]);
        assert!(!state.loading);
        assert_eq!(state.cycle, Some(1));
        assert_eq!(source.posts_limits(), vec![50]);
        assert_eq!(source.timeline_limits(), vec![100]);
    }

    #[tokio::test]
    async fn test_refresh_single_failure_keeps_previous_state() {
        struct TestCase {
            failing: FeedKind,
        }

        let tests = vec![
            TestCase { failing: FeedKind::Metrics },
            TestCase { failing: FeedKind::Posts },
            TestCase { failing: FeedKind::Timeline },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let source = Arc::new(ScriptedSource::new());
            source.set_metrics(Ok(metrics(1)));
            source.set_posts(Ok(vec![post("first", 0.1)]));
            source.set_timeline(Ok(vec![sample(1000, 0.1)]));

            let orchestrator = orchestrator(&source);
            assert_eq!(orchestrator.refresh().await, CycleOutcome::Applied);
            let before = orchestrator.state();

            source.set_metrics(Ok(metrics(2)));
            source.set_posts(Ok(vec![post("second", 0.2)]));
            source.set_timeline(Ok(vec![sample(5000, 0.5)]));
            source.fail(test.failing);

            let outcome = orchestrator.refresh().await;
            let after = orchestrator.state();

            assert_eq!(outcome, CycleOutcome::Failed, "TC{} failed", index);
            assert_eq!(after, before, "TC{} failed", index);
            assert!(!after.loading, "TC{} failed", index);
        }
    }

    #[tokio::test]
    async fn test_http_source_failure_keeps_previous_state() {
        let healthy = Arc::new(AtomicBool::new(true));
        let base_url = {
            let healthy = Arc::clone(&healthy);
            serve_http(move |target| {
                if !healthy.load(Ordering::SeqCst) {
                    return Some((503, r#"{"detail": "unavailable"}"#.to_string()));
                }
                let body = match target.split('?').next() {
                    Some("/api/metrics") => serde_json::to_value(metrics(21)).unwrap(),
                    Some("/api/posts") => serde_json::json!({ "posts": [post("live", 0.6)] }),
                    Some("/api/sentiment-timeline") => {
                        serde_json::json!({ "timeline": [sample(3000, 0.3)] })
                    }
                    _ => return Some((404, "{}".to_string())),
                };
                Some((200, body.to_string()))
            })
            .await
        };

        let config = DashboardConfig::new(base_url).with_ws_url(None);
        let source = Arc::new(HttpFeedSource::new(&config).unwrap());
        let orchestrator = RefreshOrchestrator::new(source, &config);

        assert_eq!(orchestrator.refresh().await, CycleOutcome::Applied);
        let before = orchestrator.state();
        assert_eq!(before.metrics, Some(metrics(21)));
        assert_eq!(&*before.posts, &[post("live", 0.6)]);
        assert_eq!(&*before.timeline, &[sample(3000, 0.3)]);

        healthy.store(false, Ordering::SeqCst);
        assert_eq!(orchestrator.refresh().await, CycleOutcome::Failed);
        assert_eq!(orchestrator.state(), before);

        healthy.store(true, Ordering::SeqCst);
        assert_eq!(orchestrator.refresh().await, CycleOutcome::Applied);
        assert_eq!(orchestrator.state().cycle, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_failure_still_exits_loading() {
        let source = Arc::new(ScriptedSource::new());
        source.fail(FeedKind::Posts);

        let orchestrator = orchestrator(&source);
        orchestrator.activate();
        assert!(orchestrator.state().loading);

        let mut state_rx = orchestrator.subscribe();
        state_rx
            .wait_for(|state| !state.loading)
            .await
            .unwrap();

        let state = orchestrator.state();
        assert!(state.metrics.is_none());
        assert!(state.posts.is_empty());
        assert!(state.cycle.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_schedule() {
        let source = Arc::new(ScriptedSource::new());
        let orchestrator = orchestrator(&source);

        orchestrator.activate();
        tokio::time::sleep(Duration::from_millis(25_000)).await;

        // initial + t=10s + t=20s
        assert_eq!(source.metrics_calls(), 3);
        assert_eq!(orchestrator.state().cycle, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_does_not_shift_schedule() {
        let source = Arc::new(ScriptedSource::new());
        let orchestrator = orchestrator(&source);

        orchestrator.activate();
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(
            orchestrator.manual_refresh().await.unwrap(),
            CycleOutcome::Applied
        );
        assert_eq!(source.metrics_calls(), 2);

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        // t=10.5s: the scheduled cycle at t=10s still fired
        assert_eq!(source.metrics_calls(), 3);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(source.metrics_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_stops_schedule() {
        let source = Arc::new(ScriptedSource::new());
        let orchestrator = orchestrator(&source);

        orchestrator.activate();
        assert!(orchestrator.is_active());
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(source.metrics_calls(), 1);

        orchestrator.deactivate();
        assert!(!orchestrator.is_active());
        tokio::time::sleep(Duration::from_millis(60_000)).await;
        assert_eq!(source.metrics_calls(), 1);

        // A deactivated orchestrator cannot be revived
        orchestrator.activate();
        assert!(!orchestrator.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_cycle_discarded_after_deactivate() {
        let source = Arc::new(ScriptedSource::new());
        let orchestrator = orchestrator(&source);
        let before = orchestrator.state();

        source.set_timeline_delay(Duration::from_secs(3));
        let in_flight = orchestrator.manual_refresh();
        tokio::time::sleep(Duration::from_secs(1)).await;

        orchestrator.deactivate();
        assert_eq!(in_flight.await.unwrap(), CycleOutcome::Discarded);
        assert_eq!(orchestrator.state(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequenced_policy_discards_stale_cycle() {
        let source = Arc::new(ScriptedSource::new());
        let orchestrator = orchestrator(&source);

        // Cycle 1 is slow and returns the old window
        source.set_metrics(Ok(metrics(1)));
        source.set_metrics_delay(Duration::from_secs(5));
        let slow = tokio::spawn(orchestrator.refresh());
        tokio::task::yield_now().await;

        // Cycle 2 is fast and returns the new window
        source.set_metrics(Ok(metrics(2)));
        source.set_metrics_delay(Duration::ZERO);
        assert_eq!(orchestrator.refresh().await, CycleOutcome::Applied);

        assert_eq!(slow.await.unwrap(), CycleOutcome::Stale);
        let state = orchestrator.state();
        assert_eq!(state.cycle, Some(2));
        assert_eq!(state.metrics, Some(metrics(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_writer_wins_policy_applies_late_cycle() {
        let source = Arc::new(ScriptedSource::new());
        let orchestrator = RefreshOrchestrator::new(
            Arc::clone(&source),
            &config().with_apply_policy(ApplyPolicy::LastWriterWins),
        );

        source.set_metrics(Ok(metrics(1)));
        source.set_metrics_delay(Duration::from_secs(5));
        let slow = tokio::spawn(orchestrator.refresh());
        tokio::task::yield_now().await;

        source.set_metrics(Ok(metrics(2)));
        source.set_metrics_delay(Duration::ZERO);
        assert_eq!(orchestrator.refresh().await, CycleOutcome::Applied);

        assert_eq!(slow.await.unwrap(), CycleOutcome::Applied);
        let state = orchestrator.state();
        assert_eq!(state.cycle, Some(1));
        assert_eq!(state.metrics, Some(metrics(1)));
    }

    #[tokio::test]
    async fn test_subscribers_observe_whole_snapshots() {
        let source = Arc::new(ScriptedSource::new());
        source.set_metrics(Ok(metrics(7)));
        source.set_posts(Ok(vec![post("x", 0.9)]));
        source.set_timeline(Ok(vec![sample(3000, 0.3)]));

        let orchestrator = orchestrator(&source);
        let mut state_rx = orchestrator.subscribe();

        orchestrator.refresh().await;
        assert!(state_rx.has_changed().unwrap());

        let snapshot = Arc::clone(&state_rx.borrow_and_update());
        assert_eq!(snapshot.cycle, Some(1));
        assert_eq!(snapshot.metrics.as_ref().map(|m| m.total_posts), Some(7));
        assert_eq!(snapshot.posts[0].id, "x");
        assert_eq!(snapshot.timeline.len(), 1);
    }
}
