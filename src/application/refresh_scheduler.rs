// Refresh scheduler - keeps every tracked satellite's predictions ahead of the map clock
//
// Each tick reads the map clock once, works out which window must already be cached and
// which window to request, and spawns one independent fetch per under-covered satellite.
// Fetches never block the loop; a slow or failing satellite only affects itself.
use crate::application::display_sink::DisplaySink;
use crate::application::entity_registry::{EntityRegistry, FetchLease, FetchSlot};
use crate::application::events::{EventBus, TrackerEvent};
use crate::application::map_clock::{ClockError, MapClock};
use crate::application::prediction_fetcher::{FetchError, PredictionFetcher};
use crate::domain::coverage::{covers, CoverageWindow};
use crate::domain::prediction::{PositionSample, PredictedPath};
use crate::domain::satellite::TrajectoryDescriptor;
use crate::domain::time::{Direction, MapInstant, RealInstant, TimeScale};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_CHUNK_SPAN: Duration = Duration::from_secs(30 * 60);
const DEFAULT_LOW_THRESHOLD: Duration = Duration::from_secs(15 * 60);

/// Chunking and throttling settings, all in real (wall clock) time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshPolicy {
    /// How often coverage is checked. Also the timeout of each fetch.
    pub refresh_interval: Duration,
    /// Half width of each requested chunk around map now.
    pub chunk_span: Duration,
    /// How far ahead of map now predictions must always reach.
    pub low_threshold: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            chunk_span: DEFAULT_CHUNK_SPAN,
            low_threshold: DEFAULT_LOW_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequiredWindows {
    pub map_now: MapInstant,
    /// Must already be cached, otherwise the satellite is under-covered.
    pub ensure: CoverageWindow,
    /// What gets requested for an under-covered satellite.
    pub fetch: CoverageWindow,
}

impl RefreshPolicy {
    pub fn required_windows(&self, map_now: MapInstant, scale: &TimeScale) -> RequiredWindows {
        let threshold = scale.to_map_duration(self.low_threshold);
        let around = scale.to_map_duration(self.chunk_span);

        // the map runs out of predictions on the side it is moving towards
        let ensure = match scale.direction() {
            Direction::Forward => CoverageWindow::starting_at(map_now, threshold),
            Direction::Backward => CoverageWindow::ending_at(map_now, threshold),
        };

        RequiredWindows {
            map_now,
            ensure,
            fetch: CoverageWindow::centered_on(map_now, around),
        }
    }

    /// Wall clock instant at which `coverage` stops containing the ensure window, given the
    /// clock was at `anchor` and keeps its current scale. `None` if that never happens.
    pub fn refresh_due(
        &self,
        coverage: &CoverageWindow,
        anchor: (RealInstant, MapInstant),
        scale: &TimeScale,
    ) -> Option<RealInstant> {
        let (real_anchor, map_anchor) = anchor;
        if !coverage.contains(&self.required_windows(map_anchor, scale).ensure) {
            return Some(real_anchor);
        }

        let threshold = scale.to_map_duration(self.low_threshold);
        let last_covered = match scale.direction() {
            Direction::Forward => coverage.end() - threshold,
            Direction::Backward => coverage.start() + threshold,
        };
        scale.map_to_real_instant(anchor, last_covered)
    }
}

/// The clock reading a tick worked from.
#[derive(Debug, Clone, Copy)]
struct ClockReading {
    taken_at: RealInstant,
    map_now: MapInstant,
    scale: TimeScale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoDescriptor,
    AlreadyCovered,
    FetchInFlight,
    EntityRemoved,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Covered {
        window: CoverageWindow,
        samples: Arc<[PositionSample]>,
    },
    Failed(FetchError),
    Skipped(SkipReason),
}

/// A fetch spawned during a tick. Dropping it leaves the fetch running.
pub struct PendingFetch {
    pub entity_id: Uuid,
    handle: JoinHandle<FetchOutcome>,
}

impl PendingFetch {
    pub async fn outcome(self) -> FetchOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => FetchOutcome::Skipped(SkipReason::Cancelled),
            Err(e) => FetchOutcome::Failed(FetchError::Transport(format!("fetch task panicked: {}", e))),
        }
    }
}

pub struct TickReport {
    pub windows: RequiredWindows,
    pub skipped: Vec<(Uuid, SkipReason)>,
    pub fetches: Vec<PendingFetch>,
}

impl TickReport {
    pub fn skip_reason(&self, entity_id: Uuid) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|(id, _)| *id == entity_id)
            .map(|(_, reason)| *reason)
    }

    /// Wait for every fetch issued in this tick.
    pub async fn settle(self) -> Vec<(Uuid, FetchOutcome)> {
        let mut outcomes = Vec::with_capacity(self.fetches.len());
        for fetch in self.fetches {
            let entity_id = fetch.entity_id;
            outcomes.push((entity_id, fetch.outcome().await));
        }
        outcomes
    }
}

pub struct RefreshScheduler {
    registry: Arc<EntityRegistry>,
    fetcher: Arc<dyn PredictionFetcher>,
    clock: Arc<dyn MapClock>,
    sink: Arc<dyn DisplaySink>,
    events: EventBus,
    policy: RefreshPolicy,
    shutdown: CancellationToken,
}

impl RefreshScheduler {
    pub fn new(
        registry: Arc<EntityRegistry>,
        fetcher: Arc<dyn PredictionFetcher>,
        clock: Arc<dyn MapClock>,
        sink: Arc<dyn DisplaySink>,
        events: EventBus,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            registry,
            fetcher,
            clock,
            sink,
            events,
            policy,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// Token that stops `run` and every fetch still in flight once cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Tick every `refresh_interval` until stopped.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.policy.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            refresh_interval_secs = self.policy.refresh_interval.as_secs_f64(),
            chunk_span_secs = self.policy.chunk_span.as_secs(),
            low_threshold_secs = self.policy.low_threshold.as_secs(),
            "Prediction refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Prediction refresh scheduler stopping");
                    break;
                }
                _ = interval.tick() => match self.tick() {
                    Ok(report) => tracing::debug!(
                        fetches = report.fetches.len(),
                        skipped = report.skipped.len(),
                        "Refresh tick done"
                    ),
                    Err(error) => tracing::warn!(error = %error, "Refresh tick aborted"),
                },
            }
        }
    }

    /// Check every tracked satellite against one snapshot of the map clock and spawn the
    /// fetches needed. Returns without waiting for any of them.
    pub fn tick(&self) -> Result<TickReport, ClockError> {
        let map_now = self.clock.current_map_instant()?;
        let scale = self.clock.current_time_scale()?;
        let windows = self.policy.required_windows(map_now, &scale);
        let reading = ClockReading {
            taken_at: RealInstant::now(),
            map_now,
            scale,
        };

        tracing::debug!(
            map_now = %map_now,
            ensure = %windows.ensure,
            fetch = %windows.fetch,
            "Checking satellite paths for required predictions"
        );

        let mut report = TickReport {
            windows,
            skipped: Vec::new(),
            fetches: Vec::new(),
        };

        for entity in self.registry.list() {
            let entity_id = entity.id();
            let Some(descriptor) = entity.descriptor().cloned() else {
                report.skipped.push((entity_id, SkipReason::NoDescriptor));
                continue;
            };

            if covers(&entity, &windows.ensure) {
                report.skipped.push((entity_id, SkipReason::AlreadyCovered));
                continue;
            }

            match self.registry.try_begin_fetch(entity_id) {
                FetchSlot::Acquired(lease) => {
                    tracing::debug!(
                        entity_id = %entity_id,
                        satellite = %entity.satellite.name,
                        "Requesting path"
                    );
                    report.fetches.push(self.spawn_fetch(
                        lease,
                        descriptor,
                        windows.fetch,
                        reading,
                        entity.satellite.name,
                    ));
                }
                FetchSlot::InFlight => report.skipped.push((entity_id, SkipReason::FetchInFlight)),
                FetchSlot::Missing => report.skipped.push((entity_id, SkipReason::EntityRemoved)),
            }
        }

        Ok(report)
    }

    fn spawn_fetch(
        &self,
        lease: FetchLease,
        descriptor: TrajectoryDescriptor,
        window: CoverageWindow,
        reading: ClockReading,
        name: String,
    ) -> PendingFetch {
        let entity_id = lease.entity_id();
        let policy = self.policy;
        let fetcher = Arc::clone(&self.fetcher);
        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        let cancel = self.shutdown.child_token();
        let timeout = self.policy.refresh_interval;

        let handle = tokio::spawn(async move {
            let request = tokio::time::timeout(
                timeout,
                fetcher.fetch(entity_id, &descriptor, window, timeout),
            );

            let result = tokio::select! {
                _ = cancel.cancelled() => return FetchOutcome::Skipped(SkipReason::Cancelled),
                result = request => result.unwrap_or_else(|_| Err(FetchError::Timeout(timeout))),
            };

            let outcome = complete_fetch(lease, result, sink.as_ref(), &events, &name);
            if let FetchOutcome::Covered { window, .. } = &outcome {
                let anchor = (reading.taken_at, reading.map_now);
                match policy.refresh_due(window, anchor, &reading.scale) {
                    Some(due) => {
                        let wait = due.saturating_duration_since(RealInstant::now());
                        tracing::debug!(
                            entity_id = %entity_id,
                            refresh_due_in_secs = wait.as_secs_f64(),
                            "Next refresh due"
                        );
                    }
                    None => tracing::debug!(
                        entity_id = %entity_id,
                        "Coverage holds at the current time scale"
                    ),
                }
            }
            outcome
        });

        PendingFetch { entity_id, handle }
    }
}

fn complete_fetch(
    lease: FetchLease,
    result: Result<PredictedPath, FetchError>,
    sink: &dyn DisplaySink,
    events: &EventBus,
    name: &str,
) -> FetchOutcome {
    let entity_id = lease.entity_id();

    let path = match result {
        Ok(path) => path,
        Err(error) => {
            tracing::warn!(
                entity_id = %entity_id,
                satellite = %name,
                error = %error,
                "Error getting path for satellite"
            );
            return FetchOutcome::Failed(error);
        }
    };

    match lease.apply(&path) {
        Ok(entity) => {
            tracing::info!(
                entity_id = %entity_id,
                satellite = %name,
                window = %path.window,
                samples = path.samples.len(),
                "Path received"
            );
            sink.update(entity_id, Arc::clone(&entity.samples), &entity.satellite.style);
            events.publish(TrackerEvent::PredictionUpdated {
                entity_id,
                window: path.window,
            });
            FetchOutcome::Covered {
                window: path.window,
                samples: path.samples,
            }
        }
        Err(stale) => {
            tracing::debug!(error = %stale, "Discarding predictions for removed satellite");
            FetchOutcome::Skipped(SkipReason::EntityRemoved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::*;
    use crate::domain::satellite::fixtures::iss_descriptor;
    use crate::domain::satellite::{Satellite, TrackedEntity};
    use crate::domain::time::MapDuration;
    use tokio::sync::Notify;
    use tokio::time::Instant;

    struct Harness {
        registry: Arc<EntityRegistry>,
        fetcher: Arc<ScriptedFetcher>,
        sink: Arc<RecordingSink>,
        events: EventBus,
        scheduler: Arc<RefreshScheduler>,
    }

    fn harness_with_clock(clock: Arc<dyn MapClock>) -> Harness {
        let registry = Arc::new(EntityRegistry::new());
        let fetcher = Arc::new(ScriptedFetcher::default());
        let sink = Arc::new(RecordingSink::default());
        let events = EventBus::default();
        let scheduler = Arc::new(RefreshScheduler::new(
            registry.clone(),
            fetcher.clone(),
            clock,
            sink.clone(),
            events.clone(),
            RefreshPolicy::default(),
        ));

        Harness {
            registry,
            fetcher,
            sink,
            events,
            scheduler,
        }
    }

    fn harness() -> Harness {
        harness_with_clock(Arc::new(FixedClock::at(t0())))
    }

    fn track(registry: &EntityRegistry, name: &str) -> Uuid {
        let entity = TrackedEntity::new(Satellite::new(name).with_descriptor(iss_descriptor()));
        let id = entity.id();
        registry.add(entity);
        id
    }

    #[test]
    fn test_required_windows_follow_time_scale() {
        let policy = RefreshPolicy::default();

        let windows = policy.required_windows(t0(), &TimeScale::default());
        assert_eq!(windows.ensure, CoverageWindow::starting_at(t0(), MapDuration::minutes(15)));
        assert_eq!(windows.fetch, CoverageWindow::centered_on(t0(), MapDuration::minutes(30)));

        let fast = TimeScale::new(2.0, Direction::Forward).unwrap();
        let windows = policy.required_windows(t0(), &fast);
        assert_eq!(windows.ensure.end(), t0() + MapDuration::minutes(30));
        assert_eq!(windows.fetch.start(), t0() - MapDuration::minutes(60));

        let backward = TimeScale::new(1.0, Direction::Backward).unwrap();
        let windows = policy.required_windows(t0(), &backward);
        assert_eq!(windows.ensure, CoverageWindow::ending_at(t0(), MapDuration::minutes(15)));

        let paused = TimeScale::default().paused(true);
        let windows = policy.required_windows(t0(), &paused);
        assert_eq!(windows.ensure.start(), windows.ensure.end());
    }

    #[test]
    fn test_required_windows_saturate_at_huge_rate() {
        let scale = TimeScale::new(1e12, Direction::Forward).unwrap();
        let windows = RefreshPolicy::default().required_windows(t0(), &scale);

        assert_eq!(windows.ensure.start(), t0());
        assert_eq!(windows.ensure.end().as_datetime(), chrono::DateTime::<chrono::Utc>::MAX_UTC);
        assert_eq!(windows.fetch.start().as_datetime(), chrono::DateTime::<chrono::Utc>::MIN_UTC);
    }

    #[test]
    fn test_refresh_due_when_coverage_runs_short() {
        let policy = RefreshPolicy::default();
        let real_anchor = RealInstant::now();
        let anchor = (real_anchor, t0());
        let coverage = CoverageWindow::centered_on(t0(), MapDuration::minutes(30));

        // 30 min of coverage ahead, 15 min must stay cached
        let due = policy.refresh_due(&coverage, anchor, &TimeScale::default()).unwrap();
        assert_eq!(due - real_anchor, Duration::from_secs(15 * 60));

        // 7.5 map minutes must stay cached behind, 22.5 map minutes left at half speed
        let backward = TimeScale::new(0.5, Direction::Backward).unwrap();
        let due = policy.refresh_due(&coverage, anchor, &backward).unwrap();
        assert_eq!(due - real_anchor, Duration::from_secs(45 * 60));

        let short = CoverageWindow::starting_at(t0(), MapDuration::minutes(10));
        assert_eq!(policy.refresh_due(&short, anchor, &TimeScale::default()), Some(real_anchor));

        let paused = TimeScale::default().paused(true);
        assert!(policy.refresh_due(&coverage, anchor, &paused).is_none());
    }

    #[tokio::test]
    async fn test_entity_without_descriptor_is_skipped() {
        let h = harness();
        let entity = TrackedEntity::new(Satellite::new("no tle yet"));
        let id = entity.id();
        h.registry.add(entity);

        let report = h.scheduler.tick().unwrap();

        assert!(report.fetches.is_empty());
        assert_eq!(report.skip_reason(id), Some(SkipReason::NoDescriptor));
        assert!(h.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_uncovered_entity_fetches_full_chunk() {
        let h = harness();
        let id = track(&h.registry, "ISS");
        let mut events = h.events.subscribe();

        let report = h.scheduler.tick().unwrap();
        assert_eq!(report.fetches.len(), 1);
        let outcomes = report.settle().await;

        let expected = CoverageWindow::new(
            t0() - MapDuration::minutes(30),
            t0() + MapDuration::minutes(30),
        )
        .unwrap();
        let calls = h.fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].window, expected);
        assert_eq!(calls[0].timeout, Duration::from_secs(5));
        assert!(matches!(&outcomes[0].1, FetchOutcome::Covered { window, .. } if *window == expected));

        let entity = h.registry.get(id).unwrap();
        let ensure = CoverageWindow::starting_at(t0(), MapDuration::minutes(15));
        assert!(covers(&entity, &ensure));
        assert_eq!(h.sink.updated_ids(), vec![id]);
        assert!(!h.registry.is_fetch_in_flight(id));

        match events.recv().await.unwrap() {
            TrackerEvent::PredictionUpdated { entity_id, window } => {
                assert_eq!(entity_id, id);
                assert_eq!(window, expected);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fast_clock_widens_requested_chunk() {
        let scale = TimeScale::new(60.0, Direction::Forward).unwrap();
        let h = harness_with_clock(Arc::new(FixedClock::at(t0()).with_scale(scale)));
        let id = track(&h.registry, "ISS");

        h.scheduler.tick().unwrap().settle().await;

        let calls = h.fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].window,
            CoverageWindow::centered_on(t0(), MapDuration::minutes(30 * 60))
        );

        // 15 real minutes ahead is 15 map hours, still inside the chunk
        let entity = h.registry.get(id).unwrap();
        assert!(covers(&entity, &CoverageWindow::starting_at(t0(), MapDuration::minutes(15 * 60))));
        let report = h.scheduler.tick().unwrap();
        assert_eq!(report.skip_reason(id), Some(SkipReason::AlreadyCovered));
    }

    #[tokio::test]
    async fn test_backward_clock_needs_coverage_behind_map_now() {
        let scale = TimeScale::new(1.0, Direction::Backward).unwrap();
        let h = harness_with_clock(Arc::new(FixedClock::at(t0()).with_scale(scale)));

        // plenty ahead, nothing behind
        let mut entity = TrackedEntity::new(Satellite::new("ISS").with_descriptor(iss_descriptor()));
        entity.coverage = Some(CoverageWindow::starting_at(t0(), MapDuration::minutes(60)));
        let id = entity.id();
        h.registry.add(entity);

        let report = h.scheduler.tick().unwrap();
        assert_eq!(
            report.windows.ensure,
            CoverageWindow::ending_at(t0(), MapDuration::minutes(15))
        );
        report.settle().await;

        let calls = h.fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].window,
            CoverageWindow::centered_on(t0(), MapDuration::minutes(30))
        );

        let report = h.scheduler.tick().unwrap();
        assert_eq!(report.skip_reason(id), Some(SkipReason::AlreadyCovered));
        assert_eq!(h.fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_huge_rate_tick_still_fetches() {
        let scale = TimeScale::new(1e12, Direction::Forward).unwrap();
        let h = harness_with_clock(Arc::new(FixedClock::at(t0()).with_scale(scale)));
        let id = track(&h.registry, "ISS");

        let outcomes = h.scheduler.tick().unwrap().settle().await;

        assert!(matches!(outcomes[0].1, FetchOutcome::Covered { .. }));
        assert_eq!(h.sink.updated_ids(), vec![id]);
    }

    #[tokio::test]
    async fn test_covered_entity_is_not_fetched() {
        let h = harness();
        let mut entity = TrackedEntity::new(Satellite::new("ISS").with_descriptor(iss_descriptor()));
        entity.coverage = Some(CoverageWindow::starting_at(t0(), MapDuration::minutes(16)));
        let id = entity.id();
        h.registry.add(entity);

        let report = h.scheduler.tick().unwrap();

        assert!(report.fetches.is_empty());
        assert_eq!(report.skip_reason(id), Some(SkipReason::AlreadyCovered));
        assert!(h.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pending_fetch_is_not_duplicated() {
        let h = harness();
        let id = track(&h.registry, "ISS");
        let release = Arc::new(Notify::new());
        h.fetcher.set(id, Behavior::WaitFor(release.clone()));

        let first = h.scheduler.tick().unwrap();
        assert_eq!(first.fetches.len(), 1);

        let second = h.scheduler.tick().unwrap();
        assert!(second.fetches.is_empty());
        assert_eq!(second.skip_reason(id), Some(SkipReason::FetchInFlight));

        release.notify_one();
        first.settle().await;
        assert_eq!(h.fetcher.calls().len(), 1);
        assert!(!h.registry.is_fetch_in_flight(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_isolated_and_does_not_delay_others() {
        let h = harness();
        let failing = track(&h.registry, "A");
        let slow = track(&h.registry, "B");
        h.fetcher.set(failing, Behavior::Fail(FetchError::ServerError(503)));
        h.fetcher.set(slow, Behavior::Delay(Duration::from_secs(2)));

        let started = Instant::now();
        let mut fetches = h.scheduler.tick().unwrap().fetches.into_iter();
        let failing_fetch = fetches.next().unwrap();
        let slow_fetch = fetches.next().unwrap();

        assert_eq!(
            failing_fetch.outcome().await,
            FetchOutcome::Failed(FetchError::ServerError(503))
        );
        assert!(h.registry.get(slow).unwrap().coverage.is_none());
        assert!(h.registry.is_fetch_in_flight(slow));

        assert!(matches!(slow_fetch.outcome().await, FetchOutcome::Covered { .. }));
        assert!(started.elapsed() < Duration::from_secs(3));

        assert!(h.registry.get(failing).unwrap().coverage.is_none());
        assert!(h.registry.get(slow).unwrap().coverage.is_some());
        assert_eq!(h.sink.updated_ids(), vec![slow]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_cache_and_retries_next_tick() {
        let h = harness();
        let mut entity = TrackedEntity::new(Satellite::new("ISS").with_descriptor(iss_descriptor()));
        let stale = CoverageWindow::ending_at(t0() + MapDuration::minutes(5), MapDuration::minutes(60));
        entity.coverage = Some(stale);
        let id = entity.id();
        h.registry.add(entity);
        h.fetcher.set(id, Behavior::Fail(FetchError::Transport("connection reset".into())));

        h.scheduler.tick().unwrap().settle().await;
        assert_eq!(h.registry.get(id).unwrap().coverage, Some(stale));

        h.fetcher.set(id, Behavior::Succeed);
        let outcomes = h.scheduler.tick().unwrap().settle().await;
        assert!(matches!(outcomes[0].1, FetchOutcome::Covered { .. }));
        assert_eq!(h.fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_removed_entity_discards_late_result() {
        let h = harness();
        let id = track(&h.registry, "ISS");
        let release = Arc::new(Notify::new());
        h.fetcher.set(id, Behavior::WaitFor(release.clone()));

        let report = h.scheduler.tick().unwrap();
        h.registry.remove(id);
        release.notify_one();

        let outcomes = report.settle().await;
        assert_eq!(outcomes[0].1, FetchOutcome::Skipped(SkipReason::EntityRemoved));
        assert!(h.registry.get(id).is_none());
        assert!(h.sink.updated_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out_after_refresh_interval() {
        let h = harness();
        let id = track(&h.registry, "ISS");
        h.fetcher.set(id, Behavior::Delay(Duration::from_secs(60)));

        let outcomes = h.scheduler.tick().unwrap().settle().await;

        assert_eq!(
            outcomes[0].1,
            FetchOutcome::Failed(FetchError::Timeout(Duration::from_secs(5)))
        );
        assert!(!h.registry.is_fetch_in_flight(id));
        assert!(h.registry.get(id).unwrap().coverage.is_none());
    }

    #[tokio::test]
    async fn test_clock_failure_aborts_tick() {
        let h = harness_with_clock(Arc::new(BrokenClock));
        track(&h.registry, "ISS");

        assert!(h.scheduler.tick().is_err());
        assert!(h.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_cancels_in_flight_fetches() {
        let h = harness();
        let id = track(&h.registry, "ISS");
        h.fetcher.set(id, Behavior::WaitFor(Arc::new(Notify::new())));

        let report = h.scheduler.tick().unwrap();
        h.scheduler.stop();

        let outcomes = report.settle().await;
        assert_eq!(outcomes[0].1, FetchOutcome::Skipped(SkipReason::Cancelled));
        assert!(!h.registry.is_fetch_in_flight(id));
        assert!(h.registry.get(id).unwrap().coverage.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_stopped() {
        let h = harness();
        let id = track(&h.registry, "ISS");

        let scheduler = h.scheduler.clone();
        let runner = tokio::spawn(async move { scheduler.run().await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.fetcher.calls().len(), 1);
        assert!(h.registry.get(id).unwrap().coverage.is_some());

        // covered for the next ticks at a frozen map clock
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(h.fetcher.calls().len(), 1);

        h.scheduler.stop();
        runner.await.unwrap();
    }
}
