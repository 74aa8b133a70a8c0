// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Hearth.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Poll/cache coordinator
//!
//! Owns the last known snapshot, the rolling history and the prediction
//! cache for one stove. All three live in a single immutable [`CacheState`]
//! that is swapped as a whole on every update, so readers never see a
//! half-applied refresh.
//!
//! Refreshes are coalesced: while one fetch is in flight, every other caller
//! (timer tick, manual trigger) waits for it and receives the same outcome
//! instead of issuing another request. A post-command refresh only shares a
//! fetch that started after the command returned.

use chrono::{DateTime, Utc};
use hearth_types::{HistorySample, PredictionBundle, StoveSnapshot};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::alerts::{MaintenanceMonitor, alarm_notifications};
use crate::config::CoordinatorConfig;
use crate::errors::{StoveError, StoveResult};
use crate::history::HistoryRing;
use crate::metrics::{PredictionSettings, compute_predictions};
use crate::traits::{Clock, Notifier, StoveTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatorState {
    Idle,
    Refreshing,
    Degraded,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Refreshing => "refreshing",
            Self::Degraded => "degraded",
        })
    }
}

/// Health of the polling loop, including the "stale since / last error" indicator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorStatus {
    pub state: CoordinatorState,
    pub last_success: Option<DateTime<Utc>>,
    /// Most recent failure; kept after recovery for diagnostics
    #[serde(serialize_with = "serialize_error")]
    pub last_error: Option<StoveError>,
    /// Start of the current failure streak, `None` while healthy
    pub stale_since: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub total_fetches: u64,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<StoveError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl Default for CoordinatorStatus {
    fn default() -> Self {
        Self {
            state: CoordinatorState::Idle,
            last_success: None,
            last_error: None,
            stale_since: None,
            consecutive_failures: 0,
            total_fetches: 0,
        }
    }
}

impl CoordinatorStatus {
    pub fn is_stale(&self) -> bool {
        self.stale_since.is_some()
    }
}

#[derive(Debug, Clone, Default)]
struct CacheState {
    snapshot: Option<Arc<StoveSnapshot>>,
    history: Arc<HistoryRing>,
    predictions: PredictionBundle,
    status: CoordinatorStatus,
}

pub struct StoveCoordinator {
    config: CoordinatorConfig,
    settings: PredictionSettings,
    transport: Arc<dyn StoveTransport>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    state: RwLock<Arc<CacheState>>,
    refresh_gate: tokio::sync::Mutex<()>,
    /// Fetches started so far; each fetch is numbered by this counter
    started: AtomicU64,
    /// Number of the most recent fetch that ran to completion
    completed: AtomicU64,
    last_outcome: Mutex<Option<(u64, StoveResult<Arc<StoveSnapshot>>)>>,
    maintenance: Mutex<MaintenanceMonitor>,
    poll: Mutex<Option<PollHandle>>,
    shut_down: AtomicBool,
}

impl fmt::Debug for StoveCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("StoveCoordinator")
            .field("name", &self.config.name)
            .field("state", &state.status.state)
            .field("history_len", &state.history.len())
            .finish_non_exhaustive()
    }
}

impl StoveCoordinator {
    pub fn new(
        transport: Arc<dyn StoveTransport>,
        config: CoordinatorConfig,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> StoveResult<Self> {
        config.validate()?;

        let initial = CacheState {
            history: Arc::new(HistoryRing::new(config.history_capacity)),
            ..CacheState::default()
        };
        let maintenance = MaintenanceMonitor::new(
            &config.name,
            config.maintenance_threshold_hours,
            config.maintenance_check_interval(),
        );

        Ok(Self {
            settings: PredictionSettings::from(&config),
            config,
            transport,
            notifier,
            clock,
            state: RwLock::new(Arc::new(initial)),
            refresh_gate: tokio::sync::Mutex::new(()),
            started: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            last_outcome: Mutex::new(None),
            maintenance: Mutex::new(maintenance),
            poll: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub(crate) fn transport(&self) -> &Arc<dyn StoveTransport> {
        &self.transport
    }

    pub fn current_snapshot(&self) -> Option<Arc<StoveSnapshot>> {
        self.state.read().snapshot.clone()
    }

    /// Detached copy of the history, oldest first
    pub fn history(&self) -> Vec<HistorySample> {
        self.history_ring().to_vec()
    }

    /// The current history ring; later refreshes replace it rather than mutate it
    pub fn history_ring(&self) -> Arc<HistoryRing> {
        Arc::clone(&self.state.read().history)
    }

    pub fn predictions(&self) -> PredictionBundle {
        self.state.read().predictions
    }

    pub fn status(&self) -> CoordinatorStatus {
        self.state.read().status.clone()
    }

    /// Fetch a fresh snapshot, joining any refresh already in flight
    ///
    /// On failure the last known snapshot is returned when one exists;
    /// otherwise the error is surfaced.
    pub async fn refresh_now(&self) -> StoveResult<Arc<StoveSnapshot>> {
        let completed = self.completed.load(Ordering::Acquire);
        let started = self.started.load(Ordering::Acquire);
        // Join the fetch in flight, if any, otherwise the next one
        let oldest = if started > completed { started } else { started + 1 };
        self.refresh_from(oldest).await
    }

    /// Like [`Self::refresh_now`], but only shares a fetch that started
    /// after this call; used after a command so the reading postdates it
    pub async fn refresh_after_command(&self) -> StoveResult<Arc<StoveSnapshot>> {
        let oldest = self.started.load(Ordering::Acquire) + 1;
        self.refresh_from(oldest).await
    }

    async fn refresh_from(&self, oldest: u64) -> StoveResult<Arc<StoveSnapshot>> {
        let _gate = self.refresh_gate.lock().await;

        let shared = self
            .last_outcome
            .lock()
            .as_ref()
            .filter(|(number, _)| *number >= oldest)
            .map(|(_, outcome)| outcome.clone());
        if let Some(outcome) = shared {
            debug!(device = %self.config.name, "Joined in-flight refresh");
            return outcome;
        }

        let number = self.started.fetch_add(1, Ordering::AcqRel) + 1;
        let outcome = self.run_refresh().await;
        *self.last_outcome.lock() = Some((number, outcome.clone()));
        self.completed.store(number, Ordering::Release);
        outcome
    }

    async fn run_refresh(&self) -> StoveResult<Arc<StoveSnapshot>> {
        self.update_state(|state| state.status.state = CoordinatorState::Refreshing);
        debug!(device = %self.config.name, "Refreshing stove data");

        match self.transport.fetch_snapshot().await {
            Ok(snapshot) => Ok(self.apply_success(snapshot, self.clock.now())),
            Err(e) => self.apply_failure(e, self.clock.now()),
        }
    }

    fn apply_success(&self, snapshot: StoveSnapshot, now: DateTime<Utc>) -> Arc<StoveSnapshot> {
        let snapshot = Arc::new(snapshot);
        let prediction_interval = self.config.prediction_interval();

        let (previous, recovered_after) = self.update_state(|state| {
            let mut ring = (*state.history).clone();
            ring.push(HistorySample::from_snapshot(&snapshot, now));

            let predictions_due = state
                .predictions
                .computed_at
                .is_none_or(|at| now.signed_duration_since(at) >= prediction_interval);
            if predictions_due {
                state.predictions = compute_predictions(&ring, &self.settings, now);
            }

            let failures = state.status.consecutive_failures;
            let recovered_after = (failures > 0).then_some(failures);

            state.history = Arc::new(ring);
            let previous = state.snapshot.replace(Arc::clone(&snapshot));
            state.status.state = CoordinatorState::Idle;
            state.status.last_success = Some(now);
            state.status.stale_since = None;
            state.status.consecutive_failures = 0;
            state.status.total_fetches += 1;
            (previous, recovered_after)
        });

        if let Some(failures) = recovered_after {
            info!(
                device = %self.config.name,
                failures,
                "Stove connection recovered"
            );
        }
        debug!(
            device = %self.config.name,
            phase = %snapshot.operational_state.phase,
            stove_c = snapshot.temperatures.stove_temperature_c,
            "Stove data updated"
        );

        self.run_side_effects(previous.as_deref(), &snapshot, now);
        snapshot
    }

    fn apply_failure(
        &self,
        error: StoveError,
        now: DateTime<Utc>,
    ) -> StoveResult<Arc<StoveSnapshot>> {
        let (stale, failures) = self.update_state(|state| {
            state.status.state = CoordinatorState::Degraded;
            state.status.last_error = Some(error.clone());
            state.status.consecutive_failures = state.status.consecutive_failures.saturating_add(1);
            state.status.total_fetches += 1;
            if state.status.stale_since.is_none() {
                state.status.stale_since = Some(now);
            }
            (state.snapshot.clone(), state.status.consecutive_failures)
        });

        match stale {
            Some(snapshot) => {
                warn!(
                    device = %self.config.name,
                    error = %error,
                    failures,
                    "Refresh failed, serving last known snapshot"
                );
                Ok(snapshot)
            }
            None => {
                error!(
                    device = %self.config.name,
                    error = %error,
                    "Refresh failed and no previous snapshot is available"
                );
                Err(error)
            }
        }
    }

    fn run_side_effects(
        &self,
        previous: Option<&StoveSnapshot>,
        current: &StoveSnapshot,
        now: DateTime<Utc>,
    ) {
        for notification in alarm_notifications(previous, current, &self.config.name) {
            self.notifier.notify(notification);
        }

        let maintenance = self.maintenance.lock().check(current, now);
        if let Some(notification) = maintenance {
            self.notifier.notify(notification);
        }
    }

    fn update_state<R>(&self, apply: impl FnOnce(&mut CacheState) -> R) -> R {
        let mut guard = self.state.write();
        let mut next = (**guard).clone();
        let result = apply(&mut next);
        *guard = Arc::new(next);
        result
    }

    /// Spawn the periodic refresh task
    ///
    /// Ticks go through [`Self::refresh_now`]. Calling this while a poll task
    /// is already running returns a handle to the existing task.
    pub fn start_polling(self: &Arc<Self>) -> PollHandle {
        let mut slot = self.poll.lock();
        if let Some(handle) = slot.as_ref()
            && !handle.is_finished()
        {
            return handle.clone();
        }

        let period = self.config.poll_interval();
        let stop = Arc::new(Notify::new());
        let weak: Weak<Self> = Arc::downgrade(self);
        let stop_signal = Arc::clone(&stop);
        let name = self.config.name.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(device = %name, period_secs = period.as_secs(), "Polling started");

            loop {
                tokio::select! {
                    () = stop_signal.notified() => break,
                    _ = interval.tick() => {
                        let Some(coordinator) = weak.upgrade() else {
                            break;
                        };
                        if let Err(e) = coordinator.refresh_now().await {
                            warn!(device = %name, error = %e, "Scheduled refresh failed");
                        }
                    }
                }
            }

            info!(device = %name, "Polling stopped");
        });

        let handle = PollHandle {
            stop,
            task: Arc::new(tokio::sync::Mutex::new(Some(task))),
        };
        *slot = Some(handle.clone());
        handle
    }

    /// Stop polling and release the transport; safe to call more than once
    pub async fn shutdown(&self) {
        let poll = self.poll.lock().take();
        if let Some(handle) = poll {
            handle.stop().await;
        }

        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.transport.close().await;
        info!(device = %self.config.name, "Coordinator shut down");
    }
}

/// Handle to the periodic refresh task
#[derive(Clone)]
pub struct PollHandle {
    stop: Arc<Notify>,
    task: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl PollHandle {
    pub fn is_finished(&self) -> bool {
        self.task
            .try_lock()
            .is_ok_and(|task| task.as_ref().is_none_or(JoinHandle::is_finished))
    }

    /// Stop the task and wait for it to exit; idempotent
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        let Some(task) = task else {
            return;
        };

        self.stop.notify_one();
        if let Err(e) = task.await
            && e.is_panic()
        {
            error!(error = %e, "Poll task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeTransport, ManualClock, RecordingNotifier, sample_snapshot};
    use chrono::TimeZone;
    use hearth_types::DecodeError;
    use std::time::Duration;

    fn connection_failure() -> StoveError {
        StoveError::ConnectionFailed {
            endpoint: "/get_stove_data".to_owned(),
            reason: "connection refused".to_owned(),
        }
    }

    fn coordinator_with(
        transport: Arc<FakeTransport>,
        config: CoordinatorConfig,
    ) -> (Arc<StoveCoordinator>, Arc<RecordingNotifier>, Arc<ManualClock>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 10, 18, 0, 0).unwrap(),
        ));
        let coordinator = StoveCoordinator::new(
            transport,
            config,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .unwrap();
        (Arc::new(coordinator), notifier, clock)
    }

    #[tokio::test]
    async fn test_first_refresh_populates_cache() {
        let transport = Arc::new(FakeTransport::default());
        let (coordinator, _, _) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        assert!(coordinator.current_snapshot().is_none());
        let snapshot = coordinator.refresh_now().await.unwrap();

        assert_eq!(snapshot.temperatures.stove_temperature_c, 245.0);
        assert_eq!(coordinator.current_snapshot().unwrap(), snapshot);
        assert_eq!(coordinator.history().len(), 1);
        assert_eq!(coordinator.status().state, CoordinatorState::Idle);
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_are_coalesced() {
        let transport =
            Arc::new(FakeTransport::default().with_fetch_delay(Duration::from_millis(200)));
        let (coordinator, _, _) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.refresh_now().await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(transport.fetch_count(), 1);
        assert!(outcomes.iter().all(|s| Arc::ptr_eq(s, &outcomes[0])));
        assert_eq!(coordinator.history().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_coalesced_waiters_share_the_error() {
        let transport =
            Arc::new(FakeTransport::default().with_fetch_delay(Duration::from_millis(200)));
        transport.push_outcome(Err(connection_failure()));
        let (coordinator, _, _) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.refresh_now().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap_err(), connection_failure());
        }
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_sequential_refreshes_fetch_again() {
        let transport = Arc::new(FakeTransport::default());
        let (coordinator, _, _) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        coordinator.refresh_now().await.unwrap();
        coordinator.refresh_now().await.unwrap();
        assert_eq!(transport.fetch_count(), 2);
        assert_eq!(coordinator.history().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_refresh_after_command_skips_older_fetch() {
        let transport =
            Arc::new(FakeTransport::default().with_fetch_delay(Duration::from_millis(300)));
        let (coordinator, _, _) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        let in_flight = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.refresh_now().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let joined = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.refresh_now().await })
        };
        let fresh = coordinator.refresh_after_command().await.unwrap();

        let older = in_flight.await.unwrap().unwrap();
        assert!(!Arc::ptr_eq(&older, &fresh));
        // A plain refresh arriving mid-fetch still shares one of the two
        let joined = joined.await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&joined, &older) || Arc::ptr_eq(&joined, &fresh));
        assert_eq!(transport.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_serves_last_known_snapshot() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_outcome(Ok(sample_snapshot(245.0)));
        let decode_error = StoveError::Decode(DecodeError::OutOfRange {
            field: "stove_temperature".to_owned(),
            value: 900.0,
            min: 0.0,
            max: 800.0,
        });
        transport.push_outcome(Err(decode_error.clone()));
        let (coordinator, _, _) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        let good = coordinator.refresh_now().await.unwrap();
        let served = coordinator.refresh_now().await.unwrap();

        assert!(Arc::ptr_eq(&served, &good));
        assert!(Arc::ptr_eq(&coordinator.current_snapshot().unwrap(), &good));
        let status = coordinator.status();
        assert_eq!(status.state, CoordinatorState::Degraded);
        assert_eq!(status.last_error, Some(decode_error));
        assert!(status.stale_since.is_some());
        assert_eq!(coordinator.history().len(), 1);
    }

    #[tokio::test]
    async fn test_first_refresh_failure_is_surfaced() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_outcome(Err(connection_failure()));
        let (coordinator, _, _) = coordinator_with(transport, CoordinatorConfig::default());

        let err = coordinator.refresh_now().await.unwrap_err();
        assert_eq!(err, connection_failure());
        assert!(coordinator.current_snapshot().is_none());
        assert_eq!(coordinator.status().state, CoordinatorState::Degraded);
    }

    #[tokio::test]
    async fn test_degraded_keeps_last_known_snapshot() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_outcome(Ok(sample_snapshot(245.0)));
        for _ in 0..3 {
            transport.push_outcome(Err(connection_failure()));
        }
        let (coordinator, _, clock) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        let good = coordinator.refresh_now().await.unwrap();
        let failed_at = clock.advance(chrono::Duration::seconds(30));
        for _ in 0..3 {
            let served = coordinator.refresh_now().await.unwrap();
            assert!(Arc::ptr_eq(&served, &good));
            clock.advance(chrono::Duration::seconds(30));
        }

        let status = coordinator.status();
        assert_eq!(status.state, CoordinatorState::Degraded);
        assert_eq!(status.consecutive_failures, 3);
        assert_eq!(status.last_error, Some(connection_failure()));
        assert_eq!(status.stale_since, Some(failed_at));
        assert!(status.is_stale());
        assert_eq!(*coordinator.current_snapshot().unwrap(), *good);
        assert_eq!(coordinator.history().len(), 1);
    }

    #[tokio::test]
    async fn test_recovery_clears_staleness() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_outcome(Ok(sample_snapshot(245.0)));
        transport.push_outcome(Err(connection_failure()));
        transport.push_outcome(Ok(sample_snapshot(250.0)));
        let (coordinator, _, _) = coordinator_with(transport, CoordinatorConfig::default());

        coordinator.refresh_now().await.unwrap();
        coordinator.refresh_now().await.unwrap();
        let fresh = coordinator.refresh_now().await.unwrap();

        assert_eq!(fresh.temperatures.stove_temperature_c, 250.0);
        let status = coordinator.status();
        assert_eq!(status.state, CoordinatorState::Idle);
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.stale_since.is_none());
        assert_eq!(status.total_fetches, 3);
    }

    #[tokio::test]
    async fn test_history_copy_is_detached() {
        let transport = Arc::new(FakeTransport::default());
        let (coordinator, _, _) = coordinator_with(transport, CoordinatorConfig::default());

        coordinator.refresh_now().await.unwrap();
        let copy = coordinator.history();
        let ring = coordinator.history_ring();
        coordinator.refresh_now().await.unwrap();

        assert_eq!(copy.len(), 1);
        assert_eq!(ring.len(), 1);
        assert_eq!(coordinator.history().len(), 2);
    }

    #[tokio::test]
    async fn test_history_capacity_is_respected() {
        let transport = Arc::new(FakeTransport::default());
        let config = CoordinatorConfig {
            history_capacity: 3,
            ..Default::default()
        };
        let (coordinator, _, _) = coordinator_with(transport, config);

        for _ in 0..5 {
            coordinator.refresh_now().await.unwrap();
        }
        assert_eq!(coordinator.history().len(), 3);
    }

    #[tokio::test]
    async fn test_predictions_follow_their_own_cadence() {
        let transport = Arc::new(FakeTransport::default());
        for temp in [380.0, 360.0, 340.0, 320.0, 300.0, 280.0] {
            transport.push_outcome(Ok(sample_snapshot(temp)));
        }
        let (coordinator, _, clock) = coordinator_with(transport, CoordinatorConfig::default());

        let start = clock.now();
        coordinator.refresh_now().await.unwrap();
        assert_eq!(coordinator.predictions().computed_at, Some(start));
        assert!(coordinator.predictions().refill_estimate.is_none());

        // Four more polls inside the five-minute window reuse the cached bundle
        for _ in 0..4 {
            clock.advance(chrono::Duration::seconds(60));
            coordinator.refresh_now().await.unwrap();
        }
        assert_eq!(coordinator.predictions().computed_at, Some(start));

        let recompute_at = clock.advance(chrono::Duration::seconds(60));
        coordinator.refresh_now().await.unwrap();
        let predictions = coordinator.predictions();
        assert_eq!(predictions.computed_at, Some(recompute_at));
        assert!(predictions.refill_estimate.is_some());
        assert_eq!(
            predictions.temperature_trend,
            hearth_types::TemperatureTrend::Falling
        );
    }

    #[tokio::test]
    async fn test_refill_alarm_notifies_once() {
        let transport = Arc::new(FakeTransport::default());
        let mut alarmed = sample_snapshot(120.0);
        alarmed.alarm_state.refill_alarm = true;
        transport.push_outcome(Ok(sample_snapshot(245.0)));
        transport.push_outcome(Ok(alarmed.clone()));
        transport.push_outcome(Ok(alarmed));
        let (coordinator, notifier, _) = coordinator_with(transport, CoordinatorConfig::default());

        for _ in 0..3 {
            coordinator.refresh_now().await.unwrap();
        }

        let keys = notifier.keys();
        assert_eq!(
            keys.iter().filter(|k| k.starts_with("hearth_refill_")).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_maintenance_notification() {
        let transport = Arc::new(FakeTransport::default());
        let mut overdue = sample_snapshot(245.0);
        overdue.system_info.service_date = chrono::NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        transport.push_outcome(Ok(overdue.clone()));
        transport.push_outcome(Ok(overdue));
        let (coordinator, notifier, _) = coordinator_with(transport, CoordinatorConfig::default());

        coordinator.refresh_now().await.unwrap();
        coordinator.refresh_now().await.unwrap();

        // Checked at most once per day
        assert_eq!(notifier.keys(), vec!["hearth_maintenance_hwam_stove".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_ticks_and_stops() {
        let transport = Arc::new(FakeTransport::default());
        let (coordinator, _, _) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        let handle = coordinator.start_polling();
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(transport.fetch_count(), 3);

        handle.stop().await;
        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(transport.fetch_count(), 3);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let transport = Arc::new(FakeTransport::default());
        let (coordinator, _, _) =
            coordinator_with(Arc::clone(&transport), CoordinatorConfig::default());

        let _handle = coordinator.start_polling();
        coordinator.shutdown().await;
        coordinator.shutdown().await;
        assert_eq!(transport.close_count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CoordinatorConfig {
            poll_interval_secs: 1,
            ..Default::default()
        };
        let result = StoveCoordinator::new(
            Arc::new(FakeTransport::default()),
            config,
            Arc::new(RecordingNotifier::default()),
            Arc::new(ManualClock::new(Utc::now())),
        );
        assert!(matches!(result, Err(StoveError::Config(_))));
    }
}
