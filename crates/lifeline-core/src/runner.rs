//! Movement loop runner with operator controls.
//!
//! This module provides [`run_mover`], the top-level async function that
//! drives the tick loop with support for:
//!
//! - **Pause/resume**: operator can halt and continue the loop
//! - **Variable tick speed**: interval adjustable at runtime
//! - **Clean cancellation**: finish the current tick, then stop
//! - **Bounded runs**: stop after `max_ticks` (tests, demos)
//!
//! The runner wraps the single-tick [`run_tick`] function and adds the
//! control plane around it. A tick's internal failures are already
//! absorbed inside [`run_tick`]; nothing but cancellation or the tick
//! bound ends the loop.
//!
//! [`run_tick`]: crate::mover::run_tick

use std::sync::Arc;

use lifeline_store::MemoryStore;
use tracing::info;

use crate::config::LifelineConfig;
use crate::mover::{self, TickSummary};
use crate::notify::ChangeNotifier;
use crate::operator::{MoverEndReason, OperatorState};

/// Result of a completed mover run.
#[derive(Debug)]
pub struct MoverResult {
    /// The reason the loop ended.
    pub end_reason: MoverEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Run the movement loop until it is cancelled (or hits a tick bound).
///
/// This is the recurring task that advances every en-route ambulance
/// once per tick interval. It checks operator state between ticks only,
/// so a stop never aborts a tick mid-flight.
pub async fn run_mover(
    store: &MemoryStore,
    notifier: &ChangeNotifier,
    config: &LifelineConfig,
    operator: &Arc<OperatorState>,
) -> MoverResult {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        tick_interval_ms = operator.tick_interval_ms(),
        max_ticks = operator.max_ticks(),
        step_deg = config.mover.step_deg,
        "movement loop starting"
    );

    loop {
        // --- Check pause ---
        if operator.is_paused() {
            info!("movement loop paused, waiting for resume");
            operator.wait_if_paused().await;
            info!("movement loop resumed");
        }

        // --- Check stop request (between ticks) ---
        if operator.is_stop_requested() {
            info!(total_ticks, "operator stop requested");
            let reason = MoverEndReason::OperatorStop;
            operator.set_end_reason(reason.clone()).await;
            return MoverResult {
                end_reason: reason,
                final_summary: last_summary,
                total_ticks,
            };
        }

        // --- Execute tick ---
        let summary = mover::run_tick(store, notifier, config).await;

        total_ticks = total_ticks.saturating_add(1);
        operator.record_tick();

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(total_ticks) {
            info!(
                total_ticks,
                max_ticks = operator.max_ticks(),
                "tick limit reached"
            );
            let reason = MoverEndReason::MaxTicksReached;
            operator.set_end_reason(reason.clone()).await;
            return MoverResult {
                end_reason: reason,
                final_summary: Some(summary),
                total_ticks,
            };
        }

        last_summary = Some(summary);

        // --- Sleep for tick interval ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use lifeline_types::{
        Ambulance, AmbulancePhase, AmbulanceStatus, Event, EventId, EventPhase, EventStatus,
        GeoPoint, Severity,
    };

    use super::*;
    use crate::dispatch;

    const EVENT_LOCATION: GeoPoint = GeoPoint::new(40.7500, -73.9850);
    const AMBULANCE_START: GeoPoint = GeoPoint::new(40.7400, -73.9700);

    fn open_event(location: GeoPoint) -> Event {
        Event {
            id: EventId::new(),
            severity: Severity::Emergency,
            title: String::from("Collision"),
            description: String::from("Two vehicles"),
            reference_clip_url: String::from("http://localhost:5055/latest_frame"),
            location,
            camera_id: None,
            status: EventStatus::Open,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let config = LifelineConfig::default();
        // Interval 0: run ticks back-to-back for the test.
        let operator = Arc::new(OperatorState::new(0, 5));

        let result = run_mover(&store, &notifier, &config, &operator).await;
        assert_eq!(result.end_reason, MoverEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(operator.ticks_completed(), 5);
        assert_eq!(operator.end_reason().await, Some(MoverEndReason::MaxTicksReached));
    }

    #[tokio::test]
    async fn pre_requested_stop_runs_zero_ticks() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let config = LifelineConfig::default();
        let operator = Arc::new(OperatorState::new(0, 0));
        operator.request_stop();

        let result = run_mover(&store, &notifier, &config, &operator).await;
        assert_eq!(result.end_reason, MoverEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn stop_requested_mid_run_ends_the_loop() {
        let store = Arc::new(MemoryStore::new());
        let notifier = ChangeNotifier::new();
        let config = LifelineConfig::default();
        // Small interval so the loop yields between ticks.
        let operator = Arc::new(OperatorState::new(100, 0));

        let loop_store = Arc::clone(&store);
        let loop_notifier = notifier.clone();
        let loop_operator = Arc::clone(&operator);
        let handle = tokio::spawn(async move {
            run_mover(&loop_store, &loop_notifier, &config, &loop_operator).await
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
        operator.request_stop();

        let result = handle.await.unwrap();
        assert_eq!(result.end_reason, MoverEndReason::OperatorStop);
        assert!(result.total_ticks >= 1);
    }

    #[tokio::test]
    async fn full_scenario_dispatch_to_resolution() {
        // The reference scenario end-to-end: assign, run the loop
        // bounded by the convergence limit, observe arrival.
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let config = LifelineConfig::default();

        let ambulance = Ambulance::idle_at(AMBULANCE_START);
        store.save_ambulance(&ambulance).await.unwrap();
        let event = open_event(EVENT_LOCATION);
        store.save_event(&event).await.unwrap();

        let assignment = dispatch::assign_nearest(&store, &notifier, &config.dispatch, &event)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(assignment.ambulance_id, ambulance.id);

        let d_lat: f64 = EVENT_LOCATION.lat - AMBULANCE_START.lat;
        let d_lng: f64 = EVENT_LOCATION.lng - AMBULANCE_START.lng;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bound = (d_lat.hypot(d_lng) / config.mover.step_deg).ceil() as u64;

        let operator = Arc::new(OperatorState::new(0, bound.saturating_add(1)));
        let result = run_mover(&store, &notifier, &config, &operator).await;
        assert_eq!(result.end_reason, MoverEndReason::MaxTicksReached);

        let released = store.get_ambulance(ambulance.id).await.unwrap().unwrap();
        assert_eq!(released.status, AmbulanceStatus::Idle);
        assert_eq!(released.position, EVENT_LOCATION);

        let resolved = store.get_event(event.id).await.unwrap().unwrap();
        assert_eq!(resolved.status.phase(), EventPhase::Resolved);
    }

    #[tokio::test]
    async fn paused_loop_ticks_nothing_until_resumed() {
        let store = Arc::new(MemoryStore::new());
        let notifier = ChangeNotifier::new();
        let config = LifelineConfig::default();
        let operator = Arc::new(OperatorState::new(0, 3));
        operator.pause();

        let loop_store = Arc::clone(&store);
        let loop_notifier = notifier.clone();
        let loop_operator = Arc::clone(&operator);
        let handle = tokio::spawn(async move {
            run_mover(&loop_store, &loop_notifier, &config, &loop_operator).await
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        assert_eq!(operator.ticks_completed(), 0);

        operator.resume();
        let result = handle.await.unwrap();
        assert_eq!(result.total_ticks, 3);

        // An idle fleet means every summary is empty.
        assert_eq!(result.final_summary, Some(crate::mover::TickSummary::default()));
        let untouched = store.ambulances_in_phase(AmbulancePhase::Idle).await;
        assert!(untouched.is_empty());
    }
}
