//! Movement simulation tick: advance every en-route ambulance one step.
//!
//! One call to [`run_tick`] is one tick. Each en-route ambulance is
//! processed independently -- a store failure or oddity on one is
//! logged and skipped, never aborting the rest of the tick -- and the
//! tick as a whole is infallible.
//!
//! This loop is the sole writer of en-route position and ETA fields.
//! Transitions *out of* en-route (arrival, orphan recovery) go through
//! the store's conditional claim so a concurrent manual resolution can
//! never be clobbered; transitions *into* en-route are never performed
//! here.

use chrono::Utc;
use lifeline_store::{MemoryStore, StoreError};
use lifeline_types::{Ambulance, AmbulancePhase, AmbulanceStatus, EventPhase};
use tracing::{debug, info, warn};

use crate::config::LifelineConfig;
use crate::geo::{self, StepOutcome};
use crate::notify::ChangeNotifier;

/// What happened to one ambulance during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickAction {
    /// Advanced one step toward its event.
    Moved,
    /// Reached its event; event resolved, ambulance released.
    Arrived,
    /// Orphaned (event missing or already resolved); returned to idle.
    Recovered,
    /// Lost a race with another writer mid-tick; left alone.
    Skipped,
}

/// Aggregate counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// En-route ambulances observed at the start of the tick.
    pub enroute: usize,
    /// Ambulances that advanced one step.
    pub moved: usize,
    /// Ambulances that arrived and resolved their event.
    pub arrived: usize,
    /// Orphaned ambulances returned to idle.
    pub recovered: usize,
    /// Ambulances skipped because their unit of work failed.
    pub failed: usize,
}

/// Execute one tick of the movement simulation.
///
/// Reads all en-route ambulances, advances each toward its assigned
/// event, resolves events on arrival, and self-heals orphaned
/// assignments. Idle and unavailable ambulances are never touched.
pub async fn run_tick(
    store: &MemoryStore,
    notifier: &ChangeNotifier,
    config: &LifelineConfig,
) -> TickSummary {
    let enroute = store.ambulances_in_phase(AmbulancePhase::EnRoute).await;
    let mut summary = TickSummary {
        enroute: enroute.len(),
        ..TickSummary::default()
    };

    for ambulance in enroute {
        let ambulance_id = ambulance.id;
        match advance_one(store, notifier, config, ambulance).await {
            Ok(TickAction::Moved) => summary.moved = summary.moved.saturating_add(1),
            Ok(TickAction::Arrived) => summary.arrived = summary.arrived.saturating_add(1),
            Ok(TickAction::Recovered) => {
                summary.recovered = summary.recovered.saturating_add(1);
            }
            Ok(TickAction::Skipped) => {}
            Err(e) => {
                // One bad record must not stall the fleet.
                warn!(ambulance_id = %ambulance_id, error = %e, "tick step failed, skipping ambulance");
                summary.failed = summary.failed.saturating_add(1);
            }
        }
    }

    debug!(
        enroute = summary.enroute,
        moved = summary.moved,
        arrived = summary.arrived,
        recovered = summary.recovered,
        failed = summary.failed,
        "tick complete"
    );
    summary
}

/// Advance a single en-route ambulance.
async fn advance_one(
    store: &MemoryStore,
    notifier: &ChangeNotifier,
    config: &LifelineConfig,
    ambulance: Ambulance,
) -> Result<TickAction, StoreError> {
    let AmbulanceStatus::EnRoute { event_id, .. } = ambulance.status else {
        // The phase filter only returns en-route records; a mismatch
        // means another writer moved it since the scan.
        return Ok(TickAction::Skipped);
    };

    let event = store.get_event(event_id).await?;
    let Some(event) = event.filter(|e| e.status.phase() != EventPhase::Resolved) else {
        // Orphan: the event vanished or was resolved externally.
        // Return the ambulance to idle; no movement this tick.
        let claimed = store
            .claim_ambulance(ambulance.id, AmbulancePhase::EnRoute, |a| a.release())
            .await?;
        if let Some(recovered) = claimed {
            notifier.ambulance_changed(&recovered);
            info!(
                ambulance_id = %ambulance.id,
                event_id = %event_id,
                "orphaned ambulance recovered to idle"
            );
        }
        return Ok(TickAction::Recovered);
    };

    match geo::step_toward(ambulance.position, event.location, config.mover.step_deg) {
        StepOutcome::Arrived => {
            // Snap to the event's exact coordinates and release.
            let claimed = store
                .claim_ambulance(ambulance.id, AmbulancePhase::EnRoute, |a| {
                    a.release_at(event.location);
                })
                .await?;
            let Some(released) = claimed else {
                return Ok(TickAction::Skipped);
            };
            notifier.ambulance_changed(&released);

            let now = Utc::now();
            let resolved = store
                .claim_event(event_id, event.status.phase(), |e| e.mark_resolved(now))
                .await?;
            if let Some(resolved) = resolved {
                notifier.event_changed(&resolved);
            }

            info!(
                ambulance_id = %ambulance.id,
                event_id = %event_id,
                "ambulance arrived, event resolved"
            );
            Ok(TickAction::Arrived)
        }
        StepOutcome::Advanced(position) => {
            let remaining_km = geo::distance_km(position, event.location);
            let eta = geo::eta_seconds(remaining_km, config.dispatch.assumed_speed_kmh);

            let claimed = store
                .claim_ambulance(ambulance.id, AmbulancePhase::EnRoute, |a| {
                    a.advance_to(position, eta);
                })
                .await?;
            let Some(moved) = claimed else {
                // Released by a manual resolve between the scan and now.
                return Ok(TickAction::Skipped);
            };
            notifier.ambulance_changed(&moved);
            Ok(TickAction::Moved)
        }
    }
}
