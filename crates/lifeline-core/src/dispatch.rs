//! Dispatch assignment engine: nearest-available-responder selection
//! with race-free claiming, and the manual resolution path.
//!
//! Assignment walks the idle candidates nearest-first and claims each
//! one conditionally; a lost claim (another dispatcher won the
//! ambulance) falls through to the next-nearest remaining candidate,
//! bounded by the size of the initial snapshot. "No responder available"
//! is a normal outcome, not an error.
//!
//! The ambulance claim and the event save are two independent writes;
//! a crash between them leaves an en-route ambulance whose event never
//! left `Open` -- the movement loop's orphan recovery absorbs exactly
//! that window.

use chrono::Utc;
use lifeline_store::{MemoryStore, StoreError};
use lifeline_types::{AmbulanceId, AmbulancePhase, Event, EventId, EventPhase};
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::geo;
use crate::notify::ChangeNotifier;

/// Errors that can occur during assignment or resolution.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The entity store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// A committed claim: which responder, and the initial estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The responder committed to the event.
    pub ambulance_id: AmbulanceId,
    /// Initial ETA estimate in seconds.
    pub eta_seconds: u32,
    /// Great-circle distance at claim time, in kilometers.
    pub distance_km: f64,
}

/// Outcome of a resolution request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    /// The event transitioned to resolved now.
    Resolved(Event),
    /// The event was already resolved; nothing was changed.
    AlreadyResolved(Event),
    /// No event with that ID exists.
    NotFound,
}

/// Select and atomically claim the nearest idle ambulance for `event`.
///
/// Returns `Ok(None)` when no idle ambulance exists, when every
/// candidate was lost to a concurrent writer, or when the event is no
/// longer open. On success the ambulance is en route, the event carries
/// the assignment, and both changes have been published.
///
/// Tie-break: candidates are scanned in the store's registration order,
/// so among equidistant ambulances the earliest-registered one wins --
/// deterministic given the store's stable read order.
///
/// # Errors
///
/// Returns [`DispatchError::Store`] if a store read or write fails.
pub async fn assign_nearest(
    store: &MemoryStore,
    notifier: &ChangeNotifier,
    config: &DispatchConfig,
    event: &Event,
) -> Result<Option<Assignment>, DispatchError> {
    if event.status.phase() != EventPhase::Open {
        warn!(event_id = %event.id, phase = ?event.status.phase(), "refusing to assign a non-open event");
        return Ok(None);
    }

    let candidates = store.ambulances_in_phase(AmbulancePhase::Idle).await;
    if candidates.is_empty() {
        debug!(event_id = %event.id, "no idle ambulance available");
        return Ok(None);
    }

    // Rank by great-circle distance. The sort is stable, so equidistant
    // candidates keep their registration order.
    let mut ranked: Vec<(f64, _)> = candidates
        .into_iter()
        .map(|ambulance| (geo::distance_km(event.location, ambulance.position), ambulance))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Walk nearest-first; a lost claim falls through to the next
    // candidate. Bounded by the initial snapshot -- no re-query.
    for (distance_km, candidate) in ranked {
        let eta = geo::eta_seconds(distance_km, config.assumed_speed_kmh);
        let claimed = store
            .claim_ambulance(candidate.id, AmbulancePhase::Idle, |a| {
                a.begin_response(event.id, eta);
            })
            .await?;

        let Some(ambulance) = claimed else {
            debug!(
                ambulance_id = %candidate.id,
                "candidate claimed by another writer, trying next-nearest"
            );
            continue;
        };

        let mut updated = event.clone();
        updated.mark_enroute(ambulance.id);
        store.save_event(&updated).await?;

        notifier.ambulance_changed(&ambulance);
        notifier.event_changed(&updated);

        info!(
            event_id = %event.id,
            ambulance_id = %ambulance.id,
            distance_km,
            eta_seconds = eta,
            "ambulance dispatched"
        );

        return Ok(Some(Assignment {
            ambulance_id: ambulance.id,
            eta_seconds: eta,
            distance_km,
        }));
    }

    debug!(event_id = %event.id, "every idle candidate was lost to a concurrent claim");
    Ok(None)
}

/// Resolve an event directly, bypassing arrival detection.
///
/// Follows the same terminal-state and ambulance-release logic as
/// arrival-triggered resolution: the event becomes `Resolved` and its
/// committed responder (if any) is released back to idle. Resolving an
/// already-resolved event is a no-op success that preserves the original
/// `resolved_at` and touches no ambulance.
///
/// # Errors
///
/// Returns [`DispatchError::Store`] if a store read or write fails.
pub async fn resolve_event(
    store: &MemoryStore,
    notifier: &ChangeNotifier,
    event_id: EventId,
) -> Result<ResolveOutcome, DispatchError> {
    // Two attempts: the claim below can miss if the event changes phase
    // between the read and the claim (a dispatcher committing it, or the
    // movement loop arriving). The second read settles which.
    for _ in 0..2 {
        let Some(event) = store.get_event(event_id).await? else {
            return Ok(ResolveOutcome::NotFound);
        };

        let phase = event.status.phase();
        if phase == EventPhase::Resolved {
            debug!(event_id = %event_id, "resolve on already-resolved event is a no-op");
            return Ok(ResolveOutcome::AlreadyResolved(event));
        }

        let now = Utc::now();
        let resolved = store
            .claim_event(event_id, phase, |e| e.mark_resolved(now))
            .await?;

        let Some(resolved) = resolved else {
            continue;
        };

        if let Some(ambulance_id) = event.status.assigned_ambulance() {
            release_if_serving(store, notifier, ambulance_id, event_id).await?;
        }

        notifier.event_changed(&resolved);
        info!(event_id = %event_id, "event resolved manually");
        return Ok(ResolveOutcome::Resolved(resolved));
    }

    // Both claims missed: another writer resolved or re-assigned the
    // event while we retried. Report what the store holds now.
    match store.get_event(event_id).await? {
        Some(event) if event.status.phase() == EventPhase::Resolved => {
            Ok(ResolveOutcome::AlreadyResolved(event))
        }
        Some(event) => {
            warn!(event_id = %event_id, phase = ?event.status.phase(), "resolve lost repeated races");
            Ok(ResolveOutcome::AlreadyResolved(event))
        }
        None => Ok(ResolveOutcome::NotFound),
    }
}

/// Release `ambulance_id` back to idle iff it is still en route to
/// `event_id`.
///
/// The event-match check runs inside the claim so a responder that was
/// recovered and re-dispatched to a different event in the meantime is
/// left alone. A claim miss means the movement loop released it first.
pub(crate) async fn release_if_serving(
    store: &MemoryStore,
    notifier: &ChangeNotifier,
    ambulance_id: AmbulanceId,
    event_id: EventId,
) -> Result<(), StoreError> {
    let mut released = false;
    let claimed = store
        .claim_ambulance(ambulance_id, AmbulancePhase::EnRoute, |a| {
            if a.status.assigned_event() == Some(event_id) {
                a.release();
                released = true;
            }
        })
        .await?;

    if released {
        if let Some(ambulance) = claimed {
            notifier.ambulance_changed(&ambulance);
            info!(ambulance_id = %ambulance_id, event_id = %event_id, "ambulance released");
        }
    } else {
        debug!(
            ambulance_id = %ambulance_id,
            event_id = %event_id,
            "ambulance no longer serving this event, leaving it alone"
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use lifeline_types::{Ambulance, AmbulanceStatus, EventStatus, GeoPoint, Severity};

    use super::*;

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

    async fn seed_idle(store: &MemoryStore, lat: f64, lng: f64) -> Ambulance {
        let ambulance = Ambulance::idle_at(GeoPoint::new(lat, lng));
        store.save_ambulance(&ambulance).await.unwrap();
        ambulance
    }

    #[tokio::test]
    async fn assigns_the_nearest_idle_ambulance() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let config = DispatchConfig::default();

        let far = seed_idle(&store, 40.80, -73.90).await;
        let near = seed_idle(&store, 40.7400, -73.9700).await;
        let event = open_event(GeoPoint::new(40.7500, -73.9850));
        store.save_event(&event).await.unwrap();

        let assignment = assign_nearest(&store, &notifier, &config, &event)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(assignment.ambulance_id, near.id);
        assert_eq!(
            assignment.eta_seconds,
            geo::eta_seconds(assignment.distance_km, config.assumed_speed_kmh)
        );

        // The winner is en route to the event; the loser is untouched.
        let winner = store.get_ambulance(near.id).await.unwrap().unwrap();
        assert_eq!(winner.status.assigned_event(), Some(event.id));
        let loser = store.get_ambulance(far.id).await.unwrap().unwrap();
        assert_eq!(loser.status, AmbulanceStatus::Idle);

        // The event carries the assignment.
        let stored = store.get_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored.status.assigned_ambulance(), Some(near.id));
    }

    #[tokio::test]
    async fn no_idle_ambulance_is_a_normal_outcome() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let event = open_event(GeoPoint::new(40.75, -73.985));
        store.save_event(&event).await.unwrap();

        let assignment = assign_nearest(&store, &notifier, &DispatchConfig::default(), &event)
            .await
            .unwrap();
        assert_eq!(assignment, None);

        // The event stays open.
        let stored = store.get_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored.status.phase(), EventPhase::Open);
    }

    #[tokio::test]
    async fn unavailable_ambulances_are_not_candidates() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();

        let mut withdrawn = Ambulance::idle_at(GeoPoint::new(40.75, -73.985));
        withdrawn.status = AmbulanceStatus::Unavailable;
        store.save_ambulance(&withdrawn).await.unwrap();

        let event = open_event(GeoPoint::new(40.75, -73.985));
        let assignment = assign_nearest(&store, &notifier, &DispatchConfig::default(), &event)
            .await
            .unwrap();
        assert_eq!(assignment, None);
    }

    #[tokio::test]
    async fn equidistant_tie_goes_to_the_earliest_registered() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();

        // Two responders parked at the same depot: identical distance.
        let first = seed_idle(&store, 40.7450, -73.9800).await;
        let _second = seed_idle(&store, 40.7450, -73.9800).await;
        let event = open_event(GeoPoint::new(40.7500, -73.9850));

        let assignment = assign_nearest(&store, &notifier, &DispatchConfig::default(), &event)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(assignment.ambulance_id, first.id);
    }

    #[tokio::test]
    async fn lost_race_falls_back_to_next_nearest() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let config = DispatchConfig::default();

        let near = seed_idle(&store, 40.7490, -73.9850).await;
        let next = seed_idle(&store, 40.7400, -73.9700).await;
        let event = open_event(GeoPoint::new(40.7500, -73.9850));

        // Another writer grabs the nearest candidate between our
        // snapshot and our claim.
        store
            .claim_ambulance(near.id, AmbulancePhase::Idle, |a| {
                a.begin_response(EventId::new(), 30);
            })
            .await
            .unwrap()
            .unwrap();

        let assignment = assign_nearest(&store, &notifier, &config, &event)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(assignment.ambulance_id, next.id);
    }

    #[tokio::test]
    async fn concurrent_assigns_admit_at_most_one_claim() {
        let store = Arc::new(MemoryStore::new());
        let notifier = ChangeNotifier::new();
        let config = DispatchConfig::default();

        let only = seed_idle(&store, 40.7450, -73.9800).await;
        let event_a = open_event(GeoPoint::new(40.7500, -73.9850));
        let event_b = open_event(GeoPoint::new(40.7400, -73.9700));
        store.save_event(&event_a).await.unwrap();
        store.save_event(&event_b).await.unwrap();

        let (a, b) = tokio::join!(
            assign_nearest(&store, &notifier, &config, &event_a),
            assign_nearest(&store, &notifier, &config, &event_b),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        // Exactly one caller wins the single ambulance.
        assert!(a.is_some() ^ b.is_some());

        let winner_event = if a.is_some() { event_a.id } else { event_b.id };
        let stored = store.get_ambulance(only.id).await.unwrap().unwrap();
        assert_eq!(stored.status.assigned_event(), Some(winner_event));
    }

    #[tokio::test]
    async fn resolve_frees_the_committed_ambulance() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let config = DispatchConfig::default();

        let ambulance = seed_idle(&store, 40.7400, -73.9700).await;
        let event = open_event(GeoPoint::new(40.7500, -73.9850));
        store.save_event(&event).await.unwrap();
        assign_nearest(&store, &notifier, &config, &event)
            .await
            .unwrap()
            .unwrap();

        let stored_event = store.get_event(event.id).await.unwrap().unwrap();
        let outcome = resolve_event(&store, &notifier, stored_event.id).await.unwrap();
        assert!(matches!(outcome, ResolveOutcome::Resolved(_)));

        let freed = store.get_ambulance(ambulance.id).await.unwrap().unwrap();
        assert_eq!(freed.status, AmbulanceStatus::Idle);
    }

    #[tokio::test]
    async fn resolve_twice_is_idempotent_and_preserves_resolved_at() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();

        let event = open_event(GeoPoint::new(40.75, -73.985));
        store.save_event(&event).await.unwrap();

        let first = resolve_event(&store, &notifier, event.id).await.unwrap();
        let ResolveOutcome::Resolved(resolved) = first else {
            unreachable!("open event must resolve");
        };
        let original_at = resolved.status.resolved_at().unwrap();

        let second = resolve_event(&store, &notifier, event.id).await.unwrap();
        let ResolveOutcome::AlreadyResolved(unchanged) = second else {
            unreachable!("second resolve must be a no-op");
        };
        assert_eq!(unchanged.status.resolved_at(), Some(original_at));
    }

    #[tokio::test]
    async fn resolve_unknown_event_is_not_found() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let outcome = resolve_event(&store, &notifier, EventId::new()).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::NotFound);
    }

    #[tokio::test]
    async fn resolve_leaves_a_rededicated_ambulance_alone() {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();

        // The event claims to be served by an ambulance that has since
        // been re-dispatched to a different event.
        let other_event = EventId::new();
        let mut ambulance = Ambulance::idle_at(GeoPoint::new(40.75, -73.985));
        ambulance.begin_response(other_event, 45);
        store.save_ambulance(&ambulance).await.unwrap();

        let mut event = open_event(GeoPoint::new(40.75, -73.985));
        event.mark_enroute(ambulance.id);
        store.save_event(&event).await.unwrap();

        let outcome = resolve_event(&store, &notifier, event.id).await.unwrap();
        assert!(matches!(outcome, ResolveOutcome::Resolved(_)));

        // Still serving the other event.
        let stored = store.get_ambulance(ambulance.id).await.unwrap().unwrap();
        assert_eq!(stored.status.assigned_event(), Some(other_event));
    }
}
