//! Incident ingestion: the "process new event" entry point.
//!
//! Called by the HTTP boundary when a camera (or the AI service watching
//! it) reports an incident. Creates the event at a jittered position
//! around the reporting camera, records it on the camera, and -- for
//! emergency severity only -- invokes the dispatch assignment engine
//! synchronously. Dispatch is best-effort: an emergency event stays
//! `Open` if no responder is available.

use chrono::Utc;
use lifeline_store::{MemoryStore, StoreError};
use lifeline_types::{Camera, CameraId, Event, EventId, EventStatus, GeoPoint, Severity};
use rand::Rng;
use tracing::{debug, info};

use crate::config::LifelineConfig;
use crate::dispatch::{self, Assignment, DispatchError};
use crate::notify::ChangeNotifier;

/// Where an unrecognized reporter's fallback camera is registered.
pub const FALLBACK_CAMERA_POSITION: GeoPoint = GeoPoint::new(40.7501, -73.9866);

/// Errors that can occur during ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The entity store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The dispatch engine failed.
    #[error("dispatch error: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: DispatchError,
    },
}

/// An inbound incident report from the ingestion boundary.
#[derive(Debug, Clone)]
pub struct IncidentReport {
    /// The reporting camera, if known.
    pub camera_id: Option<CameraId>,
    /// Incident severity; gates dispatch.
    pub severity: Severity,
    /// Short human-readable title.
    pub title: String,
    /// Longer free-form description.
    pub description: String,
    /// URL of the clip that triggered the report.
    pub reference_clip_url: String,
}

/// Result of processing an incident report.
#[derive(Debug, Clone)]
pub struct ProcessedIncident {
    /// The created event, reflecting any assignment.
    pub event: Event,
    /// The committed claim, when an emergency found a responder.
    pub assignment: Option<Assignment>,
}

/// Process a new incident report end-to-end.
///
/// # Errors
///
/// Returns [`IngestError`] if a store write or the dispatch engine
/// fails. "No responder available" is not an error; the returned
/// `assignment` is simply `None`.
pub async fn process_incident(
    store: &MemoryStore,
    notifier: &ChangeNotifier,
    config: &LifelineConfig,
    report: IncidentReport,
) -> Result<ProcessedIncident, IngestError> {
    let mut camera = resolve_camera(store, &report).await?;

    // The camera only knows its own mounting point; scatter the incident
    // around it so co-located reports stay distinguishable on the map.
    let location = jitter_around(camera.location, config.dispatch.jitter_deg);

    let mut event = Event {
        id: EventId::new(),
        severity: report.severity,
        title: report.title,
        description: report.description,
        reference_clip_url: report.reference_clip_url,
        location,
        camera_id: Some(camera.id),
        status: EventStatus::Open,
        created_at: Utc::now(),
    };
    store.save_event(&event).await?;

    camera.event_ids.push(event.id);
    store.save_camera(&camera).await?;

    notifier.event_changed(&event);
    info!(
        event_id = %event.id,
        camera_id = %camera.id,
        severity = ?event.severity,
        "incident recorded"
    );

    let assignment = match event.severity {
        Severity::Emergency => {
            dispatch::assign_nearest(store, notifier, &config.dispatch, &event).await?
        }
        Severity::Informational => {
            debug!(event_id = %event.id, "informational incident, no dispatch");
            None
        }
    };

    // Reflect the assignment in the returned record.
    if assignment.is_some() {
        if let Some(updated) = store.get_event(event.id).await? {
            event = updated;
        }
    }

    Ok(ProcessedIncident { event, assignment })
}

/// Look up the reporting camera, registering a fallback when unknown.
async fn resolve_camera(
    store: &MemoryStore,
    report: &IncidentReport,
) -> Result<Camera, StoreError> {
    if let Some(id) = report.camera_id {
        if let Some(camera) = store.get_camera(id).await? {
            return Ok(camera);
        }
    }

    let camera = Camera::new(
        "unregistered",
        FALLBACK_CAMERA_POSITION,
        report.reference_clip_url.clone(),
    );
    store.save_camera(&camera).await?;
    info!(camera_id = %camera.id, "unknown reporter, registered fallback camera");
    Ok(camera)
}

/// Scatter a point uniformly within `+-jitter_deg` on both axes.
fn jitter_around(center: GeoPoint, jitter_deg: f64) -> GeoPoint {
    if jitter_deg <= 0.0 {
        return center;
    }
    let mut rng = rand::rng();
    GeoPoint::new(
        center.lat + rng.random_range(-jitter_deg..=jitter_deg),
        center.lng + rng.random_range(-jitter_deg..=jitter_deg),
    )
}
