//! REST API endpoint handlers for the dispatch server.
//!
//! All handlers read and write through the shared [`AppState`]'s entity
//! store; mutations go through the core engine so every change is
//! claimed, validated, and published exactly once.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `POST` | `/api/process_event` | Ingest an incident report |
//! | `GET` | `/api/events` | List events (`?phase=` filter) |
//! | `GET` | `/api/events/:id` | Single event |
//! | `POST` | `/api/events/:id/resolve` | Resolve an event directly |
//! | `GET` | `/api/ambulances` | List ambulances |
//! | `GET` | `/api/ambulances/:id` | Single ambulance |
//! | `POST` | `/api/ambulances/register` | Provision an idle ambulance |
//! | `GET` | `/api/cameras` | List cameras |
//! | `POST` | `/api/cameras/register` | Register a camera |
//! | `GET` | `/api/hospitals` | List hospitals |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use lifeline_core::dispatch::ResolveOutcome;
use lifeline_core::{dispatch, ingest};
use lifeline_types::{
    Ambulance, Camera, EventPhase, GeoPoint, Severity,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / query types
// ---------------------------------------------------------------------------

/// Body for `POST /api/process_event` -- an incident report from the
/// camera/AI service.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct ProcessEventRequest {
    /// The reporting camera, if known.
    pub camera_id: Option<Uuid>,
    /// Incident severity; only emergencies dispatch a responder.
    pub severity: Severity,
    /// Short human-readable title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Longer free-form description.
    #[validate(length(max = 2000))]
    pub description: String,
    /// URL of the clip that triggered the report.
    #[validate(url)]
    pub reference_clip_url: String,
}

/// Body for `POST /api/ambulances/register`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct RegisterAmbulanceRequest {
    /// Starting latitude.
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    /// Starting longitude.
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Body for `POST /api/cameras/register`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct RegisterCameraRequest {
    /// Operator-facing camera name; must be unique.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Mounting latitude.
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    /// Mounting longitude.
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    /// URL serving the camera's latest frame.
    #[validate(url)]
    pub latest_frame_url: String,
}

/// Query parameters for `GET /api/events`.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Filter by phase: `open`, `en_route`, or `resolved`.
    pub phase: Option<String>,
}

fn parse_phase(raw: &str) -> Result<EventPhase, ApiError> {
    match raw {
        "open" => Ok(EventPhase::Open),
        "en_route" => Ok(EventPhase::EnRoute),
        "resolved" => Ok(EventPhase::Resolved),
        other => Err(ApiError::InvalidRequest(format!(
            "unknown phase {other:?} (expected open, en_route, or resolved)"
        ))),
    }
}

fn validated<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
///
/// This is the placeholder dashboard until the React map frontend is
/// wired up.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ambulances = state.store.ambulance_count().await;
    let events = state.store.event_count().await;
    let cameras = state.store.camera_count().await;
    let hospitals = state.store.hospital_count().await;
    let clients = state.notifier.receiver_count();
    let ticks = state
        .operator
        .as_ref()
        .map_or(0, |op| op.ticks_completed());

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Lifeline Dispatch</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #f85149; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #f85149; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Lifeline Dispatch</h1>
    <p class="subtitle">Ambulance dispatch &amp; tracking engine</p>

    <p>Status: <span class="status">RUNNING</span></p>

    <div>
        <div class="metric">
            <div class="label">Ticks</div>
            <div class="value">{ticks}</div>
        </div>
        <div class="metric">
            <div class="label">Ambulances</div>
            <div class="value">{ambulances}</div>
        </div>
        <div class="metric">
            <div class="label">Events</div>
            <div class="value">{events}</div>
        </div>
        <div class="metric">
            <div class="label">Cameras</div>
            <div class="value">{cameras}</div>
        </div>
        <div class="metric">
            <div class="label">Hospitals</div>
            <div class="value">{hospitals}</div>
        </div>
        <div class="metric">
            <div class="label">Live clients</div>
            <div class="value">{clients}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/ambulances">/api/ambulances</a> -- List ambulances</li>
        <li><a href="/api/events">/api/events</a> -- List events (?phase=open|en_route|resolved)</li>
        <li><a href="/api/cameras">/api/cameras</a> -- List cameras</li>
        <li><a href="/api/hospitals">/api/hospitals</a> -- List hospitals</li>
        <li><a href="/api/operator/status">/api/operator/status</a> -- Engine status</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/live</code> -- Live entity state-change stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// POST /api/process_event -- ingestion boundary
// ---------------------------------------------------------------------------

/// Ingest an incident report.
///
/// Creates the event near the reporting camera and, for emergency
/// severity, dispatches the nearest idle ambulance synchronously. The
/// response carries the created event and the assignment when one was
/// committed; `assignment: null` means no responder was available.
pub async fn process_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProcessEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validated(&body)?;

    let report = ingest::IncidentReport {
        camera_id: body.camera_id.map(Into::into),
        severity: body.severity,
        title: body.title,
        description: body.description,
        reference_clip_url: body.reference_clip_url,
    };

    let processed = ingest::process_incident(&state.store, &state.notifier, &state.config, report)
        .await
        .map_err(|e| match e {
            ingest::IngestError::Store { source } => ApiError::Store(source),
            ingest::IngestError::Dispatch { source } => ApiError::Internal(source.to_string()),
        })?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "event": processed.event,
        "assignment": processed.assignment.map(|a| serde_json::json!({
            "ambulance_id": a.ambulance_id,
            "eta_seconds": a.eta_seconds,
            "distance_km": a.distance_km,
        })),
    })))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// List all events, optionally filtered by phase.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let events = match query.phase.as_deref() {
        Some(raw) => state.store.events_in_phase(parse_phase(raw)?).await,
        None => state.store.list_events().await,
    };
    Ok(Json(events))
}

/// Get a single event by ID.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .store
        .get_event(id.into())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
    Ok(Json(event))
}

/// Resolve an event directly, bypassing arrival detection.
///
/// Follows the same terminal-state and ambulance-release logic as an
/// arrival. Resolving an already-resolved event is a no-op success.
pub async fn resolve_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = dispatch::resolve_event(&state.store, &state.notifier, id.into())
        .await
        .map_err(|e| match e {
            dispatch::DispatchError::Store { source } => ApiError::Store(source),
        })?;

    match outcome {
        ResolveOutcome::Resolved(event) | ResolveOutcome::AlreadyResolved(event) => {
            Ok(Json(serde_json::json!({ "ok": true, "event": event })))
        }
        ResolveOutcome::NotFound => Err(ApiError::NotFound(format!("event {id} not found"))),
    }
}

// ---------------------------------------------------------------------------
// Ambulances
// ---------------------------------------------------------------------------

/// List all ambulances.
pub async fn list_ambulances(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.list_ambulances().await)
}

/// Get a single ambulance by ID.
pub async fn get_ambulance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ambulance = state
        .store
        .get_ambulance(id.into())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ambulance {id} not found")))?;
    Ok(Json(ambulance))
}

/// Provision a new idle ambulance at a position.
pub async fn register_ambulance(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterAmbulanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validated(&body)?;

    let ambulance = Ambulance::idle_at(GeoPoint::new(body.lat, body.lng));
    state.store.save_ambulance(&ambulance).await?;
    state.notifier.ambulance_changed(&ambulance);

    tracing::info!(ambulance_id = %ambulance.id, "ambulance registered");
    Ok(Json(serde_json::json!({ "ok": true, "ambulance": ambulance })))
}

// ---------------------------------------------------------------------------
// Cameras / hospitals
// ---------------------------------------------------------------------------

/// List all cameras.
pub async fn list_cameras(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.list_cameras().await)
}

/// Register a new camera.
///
/// Names must be unique; re-registering an existing name is a conflict.
pub async fn register_camera(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterCameraRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validated(&body)?;

    let exists = state
        .store
        .list_cameras()
        .await
        .iter()
        .any(|c| c.name == body.name);
    if exists {
        return Err(ApiError::Conflict(format!(
            "camera {:?} already exists",
            body.name
        )));
    }

    let camera = Camera::new(
        body.name,
        GeoPoint::new(body.lat, body.lng),
        body.latest_frame_url,
    );
    state.store.save_camera(&camera).await?;

    tracing::info!(camera_id = %camera.id, name = %camera.name, "camera registered");
    Ok(Json(serde_json::json!({ "ok": true, "camera": camera })))
}

/// List all hospitals.
pub async fn list_hospitals(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.list_hospitals().await)
}
