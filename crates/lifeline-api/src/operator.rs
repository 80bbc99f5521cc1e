//! Operator REST API handlers for runtime mover-loop control.
//!
//! These endpoints provide one-way command authority from the operator
//! to the movement loop: pause, resume, speed changes, and clean
//! shutdown, plus a status readout.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Current engine status |
//! | `POST` | `/api/operator/pause` | Pause the movement loop |
//! | `POST` | `/api/operator/resume` | Resume the movement loop |
//! | `POST` | `/api/operator/speed` | Set tick interval (ms) |
//! | `POST` | `/api/operator/stop` | Trigger clean shutdown |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use lifeline_core::operator::{MoverEndReason, OperatorState};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds (minimum 100).
    pub tick_interval_ms: u64,
}

/// JSON status of the engine for the operator API.
#[derive(Debug, serde::Serialize)]
pub struct EngineStatus {
    /// Ticks completed since start.
    pub ticks_completed: u64,
    /// Whether the movement loop is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Number of stored ambulances.
    pub ambulances: usize,
    /// Number of stored events.
    pub events: usize,
    /// Number of live-stream subscribers.
    pub subscribers: usize,
    /// The reason the loop ended, if it has.
    pub end_reason: Option<MoverEndReason>,
    /// ISO 8601 timestamp of when the loop started.
    pub started_at: String,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
}

fn require_operator(state: &AppState) -> Result<&Arc<OperatorState>, ApiError> {
    state
        .operator
        .as_ref()
        .ok_or_else(|| ApiError::Internal(String::from("operator state not available")))
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Current engine status: loop controls plus store counts.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let operator = require_operator(&state)?;

    Ok(Json(EngineStatus {
        ticks_completed: operator.ticks_completed(),
        paused: operator.is_paused(),
        stop_requested: operator.is_stop_requested(),
        tick_interval_ms: operator.tick_interval_ms(),
        elapsed_seconds: operator.elapsed_seconds(),
        ambulances: state.store.ambulance_count().await,
        events: state.store.event_count().await,
        subscribers: state.notifier.receiver_count(),
        end_reason: operator.end_reason().await,
        started_at: operator.started_at().to_rfc3339(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/pause
// ---------------------------------------------------------------------------

/// Pause the movement loop.
///
/// The loop finishes the tick in flight and sleeps until resumed. All
/// state is preserved.
pub async fn pause(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    require_operator(&state)?.pause();

    Ok(Json(OperatorResponse {
        ok: true,
        message: String::from("movement loop paused"),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/resume
// ---------------------------------------------------------------------------

/// Resume the movement loop after a pause.
pub async fn resume(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    require_operator(&state)?.resume();

    Ok(Json(OperatorResponse {
        ok: true,
        message: String::from("movement loop resumed"),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/speed
// ---------------------------------------------------------------------------

/// Change the tick interval at runtime.
///
/// The new interval takes effect before the next tick's sleep. Minimum
/// 100ms to prevent runaway ticks.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let operator = require_operator(&state)?;

    operator.set_tick_interval_ms(body.tick_interval_ms).map_or_else(
        || {
            Err(ApiError::InvalidRequest(String::from(
                "tick_interval_ms must be at least 100",
            )))
        },
        |prev| {
            Ok(Json(serde_json::json!({
                "ok": true,
                "message": format!(
                    "tick interval changed from {}ms to {}ms",
                    prev, body.tick_interval_ms
                ),
                "previous_interval_ms": prev,
                "new_interval_ms": body.tick_interval_ms,
            })))
        },
    )
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Trigger a clean shutdown of the movement loop.
///
/// The loop finishes the tick in flight, then exits. The HTTP server
/// keeps serving reads.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    require_operator(&state)?.request_stop();

    Ok(Json(OperatorResponse {
        ok: true,
        message: String::from("stop requested; loop exits after the current tick"),
    }))
}
