//! Axum router construction for the dispatch API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled so the map dashboard's dev server can
//! call the API cross-origin.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the dispatch server.
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted to the dashboard origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/live", get(ws::ws_live))
        // Ingestion
        .route("/api/process_event", post(handlers::process_event))
        // Events
        .route("/api/events", get(handlers::list_events))
        .route("/api/events/{id}", get(handlers::get_event))
        .route("/api/events/{id}/resolve", post(handlers::resolve_event))
        // Ambulances
        .route("/api/ambulances", get(handlers::list_ambulances))
        .route("/api/ambulances/register", post(handlers::register_ambulance))
        .route("/api/ambulances/{id}", get(handlers::get_ambulance))
        // Cameras / hospitals
        .route("/api/cameras", get(handlers::list_cameras))
        .route("/api/cameras/register", post(handlers::register_camera))
        .route("/api/hospitals", get(handlers::list_hospitals))
        // Operator controls
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
