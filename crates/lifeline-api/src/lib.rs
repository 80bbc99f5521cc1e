//! Dispatch API server for the Lifeline system.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Ingestion endpoint** (`POST /api/process_event`) invoked by the
//!   camera/AI service; emergencies dispatch a responder synchronously
//! - **`WebSocket` endpoint** (`/ws/live`) streaming every entity state
//!   change via [`tokio::sync::broadcast`]
//! - **REST endpoints** for querying ambulances, events, cameras, and
//!   hospitals, for manual event resolution, and for registration
//! - **Operator REST endpoints** for runtime control of the movement
//!   loop (pause, resume, speed, status, stop)
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Handlers read and write the shared in-memory entity store directly;
//! all mutations flow through `lifeline-core` so claiming, lifecycle
//! invariants, and change publication live in one place. `WebSocket`
//! clients receive changes via a broadcast channel with automatic lag
//! handling, so a slow dashboard can never block the movement loop.

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
