//! Dispatch and tracking engine for the Lifeline system.
//!
//! This crate holds every part of the system with real concurrency
//! hazards, numeric computation, or timing-dependent correctness:
//!
//! - [`geo`] -- great-circle distance, ETA estimation, step interpolation
//! - [`dispatch`] -- nearest-available-responder assignment with
//!   race-free claiming, plus the manual resolution path
//! - [`mover`] -- the per-tick movement step: advance, arrive, self-heal
//! - [`runner`] + [`operator`] -- the cancellable recurring loop around
//!   the tick, with pause/resume and runtime speed control
//! - [`notify`] -- broadcast fan-out of entity state changes
//! - [`ingest`] -- the "process new event" entry point for the camera
//!   boundary
//! - [`config`] -- typed configuration with YAML loading
//!
//! # Concurrency model
//!
//! The entity store is the only shared mutable resource. All cross-writer
//! coordination funnels through its conditional `claim` (compare-and-set
//! on status); there is no global lock. Dispatch resolves contention with
//! a bounded fallback over the remaining candidates; the movement loop
//! resolves it by being the sole writer of en-route fields and by
//! claiming transitions out of en-route.

pub mod config;
pub mod dispatch;
pub mod geo;
pub mod ingest;
pub mod mover;
pub mod notify;
pub mod operator;
pub mod runner;

// Re-export primary types for convenience.
pub use config::{ConfigError, DispatchConfig, HttpConfig, LifelineConfig, MoverConfig};
pub use dispatch::{Assignment, DispatchError, ResolveOutcome};
pub use geo::{StepOutcome, distance_km, eta_seconds, step_toward};
pub use ingest::{IncidentReport, IngestError, ProcessedIncident};
pub use mover::TickSummary;
pub use notify::ChangeNotifier;
pub use operator::{MoverEndReason, OperatorState};
pub use runner::MoverResult;
