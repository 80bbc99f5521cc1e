//! Entity store for the Lifeline dispatch system.
//!
//! The store holds the live (hot) state of every ambulance, event,
//! camera, and hospital. It exposes three operations per entity type:
//!
//! - `get` / `list` -- clone-out reads
//! - `save` -- unconditional last-write-wins overwrite
//! - `claim` -- a conditional update that succeeds only if the stored
//!   entity's phase equals an expected phase, applied atomically
//!
//! `claim` is the sole concurrency-safety mechanism between the dispatch
//! engine and any other concurrent writer (a second dispatch attempt, a
//! manual resolve, the movement loop). Contention is resolved per entity,
//! optimistically; there is no global lock and no cross-entity
//! transaction, so callers must tolerate partial application across two
//! entities.
//!
//! The in-memory backend keeps records JSON-encoded (the same record
//! format a Redis-compatible backend would hold), so decode failures are
//! a real, testable error path rather than a theoretical one.
//!
//! # Modules
//!
//! - [`memory`] -- In-memory `BTreeMap` backend
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use memory::MemoryStore;
