//! Shared type definitions for the Lifeline dispatch system.
//!
//! This crate is the single source of truth for all types used across the
//! Lifeline workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the live map dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`geo`] -- The WGS-84 coordinate pair
//! - [`enums`] -- Severity and the fieldless status phases
//! - [`structs`] -- Entity records (ambulances, events, cameras, hospitals)
//! - [`changes`] -- Live state-change records for the notifier stream

pub mod changes;
pub mod enums;
pub mod geo;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use changes::StateChange;
pub use enums::{AmbulancePhase, EventPhase, Severity};
pub use geo::GeoPoint;
pub use ids::{AmbulanceId, CameraId, EventId, HospitalId};
pub use structs::{Ambulance, AmbulanceStatus, Camera, Event, EventStatus, Hospital};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AmbulanceId::export_all();
        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::CameraId::export_all();
        let _ = crate::ids::HospitalId::export_all();

        // Enums
        let _ = crate::enums::Severity::export_all();
        let _ = crate::enums::AmbulancePhase::export_all();
        let _ = crate::enums::EventPhase::export_all();

        // Geo
        let _ = crate::geo::GeoPoint::export_all();

        // Structs
        let _ = crate::structs::Ambulance::export_all();
        let _ = crate::structs::AmbulanceStatus::export_all();
        let _ = crate::structs::Event::export_all();
        let _ = crate::structs::EventStatus::export_all();
        let _ = crate::structs::Camera::export_all();
        let _ = crate::structs::Hospital::export_all();

        // Changes
        let _ = crate::changes::StateChange::export_all();
    }
}
