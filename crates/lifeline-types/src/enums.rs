//! Enumeration types for the Lifeline dispatch system.
//!
//! The full ambulance/event statuses (with their attached assignment
//! fields) live in [`crate::structs`] as tagged variants. The fieldless
//! *phase* enums here are their discriminant-only mirrors, used for store
//! filters and as the expected-state precondition of conditional claims.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Severity of a reported incident.
///
/// Only `Emergency` incidents trigger the dispatch assignment engine;
/// `Informational` incidents are recorded and never dispatch a responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Noteworthy but non-urgent; no responder is dispatched.
    Informational,
    /// Urgent; the nearest idle ambulance is dispatched at ingestion time.
    Emergency,
}

/// Discriminant-only mirror of an ambulance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum AmbulancePhase {
    /// Available for assignment.
    Idle,
    /// Committed to an event and moving toward it.
    EnRoute,
    /// Administratively withdrawn; never a dispatch candidate.
    Unavailable,
}

/// Discriminant-only mirror of an event status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    /// Reported, no responder committed yet.
    Open,
    /// A responder is committed and moving toward the event.
    EnRoute,
    /// Terminal: the event has been handled.
    Resolved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_wire_format_is_snake_case() {
        let json = serde_json::to_string(&Severity::Emergency).ok();
        assert_eq!(json.as_deref(), Some("\"emergency\""));
    }

    #[test]
    fn phase_roundtrip() {
        for phase in [
            AmbulancePhase::Idle,
            AmbulancePhase::EnRoute,
            AmbulancePhase::Unavailable,
        ] {
            let json = serde_json::to_string(&phase).ok();
            let restored: Option<AmbulancePhase> =
                json.as_deref().and_then(|j| serde_json::from_str(j).ok());
            assert_eq!(restored, Some(phase));
        }
    }
}
