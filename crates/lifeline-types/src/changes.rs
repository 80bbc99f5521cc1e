//! Live state-change records pushed to subscribers.
//!
//! Every mutation the core performs (claim, per-tick movement, orphan
//! recovery, resolution, registration) is published as one
//! [`StateChange`] carrying the entity's *new* state. Subscribers that
//! miss messages simply converge on the next change for that entity --
//! the stream is a notification channel, not a durable log.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::structs::{Ambulance, Event};

/// A state-change notification: which kind of entity changed, and its
/// full new state. The wire format tags the variant as `entity_type` and
/// nests the record under `new_state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "entity_type", content = "new_state", rename_all = "snake_case")]
pub enum StateChange {
    /// An ambulance was mutated (claimed, moved, released).
    Ambulance(Ambulance),
    /// An event was mutated (created, assigned, resolved).
    Event(Event),
}

impl StateChange {
    /// The identifier of the entity that changed.
    pub const fn entity_id(&self) -> Uuid {
        match self {
            Self::Ambulance(ambulance) => ambulance.id.into_inner(),
            Self::Event(event) => event.id.into_inner(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::enums::Severity;
    use crate::geo::GeoPoint;
    use crate::ids::EventId;
    use crate::structs::EventStatus;

    #[test]
    fn wire_format_tags_entity_type() {
        let ambulance = Ambulance::idle_at(GeoPoint::new(40.0, -80.0));
        let id = ambulance.id;
        let change = StateChange::Ambulance(ambulance);
        assert_eq!(change.entity_id(), id.into_inner());

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(
            json.get("entity_type").and_then(|v| v.as_str()),
            Some("ambulance")
        );
        assert!(json.get("new_state").is_some());
    }

    #[test]
    fn event_change_roundtrip() {
        let event = Event {
            id: EventId::new(),
            severity: Severity::Emergency,
            title: String::from("Collision"),
            description: String::from("Two vehicles"),
            reference_clip_url: String::from("http://localhost:5055/latest_frame"),
            location: GeoPoint::new(40.75, -73.985),
            camera_id: None,
            status: EventStatus::Open,
            created_at: Utc::now(),
        };
        let change = StateChange::Event(event.clone());
        let json = serde_json::to_string(&change).unwrap();
        let restored: StateChange = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, StateChange::Event(event));
    }
}
