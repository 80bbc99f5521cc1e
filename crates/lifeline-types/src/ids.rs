//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the dispatch system has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered) minted through a process-wide [`ContextV7`], so IDs
//! created within the same millisecond still sort in creation order. A
//! plain key-ordered scan of a store therefore returns entities in
//! registration order -- the dispatch engine relies on this for its
//! deterministic tie-break.

use std::sync::{LazyLock, Mutex};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::timestamp::context::ContextV7;
use uuid::{Timestamp, Uuid};

/// Shared counter context keeping same-millisecond IDs monotonic.
///
/// [`ContextV7`] uses unsynchronized interior mutability, so it must be
/// wrapped in a [`Mutex`] to be shared across threads via a `static`.
static V7_CONTEXT: LazyLock<Mutex<ContextV7>> =
    LazyLock::new(|| Mutex::new(ContextV7::new()));

/// Mint the next monotonic UUID v7.
fn monotonic_v7() -> Uuid {
    Uuid::new_v7(Timestamp::now(&*V7_CONTEXT))
}

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(monotonic_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a mobile responder (ambulance).
    AmbulanceId
}

define_id! {
    /// Unique identifier for a reported incident (event).
    EventId
}

define_id! {
    /// Unique identifier for a registered street camera.
    CameraId
}

define_id! {
    /// Unique identifier for a hospital (ambulance home station).
    HospitalId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ambulance = AmbulanceId::new();
        let event = EventId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(ambulance.into_inner(), Uuid::nil());
        assert_ne!(event.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = AmbulanceId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<AmbulanceId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok());
    }

    #[test]
    fn v7_ids_sort_by_creation_order() {
        let first = AmbulanceId::new();
        let second = AmbulanceId::new();
        // The shared context keeps same-millisecond IDs monotonic, so
        // later IDs always compare greater.
        assert!(first < second);
    }

    #[test]
    fn a_burst_of_ids_stays_monotonic() {
        let ids: Vec<EventId> = (0..100).map(|_| EventId::new()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = EventId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
