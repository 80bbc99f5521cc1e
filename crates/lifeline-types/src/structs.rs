//! Core entity structs for the Lifeline dispatch system.
//!
//! Statuses are modeled as tagged variants that *carry* their paired
//! fields: an `EnRoute` ambulance always has an assigned event and an
//! ETA, and an `Idle` one structurally cannot. This removes the
//! nullable-field states (`event_id` set while `status == idle`, etc.)
//! that a flat record would permit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AmbulancePhase, EventPhase, Severity};
use crate::geo::GeoPoint;
use crate::ids::{AmbulanceId, CameraId, EventId, HospitalId};

// ---------------------------------------------------------------------------
// Ambulance
// ---------------------------------------------------------------------------

/// Lifecycle state of an ambulance, with the assignment fields attached
/// to the only variant where they are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AmbulanceStatus {
    /// Available for assignment.
    Idle,
    /// Committed to an event and moving toward it.
    EnRoute {
        /// The event this ambulance is responding to.
        event_id: EventId,
        /// Planning estimate of seconds until arrival, recomputed every tick.
        eta_seconds: u32,
    },
    /// Administratively withdrawn from service.
    Unavailable,
}

impl AmbulanceStatus {
    /// The discriminant-only mirror of this status.
    pub const fn phase(&self) -> AmbulancePhase {
        match self {
            Self::Idle => AmbulancePhase::Idle,
            Self::EnRoute { .. } => AmbulancePhase::EnRoute,
            Self::Unavailable => AmbulancePhase::Unavailable,
        }
    }

    /// The assigned event, present iff the ambulance is en route.
    pub const fn assigned_event(&self) -> Option<EventId> {
        match self {
            Self::EnRoute { event_id, .. } => Some(*event_id),
            Self::Idle | Self::Unavailable => None,
        }
    }

    /// The current ETA estimate, present iff the ambulance is en route.
    pub const fn eta_seconds(&self) -> Option<u32> {
        match self {
            Self::EnRoute { eta_seconds, .. } => Some(*eta_seconds),
            Self::Idle | Self::Unavailable => None,
        }
    }
}

/// A mobile responder.
///
/// `position` is mutated only by the movement simulation loop (while en
/// route) or by an explicit administrative reset. `updated_at` is bumped
/// on every mutation and is monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Ambulance {
    /// Stable identifier for the lifetime of the record.
    pub id: AmbulanceId,
    /// Current position.
    pub position: GeoPoint,
    /// Lifecycle state, carrying assignment fields when en route.
    pub status: AmbulanceStatus,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Ambulance {
    /// Create a new idle ambulance at the given position.
    pub fn idle_at(position: GeoPoint) -> Self {
        Self {
            id: AmbulanceId::new(),
            position,
            status: AmbulanceStatus::Idle,
            updated_at: Utc::now(),
        }
    }

    /// Commit this ambulance to an event with an initial ETA estimate.
    pub fn begin_response(&mut self, event_id: EventId, eta_seconds: u32) {
        self.status = AmbulanceStatus::EnRoute {
            event_id,
            eta_seconds,
        };
        self.updated_at = Utc::now();
    }

    /// Advance the position and refresh the ETA while en route.
    ///
    /// Keeps the current assignment; callers only invoke this on an
    /// ambulance whose status is `EnRoute`.
    pub fn advance_to(&mut self, position: GeoPoint, eta_seconds: u32) {
        if let AmbulanceStatus::EnRoute { event_id, .. } = self.status {
            self.status = AmbulanceStatus::EnRoute {
                event_id,
                eta_seconds,
            };
        }
        self.position = position;
        self.updated_at = Utc::now();
    }

    /// Release the ambulance back to idle, clearing assignment fields.
    ///
    /// Used on arrival, on manual resolution, and on orphan recovery.
    pub fn release(&mut self) {
        self.status = AmbulanceStatus::Idle;
        self.updated_at = Utc::now();
    }

    /// Release the ambulance at an exact position (snap-to-target on
    /// arrival).
    pub fn release_at(&mut self, position: GeoPoint) {
        self.position = position;
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Lifecycle state of an event. `Resolved` is terminal; an event never
/// regresses to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum EventStatus {
    /// Reported, no responder committed yet.
    Open,
    /// A responder is committed and moving toward the event.
    EnRoute {
        /// The responder committed to this event.
        ambulance_id: AmbulanceId,
    },
    /// Terminal: the event has been handled.
    Resolved {
        /// When the event was resolved.
        resolved_at: DateTime<Utc>,
    },
}

impl EventStatus {
    /// The discriminant-only mirror of this status.
    pub const fn phase(&self) -> EventPhase {
        match self {
            Self::Open => EventPhase::Open,
            Self::EnRoute { .. } => EventPhase::EnRoute,
            Self::Resolved { .. } => EventPhase::Resolved,
        }
    }

    /// The committed responder, present iff the event is en route.
    pub const fn assigned_ambulance(&self) -> Option<AmbulanceId> {
        match self {
            Self::EnRoute { ambulance_id } => Some(*ambulance_id),
            Self::Open | Self::Resolved { .. } => None,
        }
    }

    /// The resolution timestamp, present iff the event is resolved.
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Resolved { resolved_at } => Some(*resolved_at),
            Self::Open | Self::EnRoute { .. } => None,
        }
    }
}

/// A reported incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Stable identifier for the lifetime of the record.
    pub id: EventId,
    /// How urgent the incident is; gates dispatch.
    pub severity: Severity,
    /// Short human-readable title.
    pub title: String,
    /// Longer free-form description.
    pub description: String,
    /// URL of the camera clip that triggered the report.
    pub reference_clip_url: String,
    /// Where the incident happened.
    pub location: GeoPoint,
    /// The camera that reported the incident, if any.
    pub camera_id: Option<CameraId>,
    /// Lifecycle state, carrying the assignment when en route.
    pub status: EventStatus,
    /// When the incident was reported.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Record that a responder has been committed to this event.
    pub const fn mark_enroute(&mut self, ambulance_id: AmbulanceId) {
        self.status = EventStatus::EnRoute { ambulance_id };
    }

    /// Record that this event has been handled. Terminal.
    pub const fn mark_resolved(&mut self, resolved_at: DateTime<Utc>) {
        self.status = EventStatus::Resolved { resolved_at };
    }
}

// ---------------------------------------------------------------------------
// Camera / Hospital (registration boundary records)
// ---------------------------------------------------------------------------

/// A registered street camera -- the incident ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Camera {
    /// Stable identifier.
    pub id: CameraId,
    /// Operator-facing camera name.
    pub name: String,
    /// Mounting position.
    pub location: GeoPoint,
    /// URL serving the camera's latest frame.
    pub latest_frame_url: String,
    /// Events this camera has reported, oldest first.
    pub event_ids: Vec<EventId>,
}

impl Camera {
    /// Register a new camera with no reported events.
    pub fn new(name: impl Into<String>, location: GeoPoint, latest_frame_url: impl Into<String>) -> Self {
        Self {
            id: CameraId::new(),
            name: name.into(),
            location,
            latest_frame_url: latest_frame_url.into(),
            event_ids: Vec::new(),
        }
    }
}

/// A hospital; ambulances are provisioned at hospital positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Hospital {
    /// Stable identifier.
    pub id: HospitalId,
    /// Hospital name.
    pub name: String,
    /// Hospital position.
    pub location: GeoPoint,
}

impl Hospital {
    /// Create a new hospital record.
    pub fn new(name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: HospitalId::new(),
            name: name.into(),
            location,
        }
    }
}
