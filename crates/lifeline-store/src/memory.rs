//! In-memory hot-state store with conditional claims.
//!
//! Records are kept JSON-encoded in per-entity maps, mirroring how a
//! Redis-compatible backend would hold them; swapping this store for a
//! networked one changes the locking, not the record format. Keys are
//! UUID v7 identifiers, so the `BTreeMap` key order *is* registration
//! order -- every scan below is stable and deterministic, which the
//! dispatch engine's nearest-candidate tie-break depends on.
//!
//! # Key Patterns
//!
//! | Map | Key | Value |
//! |-----------|---------------|----------------------|
//! | ambulances | `AmbulanceId` | JSON [`Ambulance`] |
//! | events | `EventId` | JSON [`Event`] |
//! | cameras | `CameraId` | JSON [`Camera`] |
//! | hospitals | `HospitalId` | JSON [`Hospital`] |
//!
//! # Concurrency contract
//!
//! `claim_*` is the sole cross-writer coordination primitive: it takes
//! the write lock, checks that the stored entity's phase equals the
//! expected phase, and only then applies the mutation -- a genuine
//! compare-and-set. `save_*` is an unconditional last-write-wins
//! overwrite; callers use it only where they are the sole writer of the
//! fields involved. There are no cross-entity transactions.

use std::collections::BTreeMap;

use lifeline_types::{
    Ambulance, AmbulanceId, AmbulancePhase, Camera, CameraId, Event, EventId, EventPhase,
    Hospital, HospitalId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::StoreError;

/// Serialize `value` into its stored JSON form.
fn encode<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(StoreError::Encode)
}

/// Deserialize a stored record, labeling failures with the record key.
fn decode<T: DeserializeOwned>(key: impl ToString, json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}

/// In-memory entity store for the dispatch system.
///
/// Cheap to clone-free share via [`std::sync::Arc`]; every method takes
/// `&self` and locks only the map it touches.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ambulances: RwLock<BTreeMap<AmbulanceId, String>>,
    events: RwLock<BTreeMap<EventId, String>>,
    cameras: RwLock<BTreeMap<CameraId, String>>,
    hospitals: RwLock<BTreeMap<HospitalId, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Ambulances
    // =========================================================================

    /// Unconditionally write an ambulance record (last write wins).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if the record cannot be serialized.
    pub async fn save_ambulance(&self, ambulance: &Ambulance) -> Result<(), StoreError> {
        let json = encode(ambulance)?;
        self.ambulances.write().await.insert(ambulance.id, json);
        Ok(())
    }

    /// Read a single ambulance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the stored record cannot be
    /// decoded.
    pub async fn get_ambulance(&self, id: AmbulanceId) -> Result<Option<Ambulance>, StoreError> {
        let guard = self.ambulances.read().await;
        guard.get(&id).map(|json| decode(id, json)).transpose()
    }

    /// List every ambulance in key (registration) order.
    ///
    /// Corrupt records are logged and skipped rather than failing the
    /// whole scan; [`get_ambulance`](Self::get_ambulance) surfaces them
    /// individually.
    pub async fn list_ambulances(&self) -> Vec<Ambulance> {
        let guard = self.ambulances.read().await;
        guard
            .iter()
            .filter_map(|(id, json)| match decode::<Ambulance>(id, json) {
                Ok(ambulance) => Some(ambulance),
                Err(e) => {
                    warn!(error = %e, "skipping corrupt ambulance record");
                    None
                }
            })
            .collect()
    }

    /// List ambulances currently in `phase`, in key (registration) order.
    pub async fn ambulances_in_phase(&self, phase: AmbulancePhase) -> Vec<Ambulance> {
        self.list_ambulances()
            .await
            .into_iter()
            .filter(|a| a.status.phase() == phase)
            .collect()
    }

    /// Conditionally mutate an ambulance: compare-and-set on its phase.
    ///
    /// Under the write lock, succeeds iff the stored ambulance's phase
    /// equals `expected`, applying `mutate` and persisting atomically.
    /// Returns the updated record on success, or `None` -- with no side
    /// effects -- if the ambulance is missing or another writer already
    /// moved it out of `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the stored record cannot be
    /// decoded, or [`StoreError::Encode`] if the mutated record cannot be
    /// re-encoded (the stored record is left untouched in both cases).
    pub async fn claim_ambulance(
        &self,
        id: AmbulanceId,
        expected: AmbulancePhase,
        mutate: impl FnOnce(&mut Ambulance),
    ) -> Result<Option<Ambulance>, StoreError> {
        let mut guard = self.ambulances.write().await;
        let Some(json) = guard.get(&id) else {
            return Ok(None);
        };
        let mut ambulance: Ambulance = decode(id, json)?;
        if ambulance.status.phase() != expected {
            return Ok(None);
        }
        mutate(&mut ambulance);
        let updated = encode(&ambulance)?;
        guard.insert(id, updated);
        Ok(Some(ambulance))
    }

    /// Number of stored ambulance records.
    pub async fn ambulance_count(&self) -> usize {
        self.ambulances.read().await.len()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Unconditionally write an event record (last write wins).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if the record cannot be serialized.
    pub async fn save_event(&self, event: &Event) -> Result<(), StoreError> {
        let json = encode(event)?;
        self.events.write().await.insert(event.id, json);
        Ok(())
    }

    /// Read a single event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the stored record cannot be
    /// decoded.
    pub async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let guard = self.events.read().await;
        guard.get(&id).map(|json| decode(id, json)).transpose()
    }

    /// List every event in key (creation) order.
    ///
    /// Corrupt records are logged and skipped.
    pub async fn list_events(&self) -> Vec<Event> {
        let guard = self.events.read().await;
        guard
            .iter()
            .filter_map(|(id, json)| match decode::<Event>(id, json) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(error = %e, "skipping corrupt event record");
                    None
                }
            })
            .collect()
    }

    /// List events currently in `phase`, in key (creation) order.
    pub async fn events_in_phase(&self, phase: EventPhase) -> Vec<Event> {
        self.list_events()
            .await
            .into_iter()
            .filter(|e| e.status.phase() == phase)
            .collect()
    }

    /// Conditionally mutate an event: compare-and-set on its phase.
    ///
    /// Same contract as [`claim_ambulance`](Self::claim_ambulance).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] or [`StoreError::Encode`] as for
    /// [`claim_ambulance`](Self::claim_ambulance).
    pub async fn claim_event(
        &self,
        id: EventId,
        expected: EventPhase,
        mutate: impl FnOnce(&mut Event),
    ) -> Result<Option<Event>, StoreError> {
        let mut guard = self.events.write().await;
        let Some(json) = guard.get(&id) else {
            return Ok(None);
        };
        let mut event: Event = decode(id, json)?;
        if event.status.phase() != expected {
            return Ok(None);
        }
        mutate(&mut event);
        let updated = encode(&event)?;
        guard.insert(id, updated);
        Ok(Some(event))
    }

    /// Number of stored event records.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    // =========================================================================
    // Cameras
    // =========================================================================

    /// Unconditionally write a camera record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if the record cannot be serialized.
    pub async fn save_camera(&self, camera: &Camera) -> Result<(), StoreError> {
        let json = encode(camera)?;
        self.cameras.write().await.insert(camera.id, json);
        Ok(())
    }

    /// Read a single camera.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the stored record cannot be
    /// decoded.
    pub async fn get_camera(&self, id: CameraId) -> Result<Option<Camera>, StoreError> {
        let guard = self.cameras.read().await;
        guard.get(&id).map(|json| decode(id, json)).transpose()
    }

    /// List every camera in key (registration) order.
    ///
    /// Corrupt records are logged and skipped.
    pub async fn list_cameras(&self) -> Vec<Camera> {
        let guard = self.cameras.read().await;
        guard
            .iter()
            .filter_map(|(id, json)| match decode::<Camera>(id, json) {
                Ok(camera) => Some(camera),
                Err(e) => {
                    warn!(error = %e, "skipping corrupt camera record");
                    None
                }
            })
            .collect()
    }

    /// Number of stored camera records.
    pub async fn camera_count(&self) -> usize {
        self.cameras.read().await.len()
    }

    // =========================================================================
    // Hospitals
    // =========================================================================

    /// Unconditionally write a hospital record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if the record cannot be serialized.
    pub async fn save_hospital(&self, hospital: &Hospital) -> Result<(), StoreError> {
        let json = encode(hospital)?;
        self.hospitals.write().await.insert(hospital.id, json);
        Ok(())
    }

    /// List every hospital in key (registration) order.
    ///
    /// Corrupt records are logged and skipped.
    pub async fn list_hospitals(&self) -> Vec<Hospital> {
        let guard = self.hospitals.read().await;
        guard
            .iter()
            .filter_map(|(id, json)| match decode::<Hospital>(id, json) {
                Ok(hospital) => Some(hospital),
                Err(e) => {
                    warn!(error = %e, "skipping corrupt hospital record");
                    None
                }
            })
            .collect()
    }

    /// Number of stored hospital records.
    pub async fn hospital_count(&self) -> usize {
        self.hospitals.read().await.len()
    }

    // =========================================================================
    // Test support
    // =========================================================================

    /// Insert a raw (possibly invalid) JSON record under an ambulance key.
    ///
    /// Exists so downstream crates can exercise their corrupt-record
    /// error paths.
    #[cfg(any(test, feature = "test-support"))]
    pub async fn insert_raw_ambulance(&self, id: AmbulanceId, json: impl Into<String>) {
        self.ambulances.write().await.insert(id, json.into());
    }
}
