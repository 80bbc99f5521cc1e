//! Geographic coordinate type shared by every entity with a position.
//!
//! `GeoPoint` is a plain WGS-84 latitude/longitude pair. The actual
//! spatial math (haversine distance, step interpolation, ETA) lives in
//! `lifeline-core::geo`; this crate only carries the data shape so it can
//! flow to `TypeScript` via `ts-rs`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A WGS-84 geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Latitude in decimal degrees (positive north).
    pub lat: f64,
    /// Longitude in decimal degrees (positive east).
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new coordinate pair.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl core::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}
