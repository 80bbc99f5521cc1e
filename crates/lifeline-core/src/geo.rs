//! Great-circle distance, ETA estimation, and step interpolation.
//!
//! All three are pure, total functions. Note the deliberate split
//! between the two notions of speed in this system:
//!
//! - [`eta_seconds`] is a *planning estimate* from an assumed road speed,
//!   recomputed every tick and shown to operators.
//! - [`step_toward`] advances a position by a fixed *angular* step per
//!   tick, sized for visible motion on a map rather than physical
//!   calibration.
//!
//! The two are independently configured and never reconciled; changing
//! the assumed speed changes ETAs without changing how fast responders
//! actually converge.

use lifeline_types::GeoPoint;

/// Mean Earth radius in kilometers, as used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers
/// (haversine formula).
///
/// Defined for every valid latitude/longitude pair; no error conditions.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Estimated travel time in whole seconds for `distance_km` at an
/// assumed road speed.
///
/// A planning estimate only -- arrival is governed by the step size, not
/// by this number.
pub fn eta_seconds(distance_km: f64, assumed_speed_kmh: f64) -> u32 {
    let seconds = (distance_km / assumed_speed_kmh * 3600.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let seconds = seconds.max(0.0) as u32;
    seconds
}

/// Result of one interpolation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The remaining straight-line distance is smaller than one step;
    /// the caller should snap the position to the target exactly.
    Arrived,
    /// The position after moving one step along the line to the target.
    Advanced(GeoPoint),
}

/// Move `current` a fixed angular step (decimal degrees) along the
/// straight line toward `target`.
///
/// Distances here are planar, in degree space -- the step is an on-map
/// motion increment, not a geodesic. Returns [`StepOutcome::Arrived`]
/// (snap-to-target) once the remaining planar distance falls below
/// `step_deg`, which also covers the already-at-target case.
pub fn step_toward(current: GeoPoint, target: GeoPoint, step_deg: f64) -> StepOutcome {
    let d_lat = target.lat - current.lat;
    let d_lng = target.lng - current.lng;

    let remaining = d_lat.hypot(d_lng);
    if remaining < step_deg {
        return StepOutcome::Arrived;
    }

    StepOutcome::Advanced(GeoPoint::new(
        current.lat + d_lat / remaining * step_deg,
        current.lng + d_lng / remaining * step_deg,
    ))
}
