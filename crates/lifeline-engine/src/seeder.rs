//! Seed the store with the starting fleet: hospitals, one idle
//! ambulance stationed at each, and the street cameras.
//!
//! The defaults mirror the reference deployment (downtown Pittsburgh:
//! three hospitals, ten cameras). A `seeding` section in the config
//! file overrides any of it, or disables seeding entirely for
//! deployments that provision through the API.

use lifeline_store::{MemoryStore, StoreError};
use lifeline_types::{Ambulance, Camera, GeoPoint, Hospital};
use serde::Deserialize;
use tracing::info;

/// Seeding configuration, read from the `seeding` key of
/// `lifeline-config.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedingConfig {
    /// Whether to seed at startup.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Hospitals to create; one idle ambulance is stationed at each.
    #[serde(default = "default_hospitals")]
    pub hospitals: Vec<SeedHospital>,

    /// Cameras to register.
    #[serde(default = "default_cameras")]
    pub cameras: Vec<SeedCamera>,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            hospitals: default_hospitals(),
            cameras: default_cameras(),
        }
    }
}

/// One seeded hospital.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedHospital {
    /// Hospital name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// One seeded camera.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCamera {
    /// Camera name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// URL serving the camera's latest frame.
    #[serde(default = "default_frame_url")]
    pub latest_frame_url: String,
}

/// Counts of what a seeding run created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Hospitals created.
    pub hospitals: usize,
    /// Ambulances created (one per hospital).
    pub ambulances: usize,
    /// Cameras created.
    pub cameras: usize,
}

/// Seed the store according to `config`.
///
/// A disabled config is a no-op returning zero counts.
///
/// # Errors
///
/// Returns [`StoreError`] if any record cannot be written.
pub async fn seed(store: &MemoryStore, config: &SeedingConfig) -> Result<SeedSummary, StoreError> {
    if !config.enabled {
        info!("seeding disabled");
        return Ok(SeedSummary {
            hospitals: 0,
            ambulances: 0,
            cameras: 0,
        });
    }

    for entry in &config.hospitals {
        let location = GeoPoint::new(entry.lat, entry.lng);
        let hospital = Hospital::new(entry.name.clone(), location);
        store.save_hospital(&hospital).await?;

        // Station one idle ambulance at the hospital.
        let ambulance = Ambulance::idle_at(location);
        store.save_ambulance(&ambulance).await?;
    }

    for entry in &config.cameras {
        let camera = Camera::new(
            entry.name.clone(),
            GeoPoint::new(entry.lat, entry.lng),
            entry.latest_frame_url.clone(),
        );
        store.save_camera(&camera).await?;
    }

    let summary = SeedSummary {
        hospitals: config.hospitals.len(),
        ambulances: config.hospitals.len(),
        cameras: config.cameras.len(),
    };
    info!(
        hospitals = summary.hospitals,
        ambulances = summary.ambulances,
        cameras = summary.cameras,
        "store seeded"
    );
    Ok(summary)
}

const fn default_enabled() -> bool {
    true
}

fn default_frame_url() -> String {
    String::from("http://localhost:5055/latest_frame")
}

fn default_hospitals() -> Vec<SeedHospital> {
    [
        ("UPMC Presbyterian", 40.4425, -79.9602),
        ("UPMC Mercy", 40.4364, -79.9855),
        ("Allegheny General Hospital", 40.4570, -80.0033),
    ]
    .into_iter()
    .map(|(name, lat, lng)| SeedHospital {
        name: String::from(name),
        lat,
        lng,
    })
    .collect()
}

fn default_cameras() -> Vec<SeedCamera> {
    [
        ("Astra-01", 40.4396, -79.9987),
        ("Astra-02", 40.4376, -79.9924),
        ("Astra-03", 40.4429, -79.9905),
        ("Astra-04", 40.4458, -79.9892),
        ("Astra-05", 40.4490, -79.9960),
        ("Astra-06", 40.4472, -79.9911),
        ("Astra-07", 40.4369, -79.9974),
        ("Astra-08", 40.4438, -79.9836),
        ("Astra-12", 40.4410, -79.9959),
        ("Astra-18", 40.4445, -79.9932),
    ]
    .into_iter()
    .map(|(name, lat, lng)| SeedCamera {
        name: String::from(name),
        lat,
        lng,
        latest_frame_url: default_frame_url(),
    })
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lifeline_types::AmbulancePhase;

    use super::*;

    #[tokio::test]
    async fn default_seed_stations_one_ambulance_per_hospital() {
        let store = MemoryStore::new();
        let summary = seed(&store, &SeedingConfig::default()).await.unwrap();

        assert_eq!(summary.hospitals, 3);
        assert_eq!(summary.ambulances, 3);
        assert_eq!(summary.cameras, 10);

        let hospitals = store.list_hospitals().await;
        let idle = store.ambulances_in_phase(AmbulancePhase::Idle).await;
        assert_eq!(hospitals.len(), 3);
        assert_eq!(idle.len(), 3);

        // Each ambulance sits at its hospital's position.
        for (hospital, ambulance) in hospitals.iter().zip(idle.iter()) {
            assert_eq!(ambulance.position, hospital.location);
        }
    }

    #[tokio::test]
    async fn disabled_seeding_writes_nothing() {
        let store = MemoryStore::new();
        let config = SeedingConfig {
            enabled: false,
            ..SeedingConfig::default()
        };
        let summary = seed(&store, &config).await.unwrap();

        assert_eq!(summary.ambulances, 0);
        assert_eq!(store.ambulance_count().await, 0);
        assert_eq!(store.camera_count().await, 0);
    }

    #[test]
    fn seeding_config_parses_from_yaml() {
        let yaml = r"
enabled: true
hospitals:
  - name: General
    lat: 40.0
    lng: -80.0
cameras: []
";
        let config: SeedingConfig = serde_yml::from_str(yaml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.hospitals.len(), 1);
        assert!(config.cameras.is_empty());
    }
}
