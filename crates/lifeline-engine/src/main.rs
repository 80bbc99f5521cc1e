//! Dispatch engine binary for the Lifeline system.
//!
//! This is the main entry point that wires together the entity store,
//! the seeder, the dispatch API server, and the movement simulation
//! loop. It loads configuration, initializes all subsystems, and runs
//! the loop until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `lifeline-config.yaml`
//! 3. Create the in-memory entity store and change notifier
//! 4. Seed hospitals, ambulances, and cameras
//! 5. Start the dispatch API server
//! 6. Install the Ctrl-C handler (clean stop between ticks)
//! 7. Run the movement loop
//! 8. Log the result

mod error;
mod seeder;

use std::path::Path;
use std::sync::Arc;

use lifeline_api::state::AppState;
use lifeline_core::config::LifelineConfig;
use lifeline_core::notify::ChangeNotifier;
use lifeline_core::operator::OperatorState;
use lifeline_core::runner;
use lifeline_store::MemoryStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::seeder::SeedingConfig;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "lifeline-config.yaml";

/// Application entry point for the dispatch engine.
///
/// Initializes all subsystems and runs the movement loop. Returns an
/// error code on failure.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("lifeline-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        tick_interval_ms = config.mover.tick_interval_ms,
        step_deg = config.mover.step_deg,
        assumed_speed_kmh = config.dispatch.assumed_speed_kmh,
        port = config.server.port,
        "configuration loaded"
    );

    // 3. Create the store and the change notifier.
    let store = Arc::new(MemoryStore::new());
    let notifier = ChangeNotifier::new();

    // 4. Seed the starting fleet.
    let seeding = load_seeding_config()?;
    let seeded = seeder::seed(&store, &seeding).await.map_err(EngineError::from)?;
    info!(
        hospitals = seeded.hospitals,
        ambulances = seeded.ambulances,
        cameras = seeded.cameras,
        "starting fleet ready"
    );

    // 5. Start the dispatch API server.
    let operator = Arc::new(OperatorState::new(config.mover.tick_interval_ms, 0));
    let app_state = Arc::new(AppState::with_operator(
        Arc::clone(&store),
        notifier.clone(),
        config.clone(),
        Arc::clone(&operator),
    ));

    let http_config = config.server.clone();
    let server_state = Arc::clone(&app_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = lifeline_api::start_server(&http_config, server_state).await {
            error!(error = %e, "dispatch server failed");
        }
    });

    // 6. Ctrl-C requests a clean stop: the loop finishes the tick in
    //    flight, then exits.
    let signal_operator = Arc::clone(&operator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, stopping after the current tick");
            signal_operator.request_stop();
        }
    });

    // 7. Run the movement loop to completion.
    let result = runner::run_mover(&store, &notifier, &config, &operator).await;

    // 8. Log results and shut down.
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_summary = ?result.final_summary,
        "movement loop ended"
    );

    server_handle.abort();
    info!("lifeline-engine shutdown complete");

    Ok(())
}

/// Load the main configuration from `lifeline-config.yaml`.
///
/// Looks for the config file relative to the current working directory;
/// defaults are used when it does not exist.
fn load_config() -> Result<LifelineConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = LifelineConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("config file not found, using defaults");
        Ok(LifelineConfig::default())
    }
}

/// Load seeding configuration from the `seeding` section of
/// `lifeline-config.yaml`.
///
/// If the file does not exist or lacks the `seeding` key, defaults are
/// used.
fn load_seeding_config() -> Result<SeedingConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        return Ok(SeedingConfig::default());
    }

    let contents =
        std::fs::read_to_string(config_path).map_err(|e| EngineError::SeedingConfig {
            message: format!("failed to read config file: {e}"),
        })?;

    // Parse the full YAML and extract just the "seeding" section.
    let raw: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| EngineError::SeedingConfig {
            message: format!("failed to parse config YAML: {e}"),
        })?;

    raw.get("seeding").map_or_else(
        || Ok(SeedingConfig::default()),
        |value| {
            serde_yml::from_value(value.clone()).map_err(|e| EngineError::SeedingConfig {
                message: format!("failed to parse seeding config: {e}"),
            })
        },
    )
}
