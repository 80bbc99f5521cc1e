//! Error types for the engine binary.

use lifeline_core::config::ConfigError;
use lifeline_store::StoreError;

/// Errors that can occur during engine startup or shutdown.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Seeding the store failed.
    #[error("seeder error: {source}")]
    Seeder {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The seeding section of the config file could not be parsed.
    #[error("seeding config error: {message}")]
    SeedingConfig {
        /// Description of the error.
        message: String,
    },
}
