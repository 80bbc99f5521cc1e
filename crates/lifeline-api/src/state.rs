//! Shared application state for the dispatch API server.
//!
//! [`AppState`] bundles the entity store, the change notifier, the
//! effective configuration, and (when the mover loop is running in this
//! process) the operator control state. Handlers read live state
//! directly from the store; the `WebSocket` endpoint subscribes to the
//! notifier.

use std::sync::Arc;

use lifeline_core::config::LifelineConfig;
use lifeline_core::notify::ChangeNotifier;
use lifeline_core::operator::OperatorState;
use lifeline_store::MemoryStore;
use lifeline_types::StateChange;
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The live entity store.
    pub store: Arc<MemoryStore>,
    /// Fan-out broadcaster for entity state changes.
    pub notifier: ChangeNotifier,
    /// Effective configuration for this process.
    pub config: LifelineConfig,
    /// Shared operator control state (present when the mover loop runs
    /// in this process).
    pub operator: Option<Arc<OperatorState>>,
}

impl AppState {
    /// Create an application state without operator controls.
    pub fn new(store: Arc<MemoryStore>, notifier: ChangeNotifier, config: LifelineConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            operator: None,
        }
    }

    /// Create an application state with operator controls attached.
    pub fn with_operator(
        store: Arc<MemoryStore>,
        notifier: ChangeNotifier,
        config: LifelineConfig,
        operator: Arc<OperatorState>,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
            operator: Some(operator),
        }
    }

    /// Subscribe to the live change stream.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.notifier.subscribe()
    }
}
