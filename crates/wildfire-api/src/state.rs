//! Shared application state for the API server.
//!
//! [`AppState`] owns the spatial store handle, the loaded configuration,
//! and the narrative renderer. Handlers borrow all three per request; no
//! connection lives outside the store.

use wildfire_core::config::AppConfig;
use wildfire_core::dispatch::Dispatcher;
use wildfire_core::narrative::Narrator;
use wildfire_core::store::SpatialStore;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug)]
pub struct AppState<S> {
    /// Spatial store every request draws its session from.
    pub store: S,
    /// Loaded configuration.
    pub config: AppConfig,
    /// Compiled narrative templates.
    pub narrator: Narrator,
}

impl<S: SpatialStore> AppState<S> {
    /// Create the state from its parts.
    pub const fn new(store: S, config: AppConfig, narrator: Narrator) -> Self {
        Self {
            store,
            config,
            narrator,
        }
    }

    /// A dispatcher borrowing this state.
    pub const fn dispatcher(&self) -> Dispatcher<'_, S> {
        Dispatcher::new(&self.store, &self.config.analysis, &self.narrator)
    }
}
