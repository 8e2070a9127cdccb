//! Axum router construction for the API.
//!
//! Assembles all routes into a single [`Router`] with CORS enabled for the
//! map client and HTTP request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wildfire_core::store::SpatialStore;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /api/analysis` -- boundary plus requested layers for a region
/// - `GET /api/boundaries` -- boundary-only actions
/// - `GET /api/admin` -- administrative boundaries
/// - `GET /api/risk-surface` -- hazard polygons
/// - `GET /api/map-config` -- map client token
/// - `GET /health` -- liveness probe
pub fn build_router<S: SpatialStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analysis", get(handlers::analysis::<S>))
        .route("/api/boundaries", get(handlers::boundaries::<S>))
        .route("/api/admin", get(handlers::admin::<S>))
        .route("/api/risk-surface", get(handlers::risk_surface::<S>))
        .route("/api/map-config", get(handlers::map_config::<S>))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
