//! REST API endpoint handlers.
//!
//! Handlers decode the query string, hand it to a
//! [`Dispatcher`](wildfire_core::dispatch::Dispatcher) built from the
//! shared [`AppState`], and serialize the result. Every failure is an
//! [`ApiError`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/analysis` | Region boundary plus requested exposure layers |
//! | `GET` | `/api/boundaries` | Boundary-only actions (`get_admin1`, `get_admin2`, `get_risk_households`) |
//! | `GET` | `/api/admin` | First-level administrative boundaries |
//! | `GET` | `/api/risk-surface` | Hazard polygons with display colors |
//! | `GET` | `/api/map-config` | Map client token |
//! | `GET` | `/health` | Liveness probe |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use geojson::FeatureCollection;
use wildfire_core::compose::AnalysisResponse;
use wildfire_core::dispatch::QueryParams;
use wildfire_core::store::SpatialStore;

use crate::error::{ApiError, MAP_CONFIG_MESSAGE};
use crate::state::AppState;

/// Raw query pairs in request order. Repeated keys are kept.
type RawQuery = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn params(query: RawQuery) -> Result<QueryParams, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::BadQuery(e.body_text()))?;
    Ok(QueryParams::from_pairs(pairs))
}

// ---------------------------------------------------------------------------
// GET /api/analysis
// ---------------------------------------------------------------------------

/// Analyse one region: its boundary layer plus every requested layer.
pub async fn analysis<S: SpatialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: RawQuery,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let params = params(query)?;
    let response = state.dispatcher().analysis(&params).await?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// GET /api/boundaries
// ---------------------------------------------------------------------------

/// Serve a boundary-only action.
///
/// An unrecognized `action` gets an empty `204 No Content`.
pub async fn boundaries<S: SpatialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: RawQuery,
) -> Result<Response, ApiError> {
    let params = params(query)?;
    match state.dispatcher().boundary(&params).await? {
        Some(result) => Ok(Json(result).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// ---------------------------------------------------------------------------
// GET /api/admin, GET /api/risk-surface
// ---------------------------------------------------------------------------

/// Every first-level administrative boundary.
pub async fn admin<S: SpatialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<FeatureCollection>, ApiError> {
    Ok(Json(state.dispatcher().boundaries().await?))
}

/// Every hazard polygon.
pub async fn risk_surface<S: SpatialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<FeatureCollection>, ApiError> {
    Ok(Json(state.dispatcher().hazard_surface().await?))
}

// ---------------------------------------------------------------------------
// GET /api/map-config
// ---------------------------------------------------------------------------

/// Token the map client needs to load its base tiles.
pub async fn map_config<S: SpatialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.config.map.mapbox_token.as_deref() {
        Some(token) if !token.is_empty() => Ok(Json(serde_json::json!({ "mapboxToken": token }))),
        _ => Err(ApiError::Configuration(String::from(MAP_CONFIG_MESSAGE))),
    }
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
