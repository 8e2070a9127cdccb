//! Integration tests for the `wildfire-db` data layer.
//!
//! These tests require a live `PostGIS` database loaded with the Chaco
//! boundaries, districts, hazard surface, household tables, and the
//! `get_*_risk` functions. Run with:
//!
//! ```bash
//! export DATABASE_URL=postgresql://postgres@localhost:5432/chaco
//! cargo test -p wildfire-db -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use wildfire_core::config::{DatabaseConfig, HouseholdsConfig};
use wildfire_core::store::{SpatialSession, SpatialStore, StoreError};
use wildfire_db::{PgStore, PostgresConfig, PostgresPool};
use wildfire_types::{LayerKey, ProximityThresholds};

/// Fallback connection URL for a local database.
const POSTGRES_URL: &str = "postgresql://postgres@localhost:5432/chaco";

async fn setup_store() -> PgStore {
    let settings = DatabaseConfig {
        url: std::env::var("DATABASE_URL").unwrap_or_else(|_| String::from(POSTGRES_URL)),
        max_connections: 2,
        ..DatabaseConfig::default()
    };
    let config = PostgresConfig::from_settings(&settings).expect("valid DATABASE_URL");
    let pool = PostgresPool::connect(&config)
        .await
        .expect("Failed to connect to PostGIS -- is the database running?");
    PgStore::new(pool, HouseholdsConfig::default())
}

fn is_geojson(text: Option<&str>) -> bool {
    text.and_then(|t| serde_json::from_str::<serde_json::Value>(t).ok())
        .is_some_and(|v| v.get("type").is_some())
}

#[tokio::test]
#[ignore = "requires live PostGIS database"]
async fn boundaries_are_named_and_have_geometry() {
    let store = setup_store().await;
    let mut session = store.acquire().await.expect("acquire");
    let rows = session.boundaries().await.expect("boundaries");
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| !r.name.is_empty()));
    assert!(rows.iter().all(|r| is_geojson(r.geometry.as_deref())));
}

#[tokio::test]
#[ignore = "requires live PostGIS database"]
async fn admin1_exposure_filters_by_region() {
    let store = setup_store().await;
    let mut session = store.acquire().await.expect("acquire");
    let one = session.admin1_exposure("Boqueron").await.expect("one region");
    assert!(one.len() <= 1);
    assert!(one.iter().all(|r| r.name == "Boqueron"));
    assert!(one.iter().all(|r| r.low_ha.is_none() && r.no_risk_ha.is_some()));
}

#[tokio::test]
#[ignore = "requires live PostGIS database"]
async fn admin1_overview_reports_four_tiers() {
    let store = setup_store().await;
    let mut session = store.acquire().await.expect("acquire");
    let all = session.admin1_overview().await.expect("overview");
    assert!(!all.is_empty());
    assert!(all.iter().all(|r| r.low_ha.is_some() && r.no_risk_ha.is_some()));
    assert!(all.windows(2).all(|w| w[0].name <= w[1].name));
}

#[tokio::test]
#[ignore = "requires live PostGIS database"]
async fn admin2_exposure_reports_high_and_moderate_only() {
    let store = setup_store().await;
    let mut session = store.acquire().await.expect("acquire");
    let rows = session.admin2_exposure("Boqueron").await.expect("districts");
    assert!(rows.iter().all(|r| r.low_ha.is_none() && r.no_risk_ha.is_none()));
}

#[tokio::test]
#[ignore = "requires live PostGIS database"]
async fn layer_functions_return_known_tiers() {
    let store = setup_store().await;
    let mut session = store.acquire().await.expect("acquire");
    let thresholds = ProximityThresholds::new(500, 1000);
    for layer in LayerKey::ALL {
        let rows = session
            .layer_exposure(layer, "Boqueron", thresholds)
            .await
            .expect("layer query");
        assert!(rows.iter().all(|r| is_geojson(r.geometry.as_deref())));
        assert!(rows.iter().all(|r| r.id.is_none()));
    }
}

#[tokio::test]
#[ignore = "requires live PostGIS database"]
async fn proximity_distances_stay_inside_radius() {
    let store = setup_store().await;
    let mut session = store.acquire().await.expect("acquire");
    let rows = session
        .structure_proximity("Boqueron", 1000)
        .await
        .expect("proximity");
    assert!(
        rows.iter()
            .filter_map(|r| r.distance_m)
            .all(|d| (0.0..=1000.0 + 1e-6).contains(&d))
    );
    let mut ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), rows.len());
}

#[tokio::test]
#[ignore = "requires live PostGIS database"]
async fn unknown_household_region_is_reported() {
    let store = setup_store().await;
    let mut session = store.acquire().await.expect("acquire");
    let err = session.structure_proximity("Atlantis", 1000).await.unwrap_err();
    assert!(matches!(err, StoreError::UnknownDataset { .. }));
}

#[tokio::test]
#[ignore = "requires live PostGIS database"]
async fn hazard_levels_are_in_range() {
    let store = setup_store().await;
    let mut session = store.acquire().await.expect("acquire");
    let rows = session.hazard_surface().await.expect("hazard surface");
    assert!(rows.iter().all(|r| (1..=4).contains(&r.risk_level)));
}
