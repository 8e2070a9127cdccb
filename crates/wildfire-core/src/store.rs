//! The spatial store seam.
//!
//! All geometry work (proximity joins, containment, area) happens behind
//! [`SpatialSession`]. The `PostGIS` implementation lives in `wildfire-db`;
//! [`MemoryStore`] serves fixed rows for tests and local runs.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wildfire_types::{LayerKey, ProximityThresholds};

use crate::rows::{BoundaryRow, ExposureRow, HazardRow, ProximityRow, RegionRow};

/// Errors raised by a spatial store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No session could be obtained.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A query failed while executing.
    #[error("query failed: {0}")]
    Query(String),

    /// The region has no household dataset configured.
    #[error("no household dataset for region '{region}'")]
    UnknownDataset {
        /// Requested region.
        region: String,
    },
}

/// A source of sessions.
pub trait SpatialStore: Send + Sync {
    /// Session type handed out per request.
    type Session: SpatialSession + Send;

    /// Acquire a session. It is released when dropped.
    fn acquire(&self) -> impl Future<Output = Result<Self::Session, StoreError>> + Send;
}

/// Queries available within one session.
pub trait SpatialSession {
    /// Hectares per hazard grouping for the first-level region `region`.
    /// Levels 4 and 3 are grouped as high, 2 as moderate.
    fn admin1_exposure(
        &mut self,
        region: &str,
    ) -> impl Future<Output = Result<Vec<RegionRow>, StoreError>> + Send;

    /// Hectares of every first-level region, one tier per hazard level:
    /// 4 high, 3 moderate, 2 low, 1 no risk.
    fn admin1_overview(&mut self) -> impl Future<Output = Result<Vec<RegionRow>, StoreError>> + Send;

    /// Hectares per hazard grouping for the districts of `region`.
    fn admin2_exposure(
        &mut self,
        region: &str,
    ) -> impl Future<Output = Result<Vec<RegionRow>, StoreError>> + Send;

    /// Entities of an analysis layer in `region`, classified with
    /// `thresholds`.
    fn layer_exposure(
        &mut self,
        layer: LayerKey,
        region: &str,
        thresholds: ProximityThresholds,
    ) -> impl Future<Output = Result<Vec<ExposureRow>, StoreError>> + Send;

    /// Households of `region` within `inclusion_m` of the hazard surface,
    /// with their distance to it.
    fn structure_proximity(
        &mut self,
        region: &str,
        inclusion_m: u32,
    ) -> impl Future<Output = Result<Vec<ProximityRow>, StoreError>> + Send;

    /// Every first-level boundary.
    fn boundaries(&mut self) -> impl Future<Output = Result<Vec<BoundaryRow>, StoreError>> + Send;

    /// Every hazard polygon.
    fn hazard_surface(&mut self) -> impl Future<Output = Result<Vec<HazardRow>, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A query issued against a [`MemoryStore`] session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `admin1_exposure`.
    Admin1(String),
    /// `admin1_overview`.
    Admin1Overview,
    /// `admin2_exposure`.
    Admin2(String),
    /// `layer_exposure`.
    Layer(LayerKey, String, ProximityThresholds),
    /// `structure_proximity`.
    Proximity(String, u32),
    /// `boundaries`.
    Boundaries,
    /// `hazard_surface`.
    HazardSurface,
}

#[derive(Debug, Clone, Default)]
struct MemoryData {
    admin1: Vec<RegionRow>,
    overview: Vec<RegionRow>,
    admin2: HashMap<String, Vec<RegionRow>>,
    layers: HashMap<(LayerKey, String), Vec<ExposureRow>>,
    proximity: HashMap<String, Vec<ProximityRow>>,
    household_regions: HashSet<String>,
    boundaries: Vec<BoundaryRow>,
    hazard: Vec<HazardRow>,
    fail_acquire: bool,
    fail_layers: HashSet<LayerKey>,
}

/// A store backed by fixed rows.
///
/// Rows are registered with the `with_*` builders. Every session records
/// the queries it runs, and the store counts open sessions so callers can
/// check that sessions are released.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<MemoryData>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    open: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn data_mut(&mut self) -> &mut MemoryData {
        Arc::make_mut(&mut self.data)
    }

    /// Register first-level region rows, served one region at a time.
    #[must_use]
    pub fn with_admin1(mut self, rows: Vec<RegionRow>) -> Self {
        self.data_mut().admin1 = rows;
        self
    }

    /// Register the four-level rows of the all-region overview.
    #[must_use]
    pub fn with_overview(mut self, rows: Vec<RegionRow>) -> Self {
        self.data_mut().overview = rows;
        self
    }

    /// Register the district rows of `region`.
    #[must_use]
    pub fn with_admin2(mut self, region: &str, rows: Vec<RegionRow>) -> Self {
        self.data_mut().admin2.insert(String::from(region), rows);
        self
    }

    /// Register the classified rows of a layer in `region`.
    ///
    /// Registering the households layer also makes `region` a region with a
    /// household dataset.
    #[must_use]
    pub fn with_layer(mut self, layer: LayerKey, region: &str, rows: Vec<ExposureRow>) -> Self {
        let data = self.data_mut();
        if layer == LayerKey::Households {
            data.household_regions.insert(String::from(region));
        }
        data.layers.insert((layer, String::from(region)), rows);
        self
    }

    /// Register the household proximity rows of `region`.
    #[must_use]
    pub fn with_proximity(mut self, region: &str, rows: Vec<ProximityRow>) -> Self {
        let data = self.data_mut();
        data.household_regions.insert(String::from(region));
        data.proximity.insert(String::from(region), rows);
        self
    }

    /// Register the boundary rows.
    #[must_use]
    pub fn with_boundaries(mut self, rows: Vec<BoundaryRow>) -> Self {
        self.data_mut().boundaries = rows;
        self
    }

    /// Register the hazard surface.
    #[must_use]
    pub fn with_hazard(mut self, rows: Vec<HazardRow>) -> Self {
        self.data_mut().hazard = rows;
        self
    }

    /// Make every `acquire` fail.
    #[must_use]
    pub fn failing_acquire(mut self) -> Self {
        self.data_mut().fail_acquire = true;
        self
    }

    /// Make queries for `layer` fail.
    #[must_use]
    pub fn failing_layer(mut self, layer: LayerKey) -> Self {
        self.data_mut().fail_layers.insert(layer);
        self
    }

    /// Queries issued so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Sessions currently held.
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl SpatialStore for MemoryStore {
    type Session = MemorySession;

    async fn acquire(&self) -> Result<MemorySession, StoreError> {
        if self.data.fail_acquire {
            return Err(StoreError::Unavailable(String::from("memory store offline")));
        }
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            data: Arc::clone(&self.data),
            calls: Arc::clone(&self.calls),
            open: Arc::clone(&self.open),
        })
    }
}

/// A session over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySession {
    data: Arc<MemoryData>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    open: Arc<AtomicUsize>,
}

impl MemorySession {
    fn record(&self, call: StoreCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn require_households(&self, region: &str) -> Result<(), StoreError> {
        if self.data.household_regions.contains(region) {
            Ok(())
        } else {
            Err(StoreError::UnknownDataset {
                region: String::from(region),
            })
        }
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SpatialSession for MemorySession {
    async fn admin1_exposure(&mut self, region: &str) -> Result<Vec<RegionRow>, StoreError> {
        self.record(StoreCall::Admin1(String::from(region)));
        Ok(self
            .data
            .admin1
            .iter()
            .filter(|row| row.name == region)
            .cloned()
            .collect())
    }

    async fn admin1_overview(&mut self) -> Result<Vec<RegionRow>, StoreError> {
        self.record(StoreCall::Admin1Overview);
        Ok(self.data.overview.clone())
    }

    async fn admin2_exposure(&mut self, region: &str) -> Result<Vec<RegionRow>, StoreError> {
        self.record(StoreCall::Admin2(String::from(region)));
        Ok(self.data.admin2.get(region).cloned().unwrap_or_default())
    }

    async fn layer_exposure(
        &mut self,
        layer: LayerKey,
        region: &str,
        thresholds: ProximityThresholds,
    ) -> Result<Vec<ExposureRow>, StoreError> {
        self.record(StoreCall::Layer(layer, String::from(region), thresholds));
        if self.data.fail_layers.contains(&layer) {
            return Err(StoreError::Query(format!("{layer} query failed")));
        }
        if layer == LayerKey::Households {
            self.require_households(region)?;
        }
        Ok(self
            .data
            .layers
            .get(&(layer, String::from(region)))
            .cloned()
            .unwrap_or_default())
    }

    async fn structure_proximity(
        &mut self,
        region: &str,
        inclusion_m: u32,
    ) -> Result<Vec<ProximityRow>, StoreError> {
        self.record(StoreCall::Proximity(String::from(region), inclusion_m));
        if self.data.fail_layers.contains(&LayerKey::Households) {
            return Err(StoreError::Query(String::from("household proximity query failed")));
        }
        self.require_households(region)?;
        Ok(self.data.proximity.get(region).cloned().unwrap_or_default())
    }

    async fn boundaries(&mut self) -> Result<Vec<BoundaryRow>, StoreError> {
        self.record(StoreCall::Boundaries);
        Ok(self.data.boundaries.clone())
    }

    async fn hazard_surface(&mut self) -> Result<Vec<HazardRow>, StoreError> {
        self.record(StoreCall::HazardSurface);
        Ok(self.data.hazard.clone())
    }
}
