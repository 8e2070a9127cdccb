//! Request dispatch: validate parameters, run the aggregators a request
//! needs, and compose the response.
//!
//! A request moves through [`Phase::Collecting`] (parameters are parsed and
//! validated, nothing touches the store) and [`Phase::Composing`] (one
//! store session is acquired and every aggregator runs in request order)
//! before ending in [`Phase::Succeeded`] or [`Phase::Failed`]. Any failure
//! aborts the whole request; there are no partial responses.

use geojson::{FeatureCollection, JsonObject};
use serde_json::Value;
use validator::{Validate, ValidationErrors};
use wildfire_types::{
    BoundaryAction, LayerKey, Locale, ProximityThresholds, RegionLevel, color_for_level,
};

use crate::classify::classify_rows;
use crate::compose::{AnalysisResponse, BoundaryResult, compose};
use crate::config::AnalysisConfig;
use crate::features::build;
use crate::layer::{LayerProfile, aggregate};
use crate::narrative::{NarrativeError, Narrator};
use crate::region::aggregate_regions;
use crate::store::{SpatialSession, SpatialStore, StoreError};

/// Largest accepted proximity threshold in meters.
pub const MAX_THRESHOLD_M: u32 = 100_000;

/// Errors that abort a request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The request parameters are missing or invalid.
    #[error("{0}")]
    Validation(String),

    /// The spatial store failed.
    #[error("data source error: {0}")]
    DataSource(StoreError),

    /// A narrative could not be rendered.
    #[error("narrative error: {0}")]
    Narrative(#[from] NarrativeError),
}

impl From<StoreError> for DispatchError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownDataset { region } => {
                Self::Validation(format!("no household data is available for region '{region}'"))
            }
            other => Self::DataSource(other),
        }
    }
}

/// Lifecycle of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Parsing and validating parameters.
    Collecting,
    /// Fetching rows and aggregating.
    Composing,
    /// The response was assembled.
    Succeeded,
    /// The request was aborted.
    Failed,
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Collecting => "collecting",
            Self::Composing => "composing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Decoded query string, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Wrap decoded `(key, value)` pairs.
    pub const fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value of `key`, treating an empty value as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// Every `layers` / `layers[]` value, in order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == "layers" || k == "layers[]")
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// A layer name as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedLayer {
    /// A layer this service computes.
    Known(LayerKey),
    /// Anything else.
    Unknown(String),
}

impl RequestedLayer {
    /// Classify a raw layer name.
    pub fn parse(name: &str) -> Self {
        LayerKey::parse(name).map_or_else(|| Self::Unknown(String::from(name)), Self::Known)
    }
}

/// Recognized layers in first-occurrence order without duplicates.
pub fn requested_layers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<LayerKey> {
    let mut layers = Vec::new();
    for name in names {
        match RequestedLayer::parse(name) {
            RequestedLayer::Known(key) if !layers.contains(&key) => layers.push(key),
            RequestedLayer::Known(key) => {
                tracing::debug!(layer = %key, "Ignored repeated layer");
            }
            RequestedLayer::Unknown(other) => {
                tracing::debug!(layer = %other, "Ignored unknown layer");
            }
        }
    }
    layers
}

#[derive(Debug, Validate)]
struct RequestInput {
    #[validate(length(min = 1, max = 128, message = "must be between 1 and 128 characters"))]
    region: Option<String>,
    #[validate(range(max = MAX_THRESHOLD_M, message = "must be at most 100000 meters"))]
    dist_high: u32,
    #[validate(range(max = MAX_THRESHOLD_M, message = "must be at most 100000 meters"))]
    dist_mod: u32,
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let reason = errs
                .iter()
                .find_map(|e| e.message.as_deref())
                .unwrap_or("is invalid");
            format!("{field} {reason}")
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

fn parse_distance(params: &QueryParams, key: &str, default: u32) -> Result<u32, DispatchError> {
    params.get(key).map_or(Ok(default), |raw| {
        raw.trim().parse::<u32>().map_err(|e| {
            DispatchError::Validation(format!(
                "{key} must be a non-negative integer, got '{raw}' ({e})"
            ))
        })
    })
}

fn parse_locale(params: &QueryParams, default: Locale) -> Locale {
    match params.get("lang") {
        None => default,
        Some(code) => Locale::parse(code).unwrap_or_else(|| {
            tracing::debug!(lang = code, "Unsupported language, using default");
            default
        }),
    }
}

/// Parameters shared by every plan.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Common {
    region: Option<String>,
    thresholds: ProximityThresholds,
    locale: Locale,
}

impl Common {
    fn collect(params: &QueryParams, config: &AnalysisConfig) -> Result<Self, DispatchError> {
        let defaults = config.default_thresholds();
        let input = RequestInput {
            region: params.get("region").map(String::from),
            dist_high: parse_distance(params, "dist_high", defaults.high_m)?,
            dist_mod: parse_distance(params, "dist_mod", defaults.moderate_m)?,
        };
        input
            .validate()
            .map_err(|e| DispatchError::Validation(validation_message(&e)))?;
        Ok(Self {
            region: input.region,
            thresholds: ProximityThresholds::new(input.dist_high, input.dist_mod),
            locale: parse_locale(params, config.default_locale),
        })
    }
}

fn require_region(region: Option<String>) -> Result<String, DispatchError> {
    region.ok_or_else(|| DispatchError::Validation(String::from("region is required")))
}

/// A validated analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPlan {
    /// Region to analyse.
    pub region: String,
    /// Recognized layers in request order.
    pub layers: Vec<LayerKey>,
    /// Proximity thresholds.
    pub thresholds: ProximityThresholds,
    /// Narrative language.
    pub locale: Locale,
}

impl AnalysisPlan {
    /// Validate the parameters of an analysis request.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Validation`] if the region is missing or a
    /// threshold is not a valid distance.
    pub fn collect(params: &QueryParams, config: &AnalysisConfig) -> Result<Self, DispatchError> {
        let common = Common::collect(params, config)?;
        Ok(Self {
            region: require_region(common.region)?,
            layers: requested_layers(params.layer_names()),
            thresholds: common.thresholds,
            locale: common.locale,
        })
    }
}

/// A validated boundary-only request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryPlan {
    /// Requested action.
    pub action: BoundaryAction,
    /// Region, required by every action but [`BoundaryAction::GetAdmin1`].
    pub region: Option<String>,
    /// Proximity thresholds for [`BoundaryAction::GetRiskHouseholds`].
    pub thresholds: ProximityThresholds,
    /// Narrative language.
    pub locale: Locale,
}

impl BoundaryPlan {
    /// Validate the parameters of a boundary request.
    ///
    /// Returns `Ok(None)` for an unrecognized action.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Validation`] if a required region is
    /// missing or a threshold is not a valid distance.
    pub fn collect(
        params: &QueryParams,
        config: &AnalysisConfig,
    ) -> Result<Option<Self>, DispatchError> {
        let action = match params.get("action") {
            None => BoundaryAction::GetAdmin1,
            Some(name) => match BoundaryAction::parse(name) {
                Some(action) => action,
                None => {
                    tracing::debug!(action = name, "Unknown boundary action");
                    return Ok(None);
                }
            },
        };
        let common = Common::collect(params, config)?;
        let region = match action {
            BoundaryAction::GetAdmin1 => common.region,
            BoundaryAction::GetAdmin2 | BoundaryAction::GetRiskHouseholds => {
                Some(require_region(common.region)?)
            }
        };
        Ok(Some(Self {
            action,
            region,
            thresholds: common.thresholds,
            locale: common.locale,
        }))
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Runs requests against a spatial store.
#[derive(Debug)]
pub struct Dispatcher<'a, S> {
    store: &'a S,
    config: &'a AnalysisConfig,
    narrator: &'a Narrator,
}

impl<'a, S: SpatialStore> Dispatcher<'a, S> {
    /// Create a dispatcher over shared state.
    pub const fn new(store: &'a S, config: &'a AnalysisConfig, narrator: &'a Narrator) -> Self {
        Self {
            store,
            config,
            narrator,
        }
    }

    /// Serve an analysis request: the region's boundary layer plus every
    /// requested layer.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] on invalid parameters, store failure, or
    /// narrative failure.
    pub async fn analysis(&self, params: &QueryParams) -> Result<AnalysisResponse, DispatchError> {
        tracing::debug!(phase = %Phase::Collecting, "Analysis request");
        let result = match AnalysisPlan::collect(params, self.config) {
            Ok(plan) => self.run_analysis(&plan).await,
            Err(e) => Err(e),
        };
        log_outcome("analysis", &result);
        result
    }

    async fn run_analysis(&self, plan: &AnalysisPlan) -> Result<AnalysisResponse, DispatchError> {
        tracing::debug!(
            phase = %Phase::Composing,
            region = %plan.region,
            layers = ?plan.layers,
            "Analysis plan validated"
        );
        let mut session = self.store.acquire().await?;

        let rows = session.admin1_exposure(&plan.region).await?;
        let boundary = aggregate_regions(
            RegionLevel::Admin1,
            &rows,
            Some(&plan.region),
            plan.locale,
            self.narrator,
        )?;

        let mut requested = Vec::with_capacity(plan.layers.len());
        for &key in &plan.layers {
            let rows = session
                .layer_exposure(key, &plan.region, plan.thresholds)
                .await?;
            let result = aggregate(
                &LayerProfile::for_layer(key),
                &rows,
                &plan.region,
                plan.locale,
                self.narrator,
            )?;
            requested.push((key, result));
        }

        Ok(compose(boundary, requested))
    }

    /// Serve a boundary-only request.
    ///
    /// Returns `Ok(None)` for an unrecognized action.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] on invalid parameters, store failure, or
    /// narrative failure.
    pub async fn boundary(
        &self,
        params: &QueryParams,
    ) -> Result<Option<BoundaryResult>, DispatchError> {
        tracing::debug!(phase = %Phase::Collecting, "Boundary request");
        let request = params.get("action").unwrap_or(BoundaryAction::GetAdmin1.as_str());
        let result = match BoundaryPlan::collect(params, self.config) {
            Ok(Some(plan)) => self.run_boundary(&plan).await.map(Some),
            Ok(None) => return Ok(None),
            Err(e) => Err(e),
        };
        log_outcome(request, &result);
        result
    }

    async fn run_boundary(&self, plan: &BoundaryPlan) -> Result<BoundaryResult, DispatchError> {
        tracing::debug!(
            phase = %Phase::Composing,
            action = plan.action.as_str(),
            region = ?plan.region,
            "Boundary plan validated"
        );
        let mut session = self.store.acquire().await?;
        let scope = plan.region.as_deref();

        match (plan.action, scope) {
            (BoundaryAction::GetAdmin1, Some(region)) => {
                let rows = session.admin1_exposure(region).await?;
                let result =
                    aggregate_regions(RegionLevel::Admin1, &rows, scope, plan.locale, self.narrator)?;
                Ok(BoundaryResult::Regions(result))
            }
            (BoundaryAction::GetAdmin1, None) => {
                let rows = session.admin1_overview().await?;
                let result =
                    aggregate_regions(RegionLevel::Overview, &rows, None, plan.locale, self.narrator)?;
                Ok(BoundaryResult::Regions(result))
            }
            (BoundaryAction::GetAdmin2, Some(region)) => {
                let rows = session.admin2_exposure(region).await?;
                let result =
                    aggregate_regions(RegionLevel::Admin2, &rows, scope, plan.locale, self.narrator)?;
                Ok(BoundaryResult::Regions(result))
            }
            (BoundaryAction::GetRiskHouseholds, Some(region)) => {
                let inclusion_m = self.config.inclusion_radius_m.max(plan.thresholds.widest());
                let rows = session.structure_proximity(region, inclusion_m).await?;
                let profile = LayerProfile::HOUSEHOLD_PROXIMITY;
                let rows = classify_rows(rows, plan.thresholds, profile.category);
                let result = aggregate(&profile, &rows, region, plan.locale, self.narrator)?;
                Ok(BoundaryResult::Households(result))
            }
            (BoundaryAction::GetAdmin2 | BoundaryAction::GetRiskHouseholds, None) => {
                Err(DispatchError::Validation(String::from("region is required")))
            }
        }
    }

    /// Every first-level boundary with its `Name`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DataSource`] on store failure.
    pub async fn boundaries(&self) -> Result<FeatureCollection, DispatchError> {
        let mut session = self.store.acquire().await?;
        let rows = session.boundaries().await?;
        let built = build(
            &rows,
            |row| row.geometry.as_deref(),
            |row| {
                let mut props = JsonObject::new();
                props.insert(String::from("Name"), Value::from(row.name.as_str()));
                props
            },
        );
        Ok(built.collection)
    }

    /// Every hazard polygon with its `risk_level` and display `color`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DataSource`] on store failure.
    pub async fn hazard_surface(&self) -> Result<FeatureCollection, DispatchError> {
        let mut session = self.store.acquire().await?;
        let rows = session.hazard_surface().await?;
        let built = build(
            &rows,
            |row| row.geometry.as_deref(),
            |row| {
                let mut props = JsonObject::new();
                props.insert(String::from("risk_level"), Value::from(row.risk_level));
                props.insert(String::from("color"), Value::from(color_for_level(row.risk_level)));
                props
            },
        );
        Ok(built.collection)
    }
}

fn log_outcome<T>(request: &str, result: &Result<T, DispatchError>) {
    match result {
        Ok(_) => tracing::debug!(phase = %Phase::Succeeded, request, "Request complete"),
        Err(e) => tracing::debug!(phase = %Phase::Failed, request, error = %e, "Request aborted"),
    }
}
