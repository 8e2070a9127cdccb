//! Response envelope assembly.
//!
//! The analysis response is a JSON object keyed by layer name. The boundary
//! layer is always present under `admin1` and always serialized first;
//! requested layers follow in request order.

use geojson::FeatureCollection;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use wildfire_types::{LayerKey, LayerSummary, RegionSummary};

/// Response key of the boundary layer.
pub const BOUNDARY_KEY: &str = "admin1";

/// One layer of a response: the summary plus its map features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerResult<S> {
    /// Narrative and numeric fields.
    pub summary: S,
    /// Features in aggregation order.
    pub geojson: FeatureCollection,
}

/// Body of the boundary-only endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoundaryResult {
    /// Hectares per region or district.
    Regions(LayerResult<RegionSummary>),
    /// Households classified by proximity.
    Households(LayerResult<LayerSummary>),
}

/// The multi-layer analysis envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    boundary: LayerResult<RegionSummary>,
    layers: Vec<(LayerKey, LayerResult<LayerSummary>)>,
}

impl AnalysisResponse {
    /// The boundary layer.
    pub const fn boundary(&self) -> &LayerResult<RegionSummary> {
        &self.boundary
    }

    /// A requested layer, if it was requested.
    pub fn layer(&self, key: LayerKey) -> Option<&LayerResult<LayerSummary>> {
        self.layers
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, result)| result)
    }

    /// Response keys in serialization order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        core::iter::once(BOUNDARY_KEY).chain(self.layers.iter().map(|(k, _)| k.as_str()))
    }
}

impl Serialize for AnalysisResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.layers.len().saturating_add(1)))?;
        map.serialize_entry(BOUNDARY_KEY, &self.boundary)?;
        for (key, result) in &self.layers {
            map.serialize_entry(key.as_str(), result)?;
        }
        map.end()
    }
}

/// Assemble the envelope from already computed layer results.
///
/// A layer key appearing twice keeps its first result.
pub fn compose(
    boundary: LayerResult<RegionSummary>,
    requested: Vec<(LayerKey, LayerResult<LayerSummary>)>,
) -> AnalysisResponse {
    let mut layers: Vec<(LayerKey, LayerResult<LayerSummary>)> = Vec::with_capacity(requested.len());
    for (key, result) in requested {
        if layers.iter().any(|(k, _)| *k == key) {
            tracing::debug!(layer = %key, "Ignored duplicate layer result");
            continue;
        }
        layers.push((key, result));
    }
    AnalysisResponse { boundary, layers }
}
