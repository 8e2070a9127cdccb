//! Typed rows yielded by the spatial store.
//!
//! The store does every geometry operation (proximity joins, containment,
//! area); these records carry its results. Geometry stays an opaque
//! `GeoJSON` string until the feature builder decodes it.

use rust_decimal::Decimal;
use wildfire_types::RiskTier;

/// An exposed entity already classified by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposureRow {
    /// Entity identifier, when the source carries one.
    pub id: Option<i64>,
    /// Risk tier assigned upstream.
    pub tier: RiskTier,
    /// `GeoJSON` geometry text (`ST_AsGeoJSON`), `None` when the store
    /// returned a null geometry.
    pub geometry: Option<String>,
}

/// An entity inside the inclusion radius, not yet classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityRow {
    /// Entity identifier.
    pub id: i64,
    /// Distance in meters to the nearest hazard polygon, `None` when no
    /// hazard polygon is in reach.
    pub distance_m: Option<f64>,
    /// `GeoJSON` geometry text.
    pub geometry: Option<String>,
}

/// Hectares at risk for one region or district.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRow {
    /// Region or district name.
    pub name: String,
    /// Hectares in the high grouping of hazard levels.
    pub high_ha: Decimal,
    /// Hectares in the moderate grouping of hazard levels.
    pub moderate_ha: Decimal,
    /// Hectares in the low grouping, when the level reports it.
    pub low_ha: Option<Decimal>,
    /// Hectares with no risk, when the level reports it.
    pub no_risk_ha: Option<Decimal>,
    /// `GeoJSON` geometry text.
    pub geometry: Option<String>,
}

/// A first-level boundary without statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryRow {
    /// Region name.
    pub name: String,
    /// `GeoJSON` geometry text.
    pub geometry: Option<String>,
}

/// One polygon of the hazard surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardRow {
    /// Raw `risk_level` (1..=4 for known levels).
    pub risk_level: i32,
    /// `GeoJSON` geometry text.
    pub geometry: Option<String>,
}
