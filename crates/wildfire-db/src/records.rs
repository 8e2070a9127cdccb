//! Row structs decoded from the spatial queries.
//!
//! Each record maps one-to-one onto a query's select list and converts into
//! the core row type the aggregators consume.

use rust_decimal::Decimal;
use wildfire_core::rows::{BoundaryRow, ExposureRow, HazardRow, ProximityRow, RegionRow};
use wildfire_types::RiskTier;

/// Hectares per hazard grouping for one region or district.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegionRecord {
    /// Region or district name.
    pub name: String,
    /// High grouping, in hectares.
    pub high_risk_area_ha: Option<Decimal>,
    /// Moderate grouping, in hectares.
    pub moderate_risk_area_ha: Option<Decimal>,
    /// Low grouping, in hectares (only the four-level overview reports it).
    pub low_risk_area_ha: Option<Decimal>,
    /// No-risk grouping, in hectares.
    pub no_risk_area_ha: Option<Decimal>,
    /// `ST_AsGeoJSON` of the boundary.
    pub geom: Option<String>,
}

impl From<RegionRecord> for RegionRow {
    fn from(r: RegionRecord) -> Self {
        Self {
            name: r.name,
            high_ha: r.high_risk_area_ha.unwrap_or_default(),
            moderate_ha: r.moderate_risk_area_ha.unwrap_or_default(),
            low_ha: r.low_risk_area_ha,
            no_risk_ha: r.no_risk_area_ha,
            geometry: r.geom,
        }
    }
}

/// An entity classified by a layer function.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExposureRecord {
    /// `risk_class` label (`High`, `Moderate`, `Low`, `No risk`).
    pub risk_class: Option<String>,
    /// `ST_AsGeoJSON` of the entity.
    pub geom: Option<String>,
}

/// Tier of a `risk_class` label. A missing label means no risk; an
/// unrecognized one is logged and counted as low.
fn tier_for_class(label: Option<&str>) -> RiskTier {
    let Some(label) = label else {
        return RiskTier::None;
    };
    RiskTier::parse_class(label).unwrap_or_else(|| {
        tracing::debug!(risk_class = label, "Unrecognized risk class, counted as low");
        RiskTier::Low
    })
}

impl From<ExposureRecord> for ExposureRow {
    fn from(r: ExposureRecord) -> Self {
        Self {
            id: None,
            tier: tier_for_class(r.risk_class.as_deref()),
            geometry: r.geom,
        }
    }
}

/// A household inside the inclusion radius.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProximityRecord {
    /// Household id.
    pub id: i64,
    /// Distance in meters to the nearest hazard polygon.
    pub distance_m: Option<f64>,
    /// `ST_AsGeoJSON` of the household.
    pub geom: Option<String>,
}

impl From<ProximityRecord> for ProximityRow {
    fn from(r: ProximityRecord) -> Self {
        Self {
            id: r.id,
            distance_m: r.distance_m,
            geometry: r.geom,
        }
    }
}

/// A first-level boundary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoundaryRecord {
    /// Region name.
    pub name: String,
    /// `ST_AsGeoJSON` of the boundary.
    pub geom: Option<String>,
}

impl From<BoundaryRecord> for BoundaryRow {
    fn from(r: BoundaryRecord) -> Self {
        Self {
            name: r.name,
            geometry: r.geom,
        }
    }
}

/// One hazard polygon.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HazardRecord {
    /// Hazard level.
    pub risk_level: i32,
    /// `ST_AsGeoJSON` of the polygon.
    pub geom: Option<String>,
}

impl From<HazardRecord> for HazardRow {
    fn from(r: HazardRecord) -> Self {
        Self {
            risk_level: r.risk_level,
            geometry: r.geom,
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn null_hectares_become_zero() {
        let row: RegionRow = RegionRecord {
            name: String::from("Filadelfia"),
            high_risk_area_ha: None,
            moderate_risk_area_ha: Some(Decimal::new(12, 0)),
            low_risk_area_ha: None,
            no_risk_area_ha: None,
            geom: None,
        }
        .into();
        assert_eq!(row.high_ha, Decimal::ZERO);
        assert_eq!(row.moderate_ha, Decimal::new(12, 0));
        assert_eq!(row.low_ha, None);
    }

    #[test]
    fn risk_class_labels_map_to_tiers() {
        let classify = |label: Option<&str>| {
            ExposureRow::from(ExposureRecord {
                risk_class: label.map(String::from),
                geom: None,
            })
            .tier
        };
        assert_eq!(classify(Some("High")), RiskTier::High);
        assert_eq!(classify(Some("Moderate")), RiskTier::Moderate);
        assert_eq!(classify(Some("Low")), RiskTier::Low);
        assert_eq!(classify(Some("No risk")), RiskTier::None);
        assert_eq!(classify(None), RiskTier::None);
    }

    #[test]
    #[traced_test]
    fn unrecognized_risk_class_counts_as_low() {
        assert_eq!(tier_for_class(Some("Extreme")), RiskTier::Low);
        assert!(logs_contain("Unrecognized risk class"));
        assert!(logs_contain("Extreme"));
        assert_eq!(tier_for_class(Some("")), RiskTier::Low);
        assert_eq!(tier_for_class(Some(" Moderate ")), RiskTier::Moderate);
    }
}
