//! Structs shared between the aggregation core, the API, and the map client.
//!
//! Summaries are the numeric half of every layer in the response envelope.
//! They serialize with the field names the map client reads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Proximity thresholds
// ---------------------------------------------------------------------------

/// Caller-supplied distances (meters) used to bucket entities into tiers.
///
/// Entities within `high_m` of the hazard surface are high risk; entities
/// within `moderate_m` are moderate risk. When both match, high wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProximityThresholds {
    /// High-risk distance in meters.
    pub high_m: u32,
    /// Moderate-risk distance in meters.
    pub moderate_m: u32,
}

impl ProximityThresholds {
    /// Create a threshold pair.
    pub const fn new(high_m: u32, moderate_m: u32) -> Self {
        Self { high_m, moderate_m }
    }

    /// The wider of the two thresholds.
    pub const fn widest(self) -> u32 {
        if self.high_m > self.moderate_m {
            self.high_m
        } else {
            self.moderate_m
        }
    }
}

// ---------------------------------------------------------------------------
// Layer summary
// ---------------------------------------------------------------------------

/// Summary of one entity layer (households, communities, protected areas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LayerSummary {
    /// HTML narrative for the side pane.
    pub content: String,
    /// Entities in the high tier.
    pub high_risk_count: u64,
    /// Entities in the moderate tier.
    pub moderate_risk_count: u64,
    /// Entities in the low tier.
    pub low_risk_count: u64,
    /// Entities with no hazard in reach.
    pub no_risk_count: u64,
    /// Every row processed, including rows whose geometry was dropped.
    pub total_count: u64,
    /// Share of `total_count` in the at-risk tier, 0 when nothing was found.
    pub percent_at_risk: f64,
    /// Rows left out of the feature collection because their geometry
    /// could not be decoded.
    pub dropped_rows: u64,
}

// ---------------------------------------------------------------------------
// Region summary
// ---------------------------------------------------------------------------

/// Summary of an administrative aggregation (regions or districts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegionSummary {
    /// HTML narrative for the leading region.
    pub content: String,
    /// High-risk hectares summed over every row.
    #[ts(as = "String")]
    pub total_risk_ha: Decimal,
    /// Name of the region with the most high-risk hectares.
    pub top_region_name: Option<String>,
    /// High-risk hectares of the leading region.
    #[ts(as = "String")]
    pub top_region_val: Decimal,
    /// The leading region's share of `total_risk_ha`, 0 when the total is 0.
    pub max_percent: f64,
    /// Number of region rows processed.
    pub region_count: u64,
    /// Rows left out of the feature collection because their geometry
    /// could not be decoded.
    pub dropped_rows: u64,
}
