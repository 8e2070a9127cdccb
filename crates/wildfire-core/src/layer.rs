//! Layer aggregation for exposed-entity categories.
//!
//! A single aggregator serves every entity layer. What differs between
//! households, communities, and protected areas is captured by a
//! [`LayerProfile`]: the category, the narrative template, the properties
//! written on each feature, and the tier counted as "at risk".

use geojson::JsonObject;
use serde_json::Value;
use wildfire_types::{EntityCategory, LayerKey, LayerSummary, Locale, RiskTier};

use crate::compose::LayerResult;
use crate::features::FeatureCollectionBuilder;
use crate::narrative::{LayerNarrative, NarrativeError, Narrator, Template};
use crate::rows::ExposureRow;
use crate::stats::{TierCounts, percentage};

/// Per-layer configuration of the generic aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerProfile {
    /// Name used in log fields.
    pub name: &'static str,
    /// Category of the entities in this layer.
    pub category: EntityCategory,
    /// Narrative template.
    pub template: Template,
    /// Tier counted in the headline figure and the percentage.
    pub at_risk: RiskTier,
    /// Whether features carry the entity `id`.
    pub include_id: bool,
}

impl LayerProfile {
    /// Households classified by proximity (boundary endpoint).
    pub const HOUSEHOLD_PROXIMITY: Self = Self {
        name: "household_proximity",
        category: EntityCategory::Structure,
        template: Template::HouseholdProximity,
        at_risk: RiskTier::High,
        include_id: true,
    };

    /// Profile of an analysis layer.
    pub const fn for_layer(key: LayerKey) -> Self {
        let template = match key {
            LayerKey::Households => Template::Households,
            LayerKey::Indigenous => Template::Indigenous,
            LayerKey::ProtectedAreas => Template::ProtectedAreas,
        };
        Self {
            name: key.as_str(),
            category: key.category(),
            template,
            at_risk: RiskTier::High,
            include_id: false,
        }
    }

    /// Feature properties of one row.
    pub fn properties(&self, row: &ExposureRow) -> JsonObject {
        let mut props = JsonObject::new();
        if self.include_id {
            props.insert(String::from("id"), row.id.map_or(Value::Null, Value::from));
        }
        props.insert(String::from("risk_class"), Value::from(row.tier.label()));
        props.insert(String::from("color"), Value::from(row.tier.color()));
        props
    }
}

/// Numbers derived from one layer pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStats {
    /// Per-tier counts.
    pub counts: TierCounts,
    /// Count in the profile's at-risk tier.
    pub at_risk: u64,
    /// Every row processed.
    pub total: u64,
    /// `at_risk / total * 100`, 0 when `total` is 0.
    pub percent_at_risk: f64,
}

impl LayerStats {
    /// Derive the layer statistics from tier counts.
    pub fn from_counts(counts: TierCounts, at_risk_tier: RiskTier) -> Self {
        let at_risk = counts.get(at_risk_tier);
        let total = counts.total();
        Self {
            counts,
            at_risk,
            total,
            percent_at_risk: percentage(at_risk, total),
        }
    }
}

/// Aggregate one layer in a single pass over its rows.
///
/// # Errors
///
/// Returns [`NarrativeError`] if the summary narrative cannot be rendered.
pub fn aggregate(
    profile: &LayerProfile,
    rows: &[ExposureRow],
    region: &str,
    locale: Locale,
    narrator: &Narrator,
) -> Result<LayerResult<LayerSummary>, NarrativeError> {
    let mut counts = TierCounts::default();
    let mut builder = FeatureCollectionBuilder::with_capacity(rows.len());

    for row in rows {
        counts.record(row.tier);
        if let Err(e) = builder.push(row.geometry.as_deref(), profile.properties(row)) {
            tracing::debug!(
                layer = profile.name,
                id = ?row.id,
                error = %e,
                "Dropped row with unreadable geometry"
            );
        }
    }

    let built = builder.finish();
    let stats = LayerStats::from_counts(counts, profile.at_risk);
    let content = narrator.render_layer(
        locale,
        profile.template,
        &LayerNarrative {
            region,
            high_count: stats.at_risk,
            moderate_count: counts.moderate,
            total: stats.total,
            percent: stats.percent_at_risk,
        },
    )?;

    tracing::debug!(
        layer = profile.name,
        region,
        total = stats.total,
        at_risk = stats.at_risk,
        dropped = built.dropped,
        "Aggregated layer"
    );

    Ok(LayerResult {
        summary: LayerSummary {
            content,
            high_risk_count: counts.high,
            moderate_risk_count: counts.moderate,
            low_risk_count: counts.low,
            no_risk_count: counts.none,
            total_count: stats.total,
            percent_at_risk: stats.percent_at_risk,
            dropped_rows: built.dropped,
        },
        geojson: built.collection,
    })
}
