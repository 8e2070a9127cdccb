//! Region aggregation: hectares at risk per region or district.
//!
//! Rows arrive with hectares already split by hazard grouping. [`rank`] sums
//! the high-risk hectares and finds the leading region; a second pass builds
//! a feature per row with a popup narrative.

use geojson::JsonObject;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use wildfire_types::{Locale, RegionLevel, RegionSummary};

use crate::compose::LayerResult;
use crate::features::FeatureCollectionBuilder;
use crate::narrative::{NarrativeError, Narrator, RegionNarrative};
use crate::rows::RegionRow;
use crate::stats::decimal_percentage;

/// Running totals of a region pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionStats {
    /// High-risk hectares summed over every row.
    pub total_high_ha: Decimal,
    /// Index and high-risk hectares of the leading row.
    pub top: Option<(usize, Decimal)>,
    /// Rows seen.
    pub region_count: u64,
}

impl RegionStats {
    /// Account for the row at `index`.
    ///
    /// The leading row only changes on a strictly greater value, so the
    /// first row encountered wins ties.
    pub fn record(&mut self, index: usize, high_ha: Decimal) {
        self.total_high_ha = self.total_high_ha.saturating_add(high_ha);
        self.region_count = self.region_count.saturating_add(1);
        match self.top {
            Some((_, best)) if high_ha <= best => {}
            _ => self.top = Some((index, high_ha)),
        }
    }

    /// The leading row's share of the total, 0 when the total is 0.
    pub fn max_percent(&self) -> f64 {
        self.top
            .map_or(0.0, |(_, best)| decimal_percentage(best, self.total_high_ha))
    }
}

/// Compute the ranking statistics of a row set without building features.
pub fn rank(rows: &[RegionRow]) -> RegionStats {
    let mut stats = RegionStats::default();
    for (index, row) in rows.iter().enumerate() {
        stats.record(index, row.high_ha);
    }
    stats
}

fn hectares(value: Decimal) -> Value {
    value.round_dp(2).to_f64().map_or(Value::Null, Value::from)
}

fn properties(row: &RegionRow, popup: String) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert(String::from("Name"), Value::from(row.name.as_str()));
    props.insert(String::from("H_Risk_area_ha"), hectares(row.high_ha));
    props.insert(String::from("M_Risk_area_ha"), hectares(row.moderate_ha));
    if let Some(low) = row.low_ha {
        props.insert(String::from("L_Risk_area_ha"), hectares(low));
    }
    if let Some(none) = row.no_risk_ha {
        props.insert(String::from("N_Risk_area_ha"), hectares(none));
    }
    props.insert(String::from("popupContent"), Value::from(popup));
    props
}

/// Aggregate region rows of one administrative level.
///
/// `scope` names the region the rows were restricted to, if any, and only
/// shapes the narrative used when no rows were found.
///
/// # Errors
///
/// Returns [`NarrativeError`] if a narrative cannot be rendered.
pub fn aggregate_regions(
    level: RegionLevel,
    rows: &[RegionRow],
    scope: Option<&str>,
    locale: Locale,
    narrator: &Narrator,
) -> Result<LayerResult<RegionSummary>, NarrativeError> {
    let stats = rank(rows);
    let top_index = stats.top.map(|(index, _)| index);
    let mut builder = FeatureCollectionBuilder::with_capacity(rows.len());
    let mut top_popup = None;

    for (index, row) in rows.iter().enumerate() {
        let popup = narrator.render_region(
            locale,
            level,
            &RegionNarrative::new(&row.name, row.high_ha, row.moderate_ha),
        )?;
        if top_index == Some(index) {
            top_popup = Some(popup.clone());
        }

        if let Err(e) = builder.push(row.geometry.as_deref(), properties(row, popup)) {
            tracing::debug!(region = %row.name, error = %e, "Dropped region with unreadable geometry");
        }
    }

    let top_row = top_index.and_then(|index| rows.get(index));
    let content = match top_popup {
        Some(popup) => popup,
        None => narrator.render_region_empty(locale, scope)?,
    };

    let built = builder.finish();
    tracing::debug!(
        ?level,
        regions = stats.region_count,
        top = top_row.map(|r| r.name.as_str()),
        dropped = built.dropped,
        "Aggregated regions"
    );

    Ok(LayerResult {
        summary: RegionSummary {
            content,
            total_risk_ha: stats.total_high_ha,
            top_region_name: top_row.map(|r| r.name.clone()),
            top_region_val: stats.top.map_or(Decimal::ZERO, |(_, best)| best),
            max_percent: stats.max_percent(),
            region_count: stats.region_count,
            dropped_rows: built.dropped,
        },
        geojson: built.collection,
    })
}
