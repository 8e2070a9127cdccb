//! Risk tier classification from proximity to the hazard surface.
//!
//! The spatial store measures distances; this module only turns a distance
//! into a tier using the caller's thresholds. Entities reaching the
//! classifier were already selected by the store's inclusion join, so the
//! fallback tier depends on the category convention.

use wildfire_types::{EntityCategory, ProximityThresholds, RiskTier};

use crate::rows::{ExposureRow, ProximityRow};

/// Tier given to an entity inside the inclusion radius but outside both
/// thresholds.
pub const fn baseline_tier(category: EntityCategory) -> RiskTier {
    match category {
        EntityCategory::Structure => RiskTier::Moderate,
        EntityCategory::Community | EntityCategory::ProtectedArea => RiskTier::Low,
    }
}

/// Classify one entity by its distance (meters) to the nearest hazard polygon.
///
/// The high threshold is checked first, so an entity matching both
/// thresholds is [`RiskTier::High`]. A missing distance means no hazard is
/// in reach and yields [`RiskTier::None`]; a non-finite distance matches no
/// threshold.
pub fn classify(
    distance_m: Option<f64>,
    thresholds: ProximityThresholds,
    category: EntityCategory,
) -> RiskTier {
    let Some(distance) = distance_m else {
        return RiskTier::None;
    };
    if !distance.is_finite() {
        return baseline_tier(category);
    }
    if distance <= f64::from(thresholds.high_m) {
        RiskTier::High
    } else if distance <= f64::from(thresholds.moderate_m) {
        RiskTier::Moderate
    } else {
        baseline_tier(category)
    }
}

/// Classify proximity rows into exposure rows, consuming them so the
/// geometry text moves instead of being copied.
pub fn classify_rows(
    rows: Vec<ProximityRow>,
    thresholds: ProximityThresholds,
    category: EntityCategory,
) -> Vec<ExposureRow> {
    rows.into_iter()
        .map(|row| ExposureRow {
            id: Some(row.id),
            tier: classify(row.distance_m, thresholds, category),
            geometry: row.geometry,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: ProximityThresholds = ProximityThresholds::new(500, 1000);

    #[test]
    fn within_high_threshold_is_high() {
        assert_eq!(classify(Some(0.0), T, EntityCategory::Structure), RiskTier::High);
        assert_eq!(classify(Some(500.0), T, EntityCategory::Structure), RiskTier::High);
    }

    #[test]
    fn between_thresholds_is_moderate() {
        assert_eq!(classify(Some(500.5), T, EntityCategory::Community), RiskTier::Moderate);
        assert_eq!(classify(Some(1000.0), T, EntityCategory::Community), RiskTier::Moderate);
    }

    #[test]
    fn beyond_thresholds_uses_category_baseline() {
        assert_eq!(classify(Some(1500.0), T, EntityCategory::Structure), RiskTier::Moderate);
        assert_eq!(classify(Some(1500.0), T, EntityCategory::Community), RiskTier::Low);
        assert_eq!(classify(Some(1500.0), T, EntityCategory::ProtectedArea), RiskTier::Low);
    }

    #[test]
    fn high_wins_when_thresholds_overlap() {
        let inverted = ProximityThresholds::new(2000, 1000);
        assert_eq!(classify(Some(800.0), inverted, EntityCategory::Community), RiskTier::High);
        assert_eq!(classify(Some(1500.0), inverted, EntityCategory::Community), RiskTier::High);
    }

    #[test]
    fn no_hazard_in_reach_is_none() {
        assert_eq!(classify(None, T, EntityCategory::Structure), RiskTier::None);
    }

    #[test]
    fn non_finite_distance_matches_no_threshold() {
        assert_eq!(classify(Some(f64::NAN), T, EntityCategory::Community), RiskTier::Low);
        assert_eq!(classify(Some(f64::INFINITY), T, EntityCategory::Structure), RiskTier::Moderate);
    }

    #[test]
    fn thresholds_come_from_the_caller() {
        let tight = ProximityThresholds::new(10, 20);
        assert_eq!(classify(Some(400.0), tight, EntityCategory::Community), RiskTier::Low);
        assert_eq!(classify(Some(400.0), T, EntityCategory::Community), RiskTier::High);
    }

    #[test]
    fn classify_rows_keeps_order_and_geometry() {
        let rows = vec![
            ProximityRow { id: 7, distance_m: Some(900.0), geometry: Some(String::from("g7")) },
            ProximityRow { id: 3, distance_m: Some(100.0), geometry: None },
        ];
        let out = classify_rows(rows, T, EntityCategory::Structure);
        assert_eq!(out.len(), 2);
        assert_eq!(out.first().map(|r| (r.id, r.tier)), Some((Some(7), RiskTier::Moderate)));
        assert_eq!(out.get(1).map(|r| (r.id, r.tier)), Some((Some(3), RiskTier::High)));
        assert_eq!(out.first().and_then(|r| r.geometry.as_deref()), Some("g7"));
    }
}
