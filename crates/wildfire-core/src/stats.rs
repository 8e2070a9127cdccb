//! Pure numeric aggregation shared by the layer and region aggregators.
//!
//! Everything here is free of formatting so the numbers can be tested on
//! their own. Percentages are always relative to the totals processed in
//! the current response; a zero denominator yields 0.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use wildfire_types::RiskTier;

/// Per-tier entity counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    /// Entities in [`RiskTier::High`].
    pub high: u64,
    /// Entities in [`RiskTier::Moderate`].
    pub moderate: u64,
    /// Entities in [`RiskTier::Low`].
    pub low: u64,
    /// Entities in [`RiskTier::None`].
    pub none: u64,
}

impl TierCounts {
    /// Count one entity in its tier bucket.
    pub const fn record(&mut self, tier: RiskTier) {
        let bucket = match tier {
            RiskTier::High => &mut self.high,
            RiskTier::Moderate => &mut self.moderate,
            RiskTier::Low => &mut self.low,
            RiskTier::None => &mut self.none,
        };
        *bucket = bucket.saturating_add(1);
    }

    /// The count of one tier.
    pub const fn get(&self, tier: RiskTier) -> u64 {
        match tier {
            RiskTier::High => self.high,
            RiskTier::Moderate => self.moderate,
            RiskTier::Low => self.low,
            RiskTier::None => self.none,
        }
    }

    /// Entities in `floor` or any more severe tier.
    pub const fn at_or_above(&self, floor: RiskTier) -> u64 {
        let mut total = 0_u64;
        if matches!(floor, RiskTier::None) {
            total = total.saturating_add(self.none);
        }
        if matches!(floor, RiskTier::None | RiskTier::Low) {
            total = total.saturating_add(self.low);
        }
        if !matches!(floor, RiskTier::High) {
            total = total.saturating_add(self.moderate);
        }
        total.saturating_add(self.high)
    }

    /// Sum over every bucket.
    pub const fn total(&self) -> u64 {
        self.at_or_above(RiskTier::None)
    }
}

/// `numerator / denominator * 100`, or 0 when `denominator` is 0.
///
/// The result is clamped to `0..=100`.
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    // Counts stay far below 2^52, so the conversion is exact.
    #[allow(clippy::cast_precision_loss)]
    let ratio = numerator as f64 / denominator as f64;
    (ratio * 100.0).clamp(0.0, 100.0)
}

/// Decimal variant of [`percentage`] for hectare totals.
///
/// Returns 0 when `denominator` is zero or the division cannot be
/// represented.
pub fn decimal_percentage(numerator: Decimal, denominator: Decimal) -> f64 {
    if denominator.is_zero() {
        return 0.0;
    }
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.to_f64())
        .map_or(0.0, |pct| pct.clamp(0.0, 100.0))
}
