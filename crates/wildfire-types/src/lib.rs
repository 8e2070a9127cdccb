//! Shared type definitions for the wildfire exposure service.
//!
//! This crate is the single source of truth for the names that cross crate
//! and process boundaries: risk tiers, hazard levels, layer keys, boundary
//! actions, proximity thresholds, and the summaries embedded in every
//! response. Types flow downstream to `TypeScript` via `ts-rs` for the map
//! client.
//!
//! # Modules
//!
//! - [`enums`] -- Closed enumerations (tiers, levels, layers, actions, locale)
//! - [`structs`] -- Thresholds and layer/region summaries

pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BoundaryAction, EntityCategory, HazardLevel, LayerKey, Locale, RegionLevel, RiskTier,
    UNKNOWN_COLOR, color_for_level,
};
pub use structs::{LayerSummary, ProximityThresholds, RegionSummary};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the map client.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings to `bindings/` relative to the crate
        // root when the exported types are touched here.
        use ts_rs::TS;

        // Enums
        let _ = crate::enums::HazardLevel::export_all();
        let _ = crate::enums::RiskTier::export_all();
        let _ = crate::enums::EntityCategory::export_all();
        let _ = crate::enums::LayerKey::export_all();
        let _ = crate::enums::RegionLevel::export_all();
        let _ = crate::enums::BoundaryAction::export_all();
        let _ = crate::enums::Locale::export_all();

        // Structs
        let _ = crate::structs::ProximityThresholds::export_all();
        let _ = crate::structs::LayerSummary::export_all();
        let _ = crate::structs::RegionSummary::export_all();
    }
}
