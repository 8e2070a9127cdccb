//! Enumeration types for the wildfire exposure service.
//!
//! Every name that arrives over the wire (layer names, boundary actions,
//! locales) is parsed into a closed enum here so downstream code matches
//! exhaustively instead of comparing strings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Display colour for hazard levels or tiers outside the known range.
pub const UNKNOWN_COLOR: &str = "#ccc";

// ---------------------------------------------------------------------------
// Hazard surface levels
// ---------------------------------------------------------------------------

/// The `risk_level` carried by every polygon of the hazard surface.
///
/// Levels are stored as small integers in the spatial store:
/// 1 = low, 2 = caution, 3 = moderate, 4 = high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum HazardLevel {
    /// Level 1.
    Low,
    /// Level 2.
    Caution,
    /// Level 3.
    Moderate,
    /// Level 4.
    High,
}

impl HazardLevel {
    /// Parse the integer level used by the hazard surface.
    ///
    /// Returns `None` for any value outside `1..=4`.
    pub const fn from_level(level: i32) -> Option<Self> {
        match level {
            1 => Some(Self::Low),
            2 => Some(Self::Caution),
            3 => Some(Self::Moderate),
            4 => Some(Self::High),
            _ => None,
        }
    }

    /// Fixed display colour for this level.
    pub const fn color(self) -> &'static str {
        match self {
            Self::High => "#bd0026",
            Self::Moderate => "#f03b20",
            Self::Caution => "#feb24c",
            Self::Low => "#26a641",
        }
    }
}

/// Display colour for a raw hazard level, falling back to [`UNKNOWN_COLOR`].
pub const fn color_for_level(level: i32) -> &'static str {
    match HazardLevel::from_level(level) {
        Some(hazard) => hazard.color(),
        None => UNKNOWN_COLOR,
    }
}

// ---------------------------------------------------------------------------
// Risk tiers
// ---------------------------------------------------------------------------

/// Risk tier assigned to an exposed entity.
///
/// Variants are declared from least to most severe so the derived
/// ordering gives `High > Moderate > Low > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RiskTier {
    /// No hazard within reach.
    None,
    /// Outside both proximity thresholds.
    Low,
    /// Within the moderate threshold.
    Moderate,
    /// Within the high threshold.
    High,
}

impl RiskTier {
    /// Parse the `risk_class` label produced by the spatial store.
    ///
    /// `"No risk"` is the label the store uses for [`RiskTier::None`].
    /// Returns `None` for any other label.
    pub fn parse_class(label: &str) -> Option<Self> {
        match label.trim() {
            "High" => Some(Self::High),
            "Moderate" => Some(Self::Moderate),
            "Low" => Some(Self::Low),
            "None" | "No risk" => Some(Self::None),
            _ => None,
        }
    }

    /// The label written into feature properties.
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::None => "No risk",
        }
    }

    /// Fixed display colour for this tier.
    pub const fn color(self) -> &'static str {
        match self {
            Self::High => HazardLevel::High.color(),
            Self::Moderate => HazardLevel::Moderate.color(),
            Self::Low => HazardLevel::Low.color(),
            Self::None => UNKNOWN_COLOR,
        }
    }
}

impl core::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Entity categories and layers
// ---------------------------------------------------------------------------

/// Category of an exposed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EntityCategory {
    /// Households and other buildings.
    Structure,
    /// Indigenous communities.
    Community,
    /// National protected areas.
    ProtectedArea,
}

/// An analysis layer a client can request alongside the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LayerKey {
    /// Households near the hazard surface.
    Households,
    /// Indigenous communities near the hazard surface.
    Indigenous,
    /// Protected areas near the hazard surface.
    ProtectedAreas,
}

impl LayerKey {
    /// Every layer in declaration order.
    pub const ALL: [Self; 3] = [Self::Households, Self::Indigenous, Self::ProtectedAreas];

    /// Parse a layer name as sent by the client.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "households" => Some(Self::Households),
            "indigenous" => Some(Self::Indigenous),
            "protected_areas" => Some(Self::ProtectedAreas),
            _ => None,
        }
    }

    /// The response key for this layer.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Households => "households",
            Self::Indigenous => "indigenous",
            Self::ProtectedAreas => "protected_areas",
        }
    }

    /// The entity category whose rows feed this layer.
    pub const fn category(self) -> EntityCategory {
        match self {
            Self::Households => EntityCategory::Structure,
            Self::Indigenous => EntityCategory::Community,
            Self::ProtectedAreas => EntityCategory::ProtectedArea,
        }
    }
}

impl core::fmt::Display for LayerKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Administrative levels and boundary actions
// ---------------------------------------------------------------------------

/// Administrative level of a region row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RegionLevel {
    /// One first-level region (department).
    Admin1,
    /// Every first-level region, hectares split over all four hazard levels.
    Overview,
    /// Second-level districts nested in one region.
    Admin2,
}

/// Action accepted by the boundary-only endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BoundaryAction {
    /// Hectares at risk for one region, or every region ranked.
    GetAdmin1,
    /// Hectares at risk for the districts of one region.
    GetAdmin2,
    /// Households near the hazard surface, classified by proximity.
    GetRiskHouseholds,
}

impl BoundaryAction {
    /// Parse the `action` query value. Unknown actions yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "get_admin1" => Some(Self::GetAdmin1),
            "get_admin2" => Some(Self::GetAdmin2),
            "get_risk_households" => Some(Self::GetRiskHouseholds),
            _ => None,
        }
    }

    /// The wire name of this action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetAdmin1 => "get_admin1",
            Self::GetAdmin2 => "get_admin2",
            Self::GetRiskHouseholds => "get_risk_households",
        }
    }
}

// ---------------------------------------------------------------------------
// Locale
// ---------------------------------------------------------------------------

/// Language of the rendered narratives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Spanish.
    Es,
}

impl Locale {
    /// Parse a language code such as `en` or `es-PY`.
    pub fn parse(code: &str) -> Option<Self> {
        let lang = code.split(['-', '_']).next().unwrap_or_default();
        match lang.to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

}
