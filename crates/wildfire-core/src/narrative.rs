//! Locale-aware narrative rendering via `minijinja`.
//!
//! Narratives are small HTML fragments shown in the map's side pane and in
//! feature popups. Markup lives in the templates; every interpolated value
//! is escaped because the templates are registered under `.html` names,
//! which turns on `minijinja`'s HTML auto-escaping.
//!
//! Two filters are registered per locale:
//!
//! - `thousands` -- whole number with the locale's digit grouping (`12,345`);
//!   accepts integers and the decimal strings `rust_decimal` serializes to
//! - `percent` -- two decimals with the locale's decimal mark (`66.67`)

use minijinja::{Environment, Value};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use wildfire_types::{Locale, RegionLevel};

/// Errors raised while rendering a narrative.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    /// A template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// The narrative templates, one per summary shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// Households layer of the analysis response.
    Households,
    /// Indigenous communities layer.
    Indigenous,
    /// Protected areas layer.
    ProtectedAreas,
    /// Households classified by proximity (boundary endpoint).
    HouseholdProximity,
    /// Per-region hectares for one first-level region.
    Admin1,
    /// Per-region hectares over all four hazard levels.
    Overview,
    /// Per-district hectares.
    Admin2,
    /// No region rows at all.
    RegionEmpty,
}

impl Template {
    const ALL: [Self; 8] = [
        Self::Households,
        Self::Indigenous,
        Self::ProtectedAreas,
        Self::HouseholdProximity,
        Self::Admin1,
        Self::Overview,
        Self::Admin2,
        Self::RegionEmpty,
    ];

    /// Registered template name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Households => "households.html",
            Self::Indigenous => "indigenous.html",
            Self::ProtectedAreas => "protected_areas.html",
            Self::HouseholdProximity => "household_proximity.html",
            Self::Admin1 => "admin1.html",
            Self::Overview => "overview.html",
            Self::Admin2 => "admin2.html",
            Self::RegionEmpty => "region_empty.html",
        }
    }

    /// Template for the per-row narrative of a region level.
    pub const fn for_region(level: RegionLevel) -> Self {
        match level {
            RegionLevel::Admin1 => Self::Admin1,
            RegionLevel::Overview => Self::Overview,
            RegionLevel::Admin2 => Self::Admin2,
        }
    }

    const fn source(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Self::Households) => concat!(
                "{% if total == 0 %}No households were found near the wildfire hazard in {{ region }}.",
                "{% else %}There are <b>{{ high_count|thousands }}</b> houses at high risk in {{ region }} ",
                "representing <b>{{ percent|percent }}%</b> of all the households in the region.{% endif %}"
            ),
            (Locale::En, Self::Indigenous) => concat!(
                "{% if total == 0 %}No indigenous communities were found near the wildfire hazard in {{ region }}.",
                "{% else %}There are <b>{{ high_count|thousands }}</b> communities at high risk in {{ region }} ",
                "representing <b>{{ percent|percent }}%</b> of all the communities in the region.{% endif %}"
            ),
            (Locale::En, Self::ProtectedAreas) => concat!(
                "{% if total == 0 %}No national protected areas were found near the wildfire hazard in {{ region }}.",
                "{% else %}There are <b>{{ high_count|thousands }}</b> national protected areas at high risk in {{ region }} ",
                "representing <b>{{ percent|percent }}%</b> of all the reserves in the region.{% endif %}"
            ),
            (Locale::En, Self::HouseholdProximity) => concat!(
                "{% if total == 0 %}No households were found within reach of the wildfire hazard in the {{ region }} region.",
                "{% else %}There {% if high_count == 1 %}is{% else %}are{% endif %} <b>{{ high_count|thousands }} ",
                "household{% if high_count != 1 %}s{% endif %}</b> at high risk of wildfire in the {{ region }} region. ",
                "On top of that, there {% if moderate_count == 1 %}is{% else %}are{% endif %} ",
                "<b>{{ moderate_count|thousands }} household{% if moderate_count != 1 %}s{% endif %}</b> ",
                "in moderate risk areas.{% endif %}"
            ),
            (Locale::En, Self::Admin1) => concat!(
                "The region {{ name }} has <strong>{{ high_ha|thousands }}</strong> hectares with ",
                "<strong>high to moderate degree</strong> of wildfire risk and <strong>{{ moderate_ha|thousands }}</strong> ",
                "hectares of <strong>moderate risk</strong>."
            ),
            (Locale::En, Self::Overview) => concat!(
                "The region {{ name }} has <strong>{{ high_ha|thousands }}</strong> hectares with ",
                "<strong>high degree</strong> of wildfire risk and <strong>{{ moderate_ha|thousands }}</strong> ",
                "hectares of <strong>moderate risk</strong>."
            ),
            (Locale::En, Self::Admin2) => concat!(
                "The district {{ name }} has <strong>{{ high_ha|thousands }}</strong> hectares with ",
                "<strong>high degree</strong> of wildfire risk and <strong>{{ moderate_ha|thousands }}</strong> ",
                "hectares of <strong>moderate risk</strong>."
            ),
            (Locale::En, Self::RegionEmpty) => concat!(
                "No wildfire hazard area was found ",
                "{% if region %}for {{ region }}{% else %}in the study area{% endif %}."
            ),
            (Locale::Es, Self::Households) => concat!(
                "{% if total == 0 %}No se encontraron viviendas cerca de la amenaza de incendio en {{ region }}.",
                "{% else %}Hay <b>{{ high_count|thousands }}</b> viviendas en riesgo alto en {{ region }}, ",
                "lo que representa el <b>{{ percent|percent }}%</b> de todas las viviendas de la región.{% endif %}"
            ),
            (Locale::Es, Self::Indigenous) => concat!(
                "{% if total == 0 %}No se encontraron comunidades indígenas cerca de la amenaza de incendio en {{ region }}.",
                "{% else %}Hay <b>{{ high_count|thousands }}</b> comunidades en riesgo alto en {{ region }}, ",
                "lo que representa el <b>{{ percent|percent }}%</b> de todas las comunidades de la región.{% endif %}"
            ),
            (Locale::Es, Self::ProtectedAreas) => concat!(
                "{% if total == 0 %}No se encontraron áreas silvestres protegidas cerca de la amenaza de incendio en {{ region }}.",
                "{% else %}Hay <b>{{ high_count|thousands }}</b> áreas silvestres protegidas en riesgo alto en {{ region }}, ",
                "lo que representa el <b>{{ percent|percent }}%</b> de todas las reservas de la región.{% endif %}"
            ),
            (Locale::Es, Self::HouseholdProximity) => concat!(
                "{% if total == 0 %}No se encontraron viviendas al alcance de la amenaza de incendio en la región {{ region }}.",
                "{% else %}Hay <b>{{ high_count|thousands }} vivienda{% if high_count != 1 %}s{% endif %}</b> ",
                "en riesgo alto de incendio en la región {{ region }}. Además, hay ",
                "<b>{{ moderate_count|thousands }} vivienda{% if moderate_count != 1 %}s{% endif %}</b> ",
                "en zonas de riesgo moderado.{% endif %}"
            ),
            (Locale::Es, Self::Admin1) => concat!(
                "La región {{ name }} tiene <strong>{{ high_ha|thousands }}</strong> hectáreas con ",
                "<strong>grado alto a moderado</strong> de riesgo de incendio y <strong>{{ moderate_ha|thousands }}</strong> ",
                "hectáreas de <strong>riesgo moderado</strong>."
            ),
            (Locale::Es, Self::Overview) => concat!(
                "La región {{ name }} tiene <strong>{{ high_ha|thousands }}</strong> hectáreas con ",
                "<strong>grado alto</strong> de riesgo de incendio y <strong>{{ moderate_ha|thousands }}</strong> ",
                "hectáreas de <strong>riesgo moderado</strong>."
            ),
            (Locale::Es, Self::Admin2) => concat!(
                "El distrito {{ name }} tiene <strong>{{ high_ha|thousands }}</strong> hectáreas con ",
                "<strong>grado alto</strong> de riesgo de incendio y <strong>{{ moderate_ha|thousands }}</strong> ",
                "hectáreas de <strong>riesgo moderado</strong>."
            ),
            (Locale::Es, Self::RegionEmpty) => concat!(
                "No se encontró superficie con amenaza de incendio ",
                "{% if region %}en {{ region }}{% else %}en el área de estudio{% endif %}."
            ),
        }
    }
}

/// Values available to the layer templates.
#[derive(Debug, Clone, Serialize)]
pub struct LayerNarrative<'a> {
    /// Region the layer was computed for.
    pub region: &'a str,
    /// Entities in the at-risk tier.
    pub high_count: u64,
    /// Entities in the moderate tier.
    pub moderate_count: u64,
    /// Every entity processed.
    pub total: u64,
    /// Share of `total` at risk.
    pub percent: f64,
}

/// Values available to the per-region templates.
#[derive(Debug, Clone, Serialize)]
pub struct RegionNarrative<'a> {
    /// Region or district name.
    pub name: &'a str,
    /// High-risk hectares, rounded to whole hectares.
    pub high_ha: Decimal,
    /// Moderate-risk hectares, rounded to whole hectares.
    pub moderate_ha: Decimal,
}

impl<'a> RegionNarrative<'a> {
    /// Narrative values of a row, with hectares rounded half away from zero.
    pub fn new(name: &'a str, high_ha: Decimal, moderate_ha: Decimal) -> Self {
        Self {
            name,
            high_ha: whole(high_ha),
            moderate_ha: whole(moderate_ha),
        }
    }
}

fn whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Serialize)]
struct EmptyRegionNarrative<'a> {
    region: Option<&'a str>,
}

/// Renders narratives for every supported locale.
///
/// Built once at startup and shared read-only across requests.
pub struct Narrator {
    english: Environment<'static>,
    spanish: Environment<'static>,
}

impl core::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Narrator").finish_non_exhaustive()
    }
}

impl Narrator {
    /// Compile every template for every locale.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::Template`] if a template does not compile.
    pub fn new() -> Result<Self, NarrativeError> {
        Ok(Self {
            english: build_environment(Locale::En)?,
            spanish: build_environment(Locale::Es)?,
        })
    }

    const fn env(&self, locale: Locale) -> &Environment<'static> {
        match locale {
            Locale::En => &self.english,
            Locale::Es => &self.spanish,
        }
    }

    fn render<S: Serialize>(
        &self,
        locale: Locale,
        template: Template,
        ctx: S,
    ) -> Result<String, NarrativeError> {
        let tmpl = self.env(locale).get_template(template.name())?;
        Ok(tmpl.render(ctx)?)
    }

    /// Render a layer narrative (counts and percentage).
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::Template`] if rendering fails.
    pub fn render_layer(
        &self,
        locale: Locale,
        template: Template,
        ctx: &LayerNarrative<'_>,
    ) -> Result<String, NarrativeError> {
        self.render(locale, template, ctx)
    }

    /// Render the narrative of one region or district row.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::Template`] if rendering fails.
    pub fn render_region(
        &self,
        locale: Locale,
        level: RegionLevel,
        ctx: &RegionNarrative<'_>,
    ) -> Result<String, NarrativeError> {
        self.render(locale, Template::for_region(level), ctx)
    }

    /// Render the narrative used when no region rows were found.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::Template`] if rendering fails.
    pub fn render_region_empty(
        &self,
        locale: Locale,
        region: Option<&str>,
    ) -> Result<String, NarrativeError> {
        self.render(locale, Template::RegionEmpty, EmptyRegionNarrative { region })
    }
}

fn build_environment(locale: Locale) -> Result<Environment<'static>, NarrativeError> {
    let (group_separator, decimal_mark) = separators(locale);

    let mut env = Environment::new();
    env.add_filter("thousands", move |value: Value| {
        group_digits(&value.to_string(), group_separator)
    });
    env.add_filter("percent", move |value: f64| {
        format_percent(value, decimal_mark)
    });
    for template in Template::ALL {
        env.add_template(template.name(), template.source(locale))?;
    }
    Ok(env)
}

/// Digit-group separator and decimal mark of a locale.
pub const fn separators(locale: Locale) -> (char, char) {
    match locale {
        Locale::En => (',', '.'),
        Locale::Es => ('.', ','),
    }
}

/// Insert a separator between every three digits of a whole number.
///
/// `number` is the plain decimal rendering of an integer, optionally
/// signed; any fractional part is kept unchanged after the grouped digits.
pub fn group_digits(number: &str, separator: char) -> String {
    let (negative, unsigned) = number
        .strip_prefix('-')
        .map_or((false, number), |rest| (true, rest));
    let (digits, fraction) = unsigned
        .split_once('.')
        .map_or((unsigned, None), |(int_part, fraction)| (int_part, Some(fraction)));
    let groups: Vec<&str> = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .filter_map(|chunk| core::str::from_utf8(chunk).ok())
        .collect();

    let mut out = String::with_capacity(number.len().saturating_add(groups.len()));
    if negative {
        out.push('-');
    }
    out.push_str(&groups.join(separator.encode_utf8(&mut [0; 4])));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Format a percentage with two decimals and the given decimal mark.
pub fn format_percent(value: f64, decimal_mark: char) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let formatted = format!("{value:.2}");
    if decimal_mark == '.' {
        formatted
    } else {
        formatted.replace('.', decimal_mark.encode_utf8(&mut [0; 4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrator() -> Narrator {
        match Narrator::new() {
            Ok(n) => n,
            Err(e) => panic!("templates must compile: {e}"),
        }
    }

    #[test]
    fn group_digits_formats() {
        assert_eq!(group_digits("0", ','), "0");
        assert_eq!(group_digits("999", ','), "999");
        assert_eq!(group_digits("1000", ','), "1,000");
        assert_eq!(group_digits("1234567", ','), "1,234,567");
        assert_eq!(group_digits("-45000", '.'), "-45.000");
        assert_eq!(group_digits("12345.5", ','), "12,345.5");
    }

    #[test]
    fn format_percent_two_decimals() {
        assert_eq!(format_percent(66.666_666, '.'), "66.67");
        assert_eq!(format_percent(75.0, ','), "75,00");
        assert_eq!(format_percent(f64::NAN, '.'), "0.00");
    }

    #[test]
    fn households_narrative_en() {
        let ctx = LayerNarrative {
            region: "Boqueron",
            high_count: 1234,
            moderate_count: 10,
            total: 1851,
            percent: 66.666_666,
        };
        let text = narrator()
            .render_layer(Locale::En, Template::Households, &ctx)
            .unwrap_or_default();
        assert_eq!(
            text,
            "There are <b>1,234</b> houses at high risk in Boqueron representing \
             <b>66.67%</b> of all the households in the region."
        );
    }

    #[test]
    fn households_narrative_es_uses_spanish_separators() {
        let ctx = LayerNarrative {
            region: "Boqueron",
            high_count: 1234,
            moderate_count: 10,
            total: 1851,
            percent: 66.666_666,
        };
        let text = narrator()
            .render_layer(Locale::Es, Template::Households, &ctx)
            .unwrap_or_default();
        assert!(text.contains("<b>1.234</b>"));
        assert!(text.contains("<b>66,67%</b>"));
    }

    #[test]
    fn empty_layer_does_not_claim_a_percentage() {
        let ctx = LayerNarrative {
            region: "Alto Paraguay",
            high_count: 0,
            moderate_count: 0,
            total: 0,
            percent: 0.0,
        };
        let text = narrator()
            .render_layer(Locale::En, Template::Indigenous, &ctx)
            .unwrap_or_default();
        assert!(!text.contains('%'));
        assert!(text.contains("Alto Paraguay"));
    }

    #[test]
    fn region_names_are_escaped() {
        let ctx = RegionNarrative::new(
            "<script>alert(1)</script>",
            Decimal::new(10, 0),
            Decimal::new(5, 0),
        );
        let text = narrator()
            .render_region(Locale::En, RegionLevel::Admin1, &ctx)
            .unwrap_or_default();
        assert!(!text.contains("<script>"));
        assert!(text.contains("&lt;script&gt;"));
        assert!(text.contains("<strong>10</strong>"));
    }

    #[test]
    fn admin_levels_use_their_own_phrasing() {
        let ctx = RegionNarrative::new("Mariscal Estigarribia", Decimal::new(25_000, 0), Decimal::ZERO);
        let n = narrator();
        let admin1 = n.render_region(Locale::En, RegionLevel::Admin1, &ctx).unwrap_or_default();
        let overview = n.render_region(Locale::En, RegionLevel::Overview, &ctx).unwrap_or_default();
        let admin2 = n.render_region(Locale::En, RegionLevel::Admin2, &ctx).unwrap_or_default();
        assert!(admin1.contains("high to moderate degree"));
        assert!(overview.starts_with("The region Mariscal Estigarribia"));
        assert!(overview.contains("<strong>high degree</strong>"));
        assert!(admin2.contains("<strong>high degree</strong>"));
        assert!(admin2.contains("25,000"));
    }

    #[test]
    fn hectares_beyond_i64_render_in_full() {
        let huge = Decimal::from_i128_with_scale(12_345_678_901_234_567_890_123_456, 0);
        let ctx = RegionNarrative::new("Boqueron", huge, Decimal::new(25, 1));
        let text = narrator()
            .render_region(Locale::En, RegionLevel::Admin1, &ctx)
            .unwrap_or_default();
        assert!(text.contains("<strong>12,345,678,901,234,567,890,123,456</strong>"));
        assert!(text.contains("<strong>3</strong> hectares of"));
    }

    #[test]
    fn household_proximity_singular_and_plural() {
        let ctx = |high_count, moderate_count| LayerNarrative {
            region: "Boqueron",
            high_count,
            moderate_count,
            total: 10,
            percent: 0.0,
        };
        let n = narrator();
        let one = n
            .render_layer(Locale::En, Template::HouseholdProximity, &ctx(1, 2))
            .unwrap_or_default();
        assert!(one.contains("There is <b>1 household</b> at high risk"));
        assert!(one.contains("there are <b>2 households</b> in moderate"));

        let many = n
            .render_layer(Locale::En, Template::HouseholdProximity, &ctx(3, 1))
            .unwrap_or_default();
        assert!(many.contains("There are <b>3 households</b>"));
        assert!(many.contains("there is <b>1 household</b> in moderate"));

        let es = n
            .render_layer(Locale::Es, Template::HouseholdProximity, &ctx(1, 1_500))
            .unwrap_or_default();
        assert!(es.contains("<b>1 vivienda</b>"));
        assert!(es.contains("<b>1.500 viviendas</b>"));
    }

    #[test]
    fn region_empty_with_and_without_scope() {
        let n = narrator();
        let scoped = n.render_region_empty(Locale::En, Some("Boqueron")).unwrap_or_default();
        let global = n.render_region_empty(Locale::En, None).unwrap_or_default();
        assert_eq!(scoped, "No wildfire hazard area was found for Boqueron.");
        assert_eq!(global, "No wildfire hazard area was found in the study area.");
    }
}
