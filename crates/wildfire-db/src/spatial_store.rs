//! `PostGIS` implementation of the spatial store.
//!
//! Region hectares are computed with `ST_Area` over the hazard polygons
//! contained in each boundary; layer entities are classified by the
//! `get_*_risk` functions installed in the database; household proximity
//! uses `ST_DWithin` and `ST_Distance` against the hazard surface. All
//! geometry leaves the database as `ST_AsGeoJSON` text in EPSG:4326.

use std::sync::Arc;

use sqlx::Postgres;
use sqlx::pool::PoolConnection;
use wildfire_core::config::{HouseholdsConfig, is_identifier};
use wildfire_core::rows::{BoundaryRow, ExposureRow, HazardRow, ProximityRow, RegionRow};
use wildfire_core::store::{SpatialSession, SpatialStore, StoreError};
use wildfire_types::{LayerKey, ProximityThresholds};

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::records::{
    BoundaryRecord, ExposureRecord, HazardRecord, ProximityRecord, RegionRecord,
};

/// Hectares per grouping for region `$1`.
/// Levels 4 and 3 count as high, 2 as moderate, 1 as no risk.
const ADMIN1_EXPOSURE_SQL: &str = r#"
SELECT
    c."ADM1_NAME" AS name,
    ROUND((SUM(CASE WHEN f.risk_level IN (4, 3) THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS high_risk_area_ha,
    ROUND((SUM(CASE WHEN f.risk_level = 2 THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS moderate_risk_area_ha,
    NULL::numeric AS low_risk_area_ha,
    ROUND((SUM(CASE WHEN f.risk_level = 1 THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS no_risk_area_ha,
    ST_AsGeoJSON(ST_Transform(c.geometry, 4326)) AS geom
FROM chaco_boundaries AS c
JOIN risk_surface AS f ON ST_Contains(c.geometry, f.geometry)
WHERE c."ADM1_NAME" = $1
GROUP BY c."ADM1_NAME", c.geometry
"#;

/// Hectares of every region, one tier per hazard level.
const ADMIN1_OVERVIEW_SQL: &str = r#"
SELECT
    c."ADM1_NAME" AS name,
    ROUND((SUM(CASE WHEN f.risk_level = 4 THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS high_risk_area_ha,
    ROUND((SUM(CASE WHEN f.risk_level = 3 THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS moderate_risk_area_ha,
    ROUND((SUM(CASE WHEN f.risk_level = 2 THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS low_risk_area_ha,
    ROUND((SUM(CASE WHEN f.risk_level = 1 THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS no_risk_area_ha,
    ST_AsGeoJSON(ST_Transform(c.geometry, 4326)) AS geom
FROM chaco_boundaries AS c
JOIN risk_surface AS f ON ST_Contains(c.geometry, f.geometry)
GROUP BY c."ADM1_NAME", c.geometry
ORDER BY c."ADM1_NAME"
"#;

/// Districts whose area lies mostly (> 50%) inside region `$1`.
/// Level 4 counts as high, 2 and 3 as moderate.
const ADMIN2_EXPOSURE_SQL: &str = r#"
WITH target_dept AS (
    SELECT geometry FROM chaco_boundaries WHERE "ADM1_NAME" = $1
)
SELECT
    d."ADM2_ES" AS name,
    ROUND((SUM(CASE WHEN f.risk_level = 4 THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS high_risk_area_ha,
    ROUND((SUM(CASE WHEN f.risk_level IN (2, 3) THEN ST_Area(f.geometry) ELSE 0 END) / 10000)::numeric, 0) AS moderate_risk_area_ha,
    NULL::numeric AS low_risk_area_ha,
    NULL::numeric AS no_risk_area_ha,
    ST_AsGeoJSON(ST_Transform(d.geometry, 4326)) AS geom
FROM chaco_districts AS d
JOIN target_dept ON ST_Intersects(d.geometry, target_dept.geometry)
JOIN risk_surface AS f ON ST_Intersects(d.geometry, f.geometry)
WHERE (ST_Area(ST_Intersection(d.geometry, target_dept.geometry)) / ST_Area(d.geometry)) > 0.5
GROUP BY d."ADM2_ES", d.geometry
ORDER BY d."ADM2_ES"
"#;

const HOUSEHOLD_RISK_SQL: &str =
    "SELECT risk_class::text AS risk_class, geom::text AS geom FROM get_household_risk($1, $2, $3)";

const COMMUNITY_RISK_SQL: &str =
    "SELECT risk_class::text AS risk_class, geom::text AS geom FROM get_ind_comm_risk($1, $2, $3)";

const PROTECTED_AREA_RISK_SQL: &str =
    "SELECT risk_class::text AS risk_class, geom::text AS geom FROM get_pa_risk($1, $2, $3)";

const BOUNDARIES_SQL: &str = r#"
SELECT "ADM1_NAME" AS name, ST_AsGeoJSON(ST_Transform(geometry, 4326)) AS geom
FROM chaco_boundaries
ORDER BY "ADM1_NAME"
"#;

const HAZARD_SURFACE_SQL: &str = r"
SELECT risk_level::int4 AS risk_level, ST_AsGeoJSON(ST_Transform(geometry, 4326)) AS geom
FROM risk_surface
";

/// Households of `table` within `$1` meters of the hazard surface, with the
/// distance to the nearest hazard polygon.
fn proximity_sql(table: &str) -> String {
    format!(
        r"
SELECT
    h.id::int8 AS id,
    MIN(ST_Distance(r.geometry, h.geometry))::float8 AS distance_m,
    ST_AsGeoJSON(ST_Transform(h.geometry, 4326)) AS geom
FROM {table} AS h
JOIN risk_surface AS r ON ST_DWithin(r.geometry, h.geometry, $1)
GROUP BY h.id, h.geometry
ORDER BY h.id
"
    )
}

fn meters(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// A [`SpatialStore`] over a `PostGIS` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PostgresPool,
    households: Arc<HouseholdsConfig>,
}

impl PgStore {
    /// Create a store over `pool` with the region to household table map.
    pub fn new(pool: PostgresPool, households: HouseholdsConfig) -> Self {
        Self {
            pool,
            households: Arc::new(households),
        }
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &PostgresPool {
        &self.pool
    }
}

impl SpatialStore for PgStore {
    type Session = PgSession;

    async fn acquire(&self) -> Result<PgSession, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(PgSession {
            conn,
            households: Arc::clone(&self.households),
        })
    }
}

/// One pooled connection, returned to the pool when dropped.
#[derive(Debug)]
pub struct PgSession {
    conn: PoolConnection<Postgres>,
    households: Arc<HouseholdsConfig>,
}

impl PgSession {
    fn household_table(&self, region: &str) -> Result<String, DbError> {
        let table = self
            .households
            .table_for(region)
            .ok_or_else(|| DbError::UnknownHouseholdTable(String::from(region)))?;
        if !is_identifier(table) {
            return Err(DbError::Config(format!("invalid household table name '{table}'")));
        }
        Ok(String::from(table))
    }

    async fn classified(
        &mut self,
        sql: &'static str,
        subject: &str,
        thresholds: ProximityThresholds,
    ) -> Result<Vec<ExposureRow>, DbError> {
        let records = sqlx::query_as::<_, ExposureRecord>(sql)
            .bind(subject)
            .bind(meters(thresholds.high_m))
            .bind(meters(thresholds.moderate_m))
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(records.into_iter().map(ExposureRow::from).collect())
    }
}

impl SpatialSession for PgSession {
    async fn admin1_exposure(&mut self, region: &str) -> Result<Vec<RegionRow>, StoreError> {
        let records = sqlx::query_as::<_, RegionRecord>(ADMIN1_EXPOSURE_SQL)
            .bind(region)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(DbError::from)?;
        tracing::debug!(region, rows = records.len(), "Fetched region exposure");
        Ok(records.into_iter().map(RegionRow::from).collect())
    }

    async fn admin1_overview(&mut self) -> Result<Vec<RegionRow>, StoreError> {
        let records = sqlx::query_as::<_, RegionRecord>(ADMIN1_OVERVIEW_SQL)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(DbError::from)?;
        tracing::debug!(rows = records.len(), "Fetched region overview");
        Ok(records.into_iter().map(RegionRow::from).collect())
    }

    async fn admin2_exposure(&mut self, region: &str) -> Result<Vec<RegionRow>, StoreError> {
        let records = sqlx::query_as::<_, RegionRecord>(ADMIN2_EXPOSURE_SQL)
            .bind(region)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(DbError::from)?;
        tracing::debug!(region, rows = records.len(), "Fetched district exposure");
        Ok(records.into_iter().map(RegionRow::from).collect())
    }

    async fn layer_exposure(
        &mut self,
        layer: LayerKey,
        region: &str,
        thresholds: ProximityThresholds,
    ) -> Result<Vec<ExposureRow>, StoreError> {
        let rows = match layer {
            LayerKey::Households => {
                let table = self.household_table(region)?;
                self.classified(HOUSEHOLD_RISK_SQL, &table, thresholds).await?
            }
            LayerKey::Indigenous => self.classified(COMMUNITY_RISK_SQL, region, thresholds).await?,
            LayerKey::ProtectedAreas => {
                self.classified(PROTECTED_AREA_RISK_SQL, region, thresholds).await?
            }
        };
        tracing::debug!(layer = %layer, region, rows = rows.len(), "Fetched layer exposure");
        Ok(rows)
    }

    async fn structure_proximity(
        &mut self,
        region: &str,
        inclusion_m: u32,
    ) -> Result<Vec<ProximityRow>, StoreError> {
        let table = self.household_table(region)?;
        let sql = proximity_sql(&table);
        let records = sqlx::query_as::<_, ProximityRecord>(&sql)
            .bind(f64::from(inclusion_m))
            .fetch_all(&mut *self.conn)
            .await
            .map_err(DbError::from)?;
        tracing::debug!(region, inclusion_m, rows = records.len(), "Fetched household proximity");
        Ok(records.into_iter().map(ProximityRow::from).collect())
    }

    async fn boundaries(&mut self) -> Result<Vec<BoundaryRow>, StoreError> {
        let records = sqlx::query_as::<_, BoundaryRecord>(BOUNDARIES_SQL)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(DbError::from)?;
        Ok(records.into_iter().map(BoundaryRow::from).collect())
    }

    async fn hazard_surface(&mut self) -> Result<Vec<HazardRow>, StoreError> {
        let records = sqlx::query_as::<_, HazardRecord>(HAZARD_SURFACE_SQL)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(DbError::from)?;
        Ok(records.into_iter().map(HazardRow::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proximity_sql_names_the_table() {
        let sql = proximity_sql("boq_households");
        assert!(sql.contains("FROM boq_households AS h"));
        assert!(sql.contains("ST_DWithin(r.geometry, h.geometry, $1)"));
    }

    #[test]
    fn overview_reports_every_hazard_level() {
        for level in 1..=4 {
            assert!(ADMIN1_OVERVIEW_SQL.contains(&format!("f.risk_level = {level} THEN")));
        }
        assert!(!ADMIN1_OVERVIEW_SQL.contains("NULL::numeric"));
        assert!(!ADMIN1_OVERVIEW_SQL.contains("$1"));
        assert!(ADMIN1_EXPOSURE_SQL.contains("IN (4, 3)"));
    }

    #[test]
    fn meters_saturate() {
        assert_eq!(meters(500), 500);
        assert_eq!(meters(u32::MAX), i32::MAX);
    }
}
