//! Feature collection builder.
//!
//! Wraps rows of (geometry, attributes) into a `GeoJSON` feature collection.
//! Geometry text is decoded exactly once per row. A row whose geometry is
//! missing or unreadable is skipped and counted; it never aborts the rest
//! of the collection. Output order always equals input order.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject};

/// A row-level geometry failure.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// The store returned a null geometry.
    #[error("row has no geometry")]
    Missing,

    /// The geometry text is not a valid `GeoJSON` geometry.
    #[error("malformed geometry: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode a `GeoJSON` geometry object from the text produced by the store.
///
/// # Errors
///
/// Returns [`GeometryError::Missing`] for `None` and
/// [`GeometryError::Malformed`] when the text does not parse.
pub fn decode_geometry(raw: Option<&str>) -> Result<Geometry, GeometryError> {
    let raw = raw.ok_or(GeometryError::Missing)?;
    Ok(serde_json::from_str::<Geometry>(raw)?)
}

/// A finished collection plus the number of rows it had to leave out.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltCollection {
    /// Features in input order.
    pub collection: FeatureCollection,
    /// Rows skipped because their geometry could not be decoded.
    pub dropped: u64,
}

/// Incremental builder used by aggregators inside their single pass.
#[derive(Debug, Default)]
pub struct FeatureCollectionBuilder {
    features: Vec<Feature>,
    dropped: u64,
}

impl FeatureCollectionBuilder {
    /// Create a builder sized for `rows` features.
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            features: Vec::with_capacity(rows),
            dropped: 0,
        }
    }

    /// Append one row's feature.
    ///
    /// On a geometry failure the row is counted as dropped and the error
    /// is returned so the caller can log it; the builder stays usable.
    ///
    /// # Errors
    ///
    /// Returns the [`GeometryError`] of the skipped row.
    pub fn push(
        &mut self,
        geometry: Option<&str>,
        properties: JsonObject,
    ) -> Result<(), GeometryError> {
        match decode_geometry(geometry) {
            Ok(geometry) => {
                self.features.push(Feature {
                    bbox: None,
                    geometry: Some(geometry),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                });
                Ok(())
            }
            Err(e) => {
                self.dropped = self.dropped.saturating_add(1);
                Err(e)
            }
        }
    }

    /// Number of rows dropped so far.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Finish the collection.
    pub fn finish(self) -> BuiltCollection {
        BuiltCollection {
            collection: FeatureCollection {
                bbox: None,
                features: self.features,
                foreign_members: None,
            },
            dropped: self.dropped,
        }
    }
}

/// Build a collection from borrowed rows.
///
/// `geometry_of` selects the row's geometry text and `properties_of`
/// projects its attributes. Rows are never mutated.
pub fn build<R>(
    rows: &[R],
    geometry_of: impl Fn(&R) -> Option<&str>,
    properties_of: impl Fn(&R) -> JsonObject,
) -> BuiltCollection {
    let mut builder = FeatureCollectionBuilder::with_capacity(rows.len());
    for row in rows {
        if let Err(e) = builder.push(geometry_of(row), properties_of(row)) {
            tracing::debug!(error = %e, "Skipped row with unreadable geometry");
        }
    }
    builder.finish()
}
