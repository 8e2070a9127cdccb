//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors with additional context about which operation failed.

use wildfire_core::store::StoreError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The region has no household table configured.
    #[error("no household table configured for region '{0}'")]
    UnknownHouseholdTable(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Postgres(
                source @ (sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)),
            ) => Self::Unavailable(source.to_string()),
            DbError::Postgres(source) => Self::Query(source.to_string()),
            DbError::Config(message) => Self::Unavailable(message),
            DbError::UnknownHouseholdTable(region) => Self::UnknownDataset { region },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_mean_unavailable() {
        let err: StoreError = DbError::Postgres(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn row_errors_mean_query_failure() {
        let err: StoreError = DbError::Postgres(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn missing_table_is_unknown_dataset() {
        let err: StoreError = DbError::UnknownHouseholdTable(String::from("Atlantis")).into();
        assert!(matches!(err, StoreError::UnknownDataset { ref region } if region == "Atlantis"));
    }
}
