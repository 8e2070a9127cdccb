//! Error types for the HTTP API.
//!
//! [`ApiError`] is the single place where a failed request becomes a
//! response. Every handler returns it, and its
//! [`IntoResponse`](axum::response::IntoResponse) implementation maps each
//! failure to a status code and a `{"error": "..."}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use wildfire_core::dispatch::DispatchError;

/// Message returned to clients when the spatial store fails.
pub const DATA_SOURCE_MESSAGE: &str = "data source unavailable";

/// Message returned to clients when a narrative cannot be rendered.
pub const NARRATIVE_MESSAGE: &str = "narrative rendering failed";

/// Message returned when the map client configuration is missing.
pub const MAP_CONFIG_MESSAGE: &str = "Map configuration not available";

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The dispatcher rejected or failed the request.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The query string could not be decoded.
    #[error("invalid query: {0}")]
    BadQuery(String),

    /// A required server setting is missing.
    #[error("{0}")]
    Configuration(String),
}

impl ApiError {
    /// Status code and client-facing message of this error.
    ///
    /// Store and narrative failures are logged here with their detail and
    /// reported to the client with a generic message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Dispatch(DispatchError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Dispatch(DispatchError::DataSource(e)) => {
                tracing::error!(error = %e, "Data source failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from(DATA_SOURCE_MESSAGE),
                )
            }
            Self::Dispatch(DispatchError::Narrative(e)) => {
                tracing::error!(error = %e, "Narrative rendering failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from(NARRATIVE_MESSAGE),
                )
            }
            Self::BadQuery(msg) => (StatusCode::BAD_REQUEST, format!("invalid query: {msg}")),
            Self::Configuration(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wildfire_core::store::StoreError;

    use super::*;

    #[test]
    fn validation_is_a_bad_request() {
        let err = ApiError::from(DispatchError::Validation(String::from("region is required")));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "region is required");
    }

    #[test]
    fn store_detail_is_not_leaked() {
        let err = ApiError::from(DispatchError::DataSource(StoreError::Query(String::from(
            "relation \"boq_households\" does not exist",
        ))));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, DATA_SOURCE_MESSAGE);
    }

    #[test]
    fn unknown_household_dataset_is_a_bad_request() {
        let err = ApiError::from(DispatchError::from(StoreError::UnknownDataset {
            region: String::from("Concepcion"),
        }));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("Concepcion"));
    }

    #[test]
    fn missing_map_token_is_a_server_error() {
        let (status, message) =
            ApiError::Configuration(String::from(MAP_CONFIG_MESSAGE)).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, MAP_CONFIG_MESSAGE);
    }
}
