//! Error types for the server binary.
//!
//! [`StartupError`] is the top-level error type that wraps every failure
//! mode between process start and the listener shutting down.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: wildfire_core::config::ConfigError,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },

    /// The database pool could not be created.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: wildfire_db::DbError,
    },

    /// The narrative templates failed to compile.
    #[error("narrative error: {source}")]
    Narrative {
        /// The underlying template error.
        #[from]
        source: wildfire_core::narrative::NarrativeError,
    },

    /// The HTTP server failed to start or stopped with an error.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: wildfire_api::server::ServerError,
    },
}
