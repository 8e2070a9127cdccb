//! Server binary for the wildfire exposure service.
//!
//! Wires configuration, logging, the `PostGIS` pool, the narrative
//! templates, and the HTTP API together, then serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `wildfire-config.yaml` (or defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Connect the `PostgreSQL` pool
//! 4. Compile the narrative templates
//! 5. Serve the HTTP API

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use wildfire_api::server::{ServerConfig, start_server};
use wildfire_api::state::AppState;
use wildfire_core::config::{AppConfig, LoggingConfig};
use wildfire_core::narrative::Narrator;
use wildfire_db::{PgStore, PostgresConfig, PostgresPool};

use crate::error::StartupError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "wildfire-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the server fails.
#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Load configuration.
    let path = config_path();
    let (config, from_file) = load_config(&path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("wildfire-server starting");
    if from_file {
        info!(path = %path.display(), "Configuration loaded");
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
    }
    info!(
        host = config.server.host,
        port = config.server.port,
        dist_high_m = config.analysis.dist_high_m,
        dist_mod_m = config.analysis.dist_mod_m,
        household_regions = config.households.tables.len(),
        map_token = config.map.mapbox_token.is_some(),
        "Effective configuration"
    );

    // 3. Connect the database pool.
    info!(url = %config.database.redacted_url(), "Connecting to PostgreSQL");
    let pool = PostgresPool::connect(&PostgresConfig::from_settings(&config.database)?).await?;
    let store = PgStore::new(pool, config.households.clone());

    // 4. Compile narrative templates.
    let narrator = Narrator::new()?;

    // 5. Serve.
    let server = ServerConfig::from(&config.server);
    let state = Arc::new(AppState::new(store, config, narrator));
    start_server(&server, Arc::clone(&state)).await?;

    state.store.pool().close().await;
    info!("wildfire-server stopped");
    Ok(())
}

/// Configuration path: first CLI argument, then `WILDFIRE_CONFIG`, then
/// [`DEFAULT_CONFIG_PATH`].
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WILDFIRE_CONFIG").ok())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration from `path`, falling back to defaults (with
/// environment overrides) when the file does not exist.
///
/// The flag is `true` when the file was read.
fn load_config(path: &std::path::Path) -> Result<(AppConfig, bool), StartupError> {
    if path.exists() {
        Ok((AppConfig::from_file(path)?, true))
    } else {
        let mut config = AppConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok((config, false))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| StartupError::Logging {
            message: format!("invalid log level '{}': {e}", logging.level),
        })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| StartupError::Logging {
        message: format!("{e}"),
    })
}
