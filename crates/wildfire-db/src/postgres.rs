//! `PostgreSQL` connection pool.
//!
//! The spatial database is `PostGIS` on `PostgreSQL`. It holds the
//! administrative boundaries, the hazard surface, and the exposed-entity
//! tables; every geometry operation runs there.
//!
//! Queries are built at runtime rather than checked at compile time, so no
//! live database is needed to build. Values are always bound as parameters.

use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres};
use wildfire_core::config::{ConnectionParams, DatabaseConfig};

use crate::error::DbError;

/// Pool settings resolved from the `database` config section.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Where and as whom to connect.
    pub connect_options: PgConnectOptions,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long a request waits for a pooled connection.
    pub acquire_timeout: Duration,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
}

impl PostgresConfig {
    /// Resolve the pool settings.
    ///
    /// Separate connection fields are handed to the driver one by one;
    /// otherwise the connection URL is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    pub fn from_settings(settings: &DatabaseConfig) -> Result<Self, DbError> {
        let connect_options = match &settings.connection {
            Some(params) => options_from_params(params),
            None => settings
                .url
                .parse()
                .map_err(|e: sqlx::Error| DbError::Config(format!("invalid database URL: {e}")))?,
        };
        Ok(Self {
            connect_options,
            max_connections: settings.max_connections,
            acquire_timeout: Duration::from_secs(settings.acquire_timeout_secs),
            idle_timeout: Duration::from_secs(settings.idle_timeout_secs),
        })
    }
}

fn options_from_params(params: &ConnectionParams) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&params.host)
        .port(params.port)
        .database(&params.name);
    if let Some(user) = &params.user {
        options = options.username(user);
    }
    if let Some(password) = &params.password {
        options = options.password(password);
    }
    options
}

/// Connection pool handle to `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Open the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the first connection fails.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(config.connect_options.clone())
            .await?;
        tracing::info!(
            host = config.connect_options.get_host(),
            database = config.connect_options.get_database(),
            max_connections = config.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    /// Take one connection from the pool. It returns to the pool on drop.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if no connection becomes available
    /// within the acquire timeout.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, DbError> {
        Ok(self.pool.acquire().await?)
    }

    /// Close every connection, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn settings_carry_into_pool_config() {
        let settings = DatabaseConfig {
            url: String::from("postgresql://gis@db:5433/chaco"),
            max_connections: 3,
            acquire_timeout_secs: 2,
            idle_timeout_secs: 30,
            ..DatabaseConfig::default()
        };
        let config = PostgresConfig::from_settings(&settings).unwrap();
        assert_eq!(config.connect_options.get_host(), "db");
        assert_eq!(config.connect_options.get_port(), 5433);
        assert_eq!(config.connect_options.get_username(), "gis");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.acquire_timeout, Duration::from_secs(2));
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn reserved_characters_in_fields_reach_the_driver_intact() {
        let settings = DatabaseConfig {
            connection: Some(ConnectionParams {
                host: String::from("db"),
                port: 5432,
                name: String::from("chaco"),
                user: Some(String::from("gis")),
                password: Some(String::from("p@ss/w#rd")),
            }),
            ..DatabaseConfig::default()
        };
        let config = PostgresConfig::from_settings(&settings).unwrap();
        let options = &config.connect_options;
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("chaco"));
        assert_eq!(options.get_username(), "gis");
    }

    #[test]
    fn unparseable_url_is_a_config_error() {
        let settings = DatabaseConfig {
            url: String::from("not a url"),
            ..DatabaseConfig::default()
        };
        let result = PostgresConfig::from_settings(&settings);
        assert!(matches!(result, Err(DbError::Config(_))));
    }
}
