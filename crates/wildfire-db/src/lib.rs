//! `PostGIS` data layer for the wildfire exposure service.
//!
//! The database owns every geometry operation. This crate runs the
//! spatial queries and hands typed rows to `wildfire-core` through the
//! [`SpatialStore`](wildfire_core::store::SpatialStore) seam.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`spatial_store`] -- [`PgStore`] and its per-request [`PgSession`]
//! - [`records`] -- row structs decoded from the spatial queries
//! - [`error`] -- Shared error types

pub mod error;
pub mod postgres;
pub mod records;
pub mod spatial_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use spatial_store::{PgSession, PgStore};
