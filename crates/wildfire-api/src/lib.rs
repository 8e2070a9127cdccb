//! HTTP API for the wildfire exposure service.
//!
//! Exposes the analysis and boundary endpoints the map client calls, plus
//! the region list, hazard surface, and map configuration it loads on
//! start. Handlers are generic over the
//! [`SpatialStore`](wildfire_core::store::SpatialStore), so the same router
//! serves `PostGIS` in production and an in-memory store in tests.
//!
//! # Modules
//!
//! - [`error`] -- [`ApiError`](error::ApiError) and its response mapping
//! - [`handlers`] -- endpoint handlers
//! - [`router`] -- route table and middleware
//! - [`server`] -- listener lifecycle
//! - [`state`] -- shared application state

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
