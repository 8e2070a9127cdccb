//! Risk aggregation and response assembly for the wildfire exposure service.
//!
//! This crate turns rows from the spatial store into the multi-layer
//! response the map client renders. It never computes geometry itself; the
//! store hands it already joined or measured rows.
//!
//! # Modules
//!
//! - [`features`] -- rows of (geometry, attributes) into a `GeoJSON`
//!   feature collection, counting rows with unreadable geometry.
//! - [`classify`] -- risk tier from distance thresholds.
//! - [`stats`] -- tier counts and zero-guarded percentages.
//! - [`narrative`] -- locale-aware HTML narratives via `minijinja`.
//! - [`layer`] -- one aggregator for every exposed-entity layer, driven
//!   by a [`LayerProfile`].
//! - [`region`] -- hectares at risk per region or district and the
//!   leading region.
//! - [`compose`] -- the keyed response envelope.
//! - [`store`] -- the [`SpatialStore`] seam and an in-memory store.
//! - [`dispatch`] -- request validation and orchestration.
//! - [`config`] -- configuration loading from `wildfire-config.yaml`.
//!
//! [`LayerProfile`]: layer::LayerProfile
//! [`SpatialStore`]: store::SpatialStore

pub mod classify;
pub mod compose;
pub mod config;
pub mod dispatch;
pub mod features;
pub mod layer;
pub mod narrative;
pub mod region;
pub mod rows;
pub mod stats;
pub mod store;
