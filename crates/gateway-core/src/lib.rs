//! Domain model, classification, scoring, selection, caching and
//! reliability primitives for the aggregation gateway.
//!
//! This crate has no HTTP or network dependencies of its own — everything
//! here is pure data and pure functions so it can be exercised without a
//! runtime. `gateway-providers` wires it to upstream HTTP calls and
//! `gateway-api` wires it to axum.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod device;
pub mod error;
pub mod filters;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod reliability;
pub mod scorer;
pub mod selector;

pub use error::{GatewayError, Result};
