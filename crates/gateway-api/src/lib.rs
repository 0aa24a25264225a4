//! HTTP surface for the aggregation gateway: manifest, listing, click-time
//! play redirect, operator endpoints, and the protective envelope.

pub mod error;
pub mod middleware;
pub mod preload;
pub mod query;
pub mod routes;
pub mod state;

pub use routes::app;
pub use state::AppState;
