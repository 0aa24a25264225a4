//! Error kinds recognized by the core pipeline.
//!
//! These are the kinds every layer above (HTTP, providers, debrid resolvers)
//! eventually folds into. Mapping to HTTP status codes happens in `gateway-api`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("rate limited")]
    RateLimited,

    #[error("overloaded")]
    Overloaded,

    #[error("upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("upstream error: {0}")]
    UpstreamError(String),

    #[error("debrid authentication invalid")]
    DebridAuthInvalid,

    #[error("debrid provider blocked")]
    DebridBlocked,

    #[error("debrid transient failure")]
    DebridTransient,

    #[error("debrid reported no files")]
    DebridNoFiles,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
