//! Shared HTTP-to-debrid-error classification, used by every resolver so
//! a 401 always means `auth_invalid` and a 429
//! always means `rate_limited` regardless of which provider returned it.

use crate::http_client::HttpError;

use super::traits::DebridError;

pub fn classify_http_error(err: HttpError) -> DebridError {
    match err {
        HttpError::Timeout => DebridError::Timeout,
        HttpError::HttpError(status) if status.as_u16() == 401 || status.as_u16() == 403 => DebridError::AuthInvalid,
        HttpError::HttpError(status) if status.as_u16() == 429 => DebridError::RateLimited,
        HttpError::HttpError(_) => DebridError::Transient,
        HttpError::Network(_) => DebridError::NoServer,
    }
}
