//! Shared-secret authentication
//!
//! Runs before any handler logic. With auth disabled every request passes.

use crate::config::AuthConfig;
use crate::control::ApiError;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::warn;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Check the request headers against the configured key
pub fn check_api_key(auth: &AuthConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    if !auth.enabled {
        return Ok(());
    }

    let provided = match headers.get(API_KEY_HEADER) {
        None => return Err(ApiError::KeyRequired),
        Some(value) if value.is_empty() => return Err(ApiError::KeyRequired),
        Some(value) => value.as_bytes(),
    };

    if provided != auth.api_key.as_bytes() {
        return Err(ApiError::InvalidKey);
    }

    Ok(())
}

/// Middleware rejecting requests without a valid `X-API-Key`
pub async fn require_api_key(
    State(auth): State<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check_api_key(&auth, request.headers()) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            match e {
                ApiError::KeyRequired => {
                    warn!("Access denied to {}: No API key provided.", request.uri().path())
                }
                _ => warn!("Access denied to {}: Invalid API key.", request.uri().path()),
            }
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    #[test]
    fn test_disabled_passes_everything() {
        let auth = AuthConfig::disabled();
        assert!(check_api_key(&auth, &HeaderMap::new()).is_ok());
        assert!(check_api_key(&auth, &headers_with("anything")).is_ok());
    }

    #[test]
    fn test_missing_key() {
        let auth = AuthConfig::with_key("secret");
        assert_eq!(check_api_key(&auth, &HeaderMap::new()), Err(ApiError::KeyRequired));
        assert_eq!(check_api_key(&auth, &headers_with("")), Err(ApiError::KeyRequired));
    }

    #[test]
    fn test_wrong_key() {
        let auth = AuthConfig::with_key("secret");
        assert_eq!(check_api_key(&auth, &headers_with("Secret")), Err(ApiError::InvalidKey));
        assert_eq!(check_api_key(&auth, &headers_with("secret ")), Err(ApiError::InvalidKey));
    }

    #[test]
    fn test_correct_key() {
        let auth = AuthConfig::with_key("secret");
        assert!(check_api_key(&auth, &headers_with("secret")).is_ok());
    }

    #[test]
    fn test_header_name_case_insensitive() {
        let auth = AuthConfig::with_key("secret");
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        assert!(check_api_key(&auth, &headers).is_ok());
    }
}
