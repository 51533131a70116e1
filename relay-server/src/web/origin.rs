//! Origin allow-list.
//!
//! Two layers cooperate:
//! - [`cors_layer`] answers preflight requests and decorates responses
//! - [`origin_gate`] refuses non-preflight requests from unlisted origins
//!   before any handler runs
//!
//! Requests without an `Origin` header are not browser cross-origin calls
//! and always pass.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use super::error::ApiError;
use super::handlers::AppState;

/// Exact-match check against the configured allow-list.
pub fn is_origin_allowed(allowed: Option<&[String]>, origin: &str) -> bool {
    match allowed {
        None => true,
        Some(list) => list.iter().any(|o| o == origin),
    }
}

/// Reject requests from origins that are not on the allow-list.
pub async fn origin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let Some(origin) = request.headers().get(header::ORIGIN).cloned() else {
        return next.run(request).await;
    };

    let allowed = origin
        .to_str()
        .map(|o| is_origin_allowed(state.config.allowed_origins.as_deref(), o))
        .unwrap_or(false);

    if allowed {
        next.run(request).await
    } else {
        warn!(
            origin = ?origin,
            method = %request.method(),
            path = %request.uri().path(),
            "origin_rejected"
        );
        ApiError::OriginNotAllowed.into_response()
    }
}

/// CORS headers and preflight handling for the allowed origins.
pub fn cors_layer(allowed: Option<&[String]>) -> CorsLayer {
    let origins = match allowed {
        None => AllowOrigin::from(Any),
        Some(list) => AllowOrigin::list(list.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| warn!(origin = %origin, "cors_origin_unusable"))
                .ok()
        })),
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_list_allows_everything() {
        assert!(is_origin_allowed(None, "https://anything.example"));
    }

    #[test]
    fn test_exact_match_only() {
        let list = vec!["https://site.example".to_string()];

        assert!(is_origin_allowed(Some(list.as_slice()), "https://site.example"));
        assert!(!is_origin_allowed(Some(list.as_slice()), "https://site.example/"));
        assert!(!is_origin_allowed(Some(list.as_slice()), "http://site.example"));
        assert!(!is_origin_allowed(Some(list.as_slice()), "https://evil.site.example"));
    }

    #[test]
    fn test_empty_list_denies_browsers() {
        let list: Vec<String> = Vec::new();

        assert!(!is_origin_allowed(Some(list.as_slice()), "https://site.example"));
    }
}
