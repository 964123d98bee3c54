//! Admin-token gate for organizer endpoints.
//!
//! When the server is configured with an admin token, routes wrapped in
//! [`admin_middleware`] require `Authorization: Bearer <token>`. Without a
//! configured token every request passes.
//!
//! ```rust,no_run
//! use axum::{Router, middleware, routing::post};
//! # use ko_server::api::{AppState, middleware::admin_middleware};
//! # async fn handler() {}
//! # let state: AppState = unimplemented!();
//!
//! let organizer_routes: Router<AppState> = Router::new()
//!     .route("/tournaments/{id}/advance", post(handler))
//!     .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));
//! # let _ = organizer_routes;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use subtle::ConstantTimeEq;

use super::{AppState, error::ApiError, request_id::RequestId};
use crate::logging::log_admin_event;

/// Reject requests without the configured admin bearer token
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let authorized = presented.is_some_and(|token| token_matches(token, expected));
    let request_id = request.extensions().get::<RequestId>().cloned();
    log_admin_event(
        request.uri().path(),
        authorized,
        request_id.as_ref().map(RequestId::as_str),
    );

    if authorized {
        next.run(request).await
    } else {
        ApiError::Unauthorized.into_response()
    }
}

/// Constant-time token comparison
fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches() {
        assert!(token_matches("secret-token-123", "secret-token-123"));
        assert!(!token_matches("secret-token-123", "secret-token-124"));
        assert!(!token_matches("short", "secret-token-123"));
    }
}
