//! Login gate of the trip form
//!
//! The trip form is shared as a link carrying `?login=<secret>`. Requests
//! whose `login` query parameter differs from the configured secret get 401.
//! An empty configured secret refuses every request.

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    login: String,
}

/// Reject requests without the configured `login` query parameter
pub async fn login_gate(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !login_matches(&query.login, &state.login) {
        warn!("Refused {} {}: bad login", request.method(), request.uri().path());
        return Err(AuthError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Constant-time comparison against the configured secret
fn login_matches(provided: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "You are not authorized to access this page",
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
