//! Token gate of the student project
//!
//! Each participant receives a token and sends it as
//! `Authorization: Bearer <token>`. The token also names the worksheet their
//! upload is stored in.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Token of the authenticated participant, set by [`token_gate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantToken(pub String);

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Reject requests without a configured bearer token
pub async fn token_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(token) = bearer_token(&request) else {
        warn!("Refused {} {}: no token", request.method(), request.uri().path());
        return Err(AuthError::InvalidToken);
    };

    if !state.tokens.contains(&token) {
        warn!("Refused {} {}: unknown token", request.method(), request.uri().path());
        return Err(AuthError::InvalidToken);
    }

    request.extensions_mut().insert(ParticipantToken(token));
    Ok(next.run(request).await)
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token is invalid"),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
