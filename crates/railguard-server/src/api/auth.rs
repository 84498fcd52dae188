//! Authentication middleware for operator endpoints.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Extractor for the operator token from config.
#[derive(Clone)]
pub struct OperatorToken(pub Arc<String>);

/// Middleware that requires a valid operator token in the Authorization
/// header.
///
/// Expected header format: `Authorization: Bearer <operator_token>`
pub async fn require_operator(
    State(operator_token): State<OperatorToken>,
    request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match auth_header {
        Some(auth) if auth.starts_with("Bearer ") => {
            let token = auth.trim_start_matches("Bearer ");
            if token == operator_token.0.as_str() {
                next.run(request).await
            } else {
                (
                    StatusCode::FORBIDDEN,
                    Json(serde_json::json!({
                        "error": "Invalid operator token",
                        "hint": "Check RAILGUARD_OPERATOR_TOKEN environment variable"
                    })),
                )
                    .into_response()
            }
        }
        Some(_) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Invalid Authorization header format",
                "expected": "Bearer <token>"
            })),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Authorization required",
                "hint": "Add header: Authorization: Bearer <operator_token>"
            })),
        )
            .into_response(),
    }
}
