use axum::{http::StatusCode, response::IntoResponse, Json};
use trunker::{FlagSnapshot, RequestContext};

use crate::routes::middleware_auth::JwtUser;

/// Echoes the flags attached to this request.
pub async fn flags(snapshot: FlagSnapshot) -> impl IntoResponse {
    Json(serde_json::json!({
        "flags": &*snapshot,
        "message": "Flags for this request",
    }))
}

pub async fn feature1() -> &'static str {
    "Hello, world! From /beta-feature1."
}

pub async fn feature2() -> &'static str {
    "Hello, world! From /beta-feature2."
}

// No restrict layer here, the handler decides on its own.
pub async fn manual(snapshot: FlagSnapshot, ctx: RequestContext) -> impl IntoResponse {
    match snapshot.is_active("betaFeature1", &ctx).await {
        Ok(true) => (StatusCode::OK, "Hello, world! From /manual.").into_response(),
        Ok(false) => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn beta_users(JwtUser(user_id): JwtUser) -> String {
    format!("Welcome to the beta, {user_id}")
}
