use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;
use trunker::{attach, restrict};

mod beta;
mod health;
mod middleware_auth;

pub use health::health;

use crate::state::{AppState, BETA_USERS_FLAG};

pub fn routes(state: AppState) -> Router {
    let trunker = state.trunker.clone();

    let api_router = Router::new()
        .route(
            "/beta",
            get(beta::beta_users).layer(middleware::from_fn_with_state(
                trunker.restrict(BETA_USERS_FLAG),
                restrict,
            )),
        )
        .layer(middleware::from_fn_with_state(state.clone(), middleware_auth::require_auth));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/flags", get(beta::flags))
        .route(
            "/beta-feature1",
            get(beta::feature1)
                .layer(middleware::from_fn_with_state(trunker.restrict("betaFeature1"), restrict)),
        )
        .route(
            "/beta-feature2",
            get(beta::feature2)
                .layer(middleware::from_fn_with_state(trunker.restrict("betaFeature2"), restrict)),
        )
        .route("/manual", get(beta::manual))
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(trunker, attach))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Feature flags gate the routes of this API"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::StatusCode,
    };
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use tower::ServiceExt;
    use trunker::TrunkerOptions;
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    fn app(beta_user: Uuid) -> Router {
        let config = Config {
            port: 0,
            jwt_secret: SECRET.to_string(),
            beta_users: vec![beta_user],
        };
        let options = TrunkerOptions::from_env(
            [
                ("TRUNKER_BETA_FEATURE1", "true"),
                ("TRUNKER_BETA_FEATURE2", "false"),
                ("HOME", "/root"),
            ],
            None,
        )
        .unwrap();
        routes(AppState::new(options, &config))
    }

    fn token(user_id: Uuid) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::hours(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    async fn send(app: Router, uri: &str, bearer: Option<String>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_counts_flags() {
        let (status, body) = send(app(Uuid::new_v4()), "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":200,"flags":3}"#);
    }

    #[tokio::test]
    async fn test_flags_route_echoes_snapshot() {
        let (status, body) = send(app(Uuid::new_v4()), "/flags", None).await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            value["flags"],
            serde_json::json!({
                "betaFeature1": { "active": true },
                "betaFeature2": { "active": false },
                "betaUsers": { "active": null },
            })
        );
    }

    #[tokio::test]
    async fn test_env_flags_gate_routes() {
        let (status, body) = send(app(Uuid::new_v4()), "/beta-feature1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hello, world! From /beta-feature1.");

        let (status, body) = send(app(Uuid::new_v4()), "/beta-feature2", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, r#"{"error":"Flag betaFeature2 is not active"}"#);
    }

    #[tokio::test]
    async fn test_manual_route() {
        let (status, body) = send(app(Uuid::new_v4()), "/manual", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hello, world! From /manual.");
    }

    #[tokio::test]
    async fn test_beta_users_flag_reads_authenticated_user() {
        let beta_user = Uuid::new_v4();
        let other_user = Uuid::new_v4();

        let (status, _) = send(app(beta_user), "/api/beta", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(app(beta_user), "/api/beta", Some(token(beta_user))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("Welcome to the beta, {beta_user}"));

        let (status, body) = send(app(beta_user), "/api/beta", Some(token(other_user))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, r#"{"error":"Flag betaUsers is not active"}"#);
    }
}
