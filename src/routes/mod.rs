//! Router assembly: routes, CORS, request tracing and the JSON 404 fallback.

pub mod api;
pub mod common;

use crate::error::AppError;
use crate::state::AppState;
use axum::http::{header, HeaderName, HeaderValue, Method, Uri};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body; every payload here is a small JSON object.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub use api::api_routes;
pub use common::common_routes;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-env"),
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes())
        .merge(api_routes(&state))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors_layer(&state.settings.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::environment::EnvironmentRegistry;
    use crate::extractors::auth::ROLE_BUYER;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn state(vars: &[(&str, &str)]) -> AppState {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let settings = Settings::from_lookup(|k| map.get(k).cloned()).unwrap();
        AppState::new(EnvironmentRegistry::new(settings.ci), settings)
    }

    fn guarded_app() -> (Router, AppState) {
        let st = state(&[("AUTH_ENABLED", "true"), ("JWT_SECRET", "test-secret-key")]);
        (app(st.clone()), st)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn healthz_get_returns_ok() {
        let resp = app(state(&[]))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn healthz_head_returns_ok() {
        let req = Request::builder()
            .method("HEAD")
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let resp = app(state(&[])).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn healthz_needs_no_token_even_with_auth_enabled() {
        let (app, _) = guarded_app();
        let resp = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_allows_deployed_frontend_origin() {
        let req = Request::builder()
            .uri("/healthz")
            .header(header::ORIGIN, "https://frontqa-t0a9.onrender.com")
            .body(Body::empty())
            .unwrap();
        let resp = app(state(&[])).oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://frontqa-t0a9.onrender.com"
        );
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let req = Request::builder().uri("/invalid/route").body(Body::empty()).unwrap();
        let (status, body) = send(app(state(&[])), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn data_route_without_registered_environment_is_500() {
        let req = Request::builder().uri("/productos").body(Body::empty()).unwrap();
        let (status, body) = send(app(state(&[])), req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "config_error");
        assert!(body["error"]["message"].as_str().unwrap().contains("'qa'"));
    }

    #[tokio::test]
    async fn prod_header_routes_to_prod() {
        let req = Request::builder()
            .uri("/productos")
            .header("X-Env", "prod")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(app(state(&[])), req).await;
        assert!(body["error"]["message"].as_str().unwrap().contains("'prod'"));
    }

    #[tokio::test]
    async fn ci_flag_ignores_env_header() {
        let req = Request::builder()
            .uri("/productos")
            .header("X-Env", "prod")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(app(state(&[("CI", "true")])), req).await;
        assert!(body["error"]["message"].as_str().unwrap().contains("'ci'"));
    }

    #[tokio::test]
    async fn guarded_route_rejects_missing_token() {
        let (app, _) = guarded_app();
        let (status, body) = send(app, post_json("/ventas", None, "{}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "missing_token");
    }

    #[tokio::test]
    async fn guarded_route_rejects_wrong_role() {
        let (app, st) = guarded_app();
        let token = st.codec.issue(1, ROLE_BUYER).unwrap();
        let (status, body) = send(app, post_json("/ventas", Some(&token), "{}")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "forbidden");
    }

    #[tokio::test]
    async fn guarded_route_lets_accepted_role_through_to_the_handler() {
        let (app, st) = guarded_app();
        let token = st.codec.issue(1, "vendedor").unwrap();
        let body = r#"{"producto_id": 1, "cantidad": 1}"#;
        let (status, body) = send(app, post_json("/ventas", Some(&token), body)).await;
        // Past the guard; fails only because no database is registered.
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "config_error");
    }

    #[tokio::test]
    async fn product_listing_stays_public_when_creation_is_guarded() {
        let (app, _) = guarded_app();
        let req = Request::builder().uri("/productos").body(Body::empty()).unwrap();
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let (status, _) = send(app, post_json("/productos", None, "{}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_routing() {
        let payload = "x".repeat(MAX_BODY_BYTES + 1);
        let req = Request::builder()
            .method("POST")
            .uri("/productos")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, payload.len())
            .body(Body::from(payload))
            .unwrap();
        let resp = app(state(&[])).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn routes_are_open_when_auth_disabled() {
        let (status, body) = send(app(state(&[])), post_json("/usuarios", None, "{}")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "config_error");
    }
}
