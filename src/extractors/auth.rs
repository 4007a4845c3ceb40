//! Access guard: bearer-token authentication and role check in front of protected routes.
//!
//! Outcomes, in order: no `Authorization: Bearer ...` header is 401 (missing token), a token
//! that fails verification is 401 (invalid token), a valid token whose role is not accepted
//! by the route is 403, and anything else proceeds with an [`Identity`] in the request
//! extensions.

use crate::error::AppError;
use crate::token::TokenCodec;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub const ROLE_ADMIN: &str = "administrador";
pub const ROLE_SELLER: &str = "vendedor";
pub const ROLE_BUYER: &str = "comprador";

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller, available to handlers behind the guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub subject: u64,
    pub role: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AppError::MissingToken)
    }
}

/// Guard configuration for one route: the codec and the roles it accepts.
#[derive(Clone, Debug)]
pub struct AccessGuard {
    codec: Arc<TokenCodec>,
    roles: Arc<[String]>,
}

impl AccessGuard {
    pub fn new(codec: Arc<TokenCodec>, roles: &[&str]) -> Self {
        AccessGuard {
            codec,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Authenticate and authorize from request headers.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Identity, AppError> {
        let token = bearer_token(headers).ok_or(AppError::MissingToken)?;
        let claims = self.codec.verify(token)?;
        if !self.roles.iter().any(|r| *r == claims.role) {
            tracing::debug!(role = %claims.role, subject = claims.subject, "role not accepted");
            return Err(AppError::Forbidden);
        }
        Ok(Identity {
            subject: claims.subject,
            role: claims.role,
        })
    }
}

/// Token from `Authorization: Bearer <token>`, if the header has that shape.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware body; mount with `axum::middleware::from_fn_with_state(guard_config, guard)`.
pub async fn guard(State(access): State<AccessGuard>, mut req: Request, next: Next) -> Response {
    match access.authorize(req.headers()) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-key";

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(SECRET))
    }

    fn protected(roles: &[&str]) -> Router {
        async fn whoami(identity: Identity) -> String {
            format!("{}:{}", identity.subject, identity.role)
        }
        Router::new()
            .route("/protected", get(whoami))
            .layer(from_fn_with_state(AccessGuard::new(codec(), roles), guard))
    }

    async fn call(app: Router, auth: Option<String>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/protected");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let resp = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn rejects_request_without_token() {
        let (status, body) = call(protected(&["admin"]), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing token"));
    }

    #[tokio::test]
    async fn rejects_header_without_bearer_prefix() {
        let (status, body) = call(protected(&["admin"]), Some("invalid-token".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing token"));
    }

    #[tokio::test]
    async fn rejects_invalid_token() {
        let (status, body) = call(protected(&["admin"]), Some("Bearer token-invalido".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("invalid token"));
    }

    #[tokio::test]
    async fn rejects_token_signed_with_other_secret() {
        let token = TokenCodec::new("other").issue(1, "admin").unwrap();
        let (status, _) = call(protected(&["admin"]), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn accepts_token_with_allowed_role() {
        let token = codec().issue(1, "admin").unwrap();
        let (status, body) = call(protected(&["admin"]), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1:admin");
    }

    #[tokio::test]
    async fn rejects_valid_token_with_wrong_role() {
        let token = codec().issue(1, ROLE_SELLER).unwrap();
        let (status, body) = call(protected(&["admin"]), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("access denied"));
    }

    #[tokio::test]
    async fn accepts_any_of_several_roles() {
        let token = codec().issue(42, ROLE_SELLER).unwrap();
        let app = protected(&["admin", ROLE_SELLER]);
        let (status, body) = call(app, Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "42:vendedor");
    }

    #[test]
    fn bearer_token_requires_prefix() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn authorize_reports_each_failure_class() {
        let guard = AccessGuard::new(codec(), &[ROLE_ADMIN]);
        let mut headers = HeaderMap::new();
        assert!(matches!(guard.authorize(&headers), Err(AppError::MissingToken)));
        headers.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert!(matches!(guard.authorize(&headers), Err(AppError::InvalidToken)));
        let token = codec().issue(3, ROLE_BUYER).unwrap();
        headers.insert(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        assert!(matches!(guard.authorize(&headers), Err(AppError::Forbidden)));
    }
}
