//! Extract the requested environment (`X-Env` header) and resolve the request's database.

use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use sqlx::PgPool;

/// Header naming the environment a request targets. Only `prod` is significant.
pub const ENV_HEADER: &str = "X-Env";

/// Extractor for the optional `X-Env` value.
#[derive(Clone, Debug)]
pub struct EnvSelector(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for EnvSelector
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ENV_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(EnvSelector(value))
    }
}

/// Database pool for the environment this request resolves to.
/// Rejects with a configuration error (500) when that environment was never bootstrapped.
pub struct Db(pub PgPool);

#[async_trait]
impl FromRequestParts<AppState> for Db {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let EnvSelector(requested) = EnvSelector::from_request_parts(parts, state)
            .await
            .unwrap_or(EnvSelector(None));
        state.registry.resolve(requested.as_deref()).map(Db)
    }
}
