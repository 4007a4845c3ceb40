//! Shared application state for all routes. Built once at startup, cloned per request.

use crate::config::Settings;
use crate::environment::EnvironmentRegistry;
use crate::token::TokenCodec;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Database handle per environment, filled by bootstrap before serving.
    pub registry: Arc<EnvironmentRegistry>,
    pub codec: Arc<TokenCodec>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(registry: EnvironmentRegistry, settings: Settings) -> Self {
        AppState {
            registry: Arc::new(registry),
            codec: Arc::new(TokenCodec::new(&settings.jwt_secret)),
            settings: Arc::new(settings),
        }
    }
}
