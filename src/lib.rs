//! Ventas backend: multi-environment sales and inventory REST service.

pub mod bootstrap;
pub mod config;
pub mod environment;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod password;
pub mod routes;
pub mod state;
pub mod token;

pub use bootstrap::{bootstrap, connect, ConnectStrategy};
pub use config::{load_env, startup_environment, Settings};
pub use environment::{EnvironmentKey, EnvironmentRegistry};
pub use error::{AppError, ConfigurationError, ConnectError};
pub use extractors::{AccessGuard, Identity};
pub use migration::reconcile;
pub use routes::app;
pub use state::AppState;
pub use token::{Claims, TokenCodec};

/// Install the global `tracing` subscriber (`RUST_LOG`, default `ventas_backend=info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ventas_backend=info,tower_http=info")),
        )
        .init();
}
