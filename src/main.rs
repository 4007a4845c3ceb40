//! Server entry point: pick the environment, load its env file, bootstrap the database,
//! then serve. Bootstrap failures exit before the listener is bound.

use tokio::net::TcpListener;
use ventas_backend::{
    app, bootstrap, init_tracing, load_env, startup_environment, AppState, EnvironmentRegistry,
    Settings,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let ci = std::env::var("CI").as_deref() == Ok("true");
    let app_env = std::env::var("APP_ENV").unwrap_or_default();
    let env = startup_environment(ci, app_env.trim());
    tracing::info!(environment = %env, "starting backend");
    load_env(env.as_str());

    let settings = Settings::from_env()?;
    let registry = EnvironmentRegistry::new(settings.ci);
    let key = bootstrap(&settings, &registry).await.map_err(|e| {
        tracing::error!("bootstrap failed: {}", e);
        e
    })?;
    tracing::info!(environment = %key, auth = settings.auth_enabled, "database ready");

    let port = settings.port;
    let state = AppState::new(registry, settings);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
