//! Connection check: load `.env`, connect with the same strategy list the server uses,
//! and run a trivial query.
//!
//! Run from repo root: `cargo run -p check-connection`

use ventas_backend::{connect, init_tracing, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("warning: .env not loaded: {}", e);
    }
    init_tracing();

    let settings = Settings::from_env()?;
    tracing::info!(host = %settings.db.host, database = %settings.db.name, "connecting");
    let pool = connect(&settings.db).await?;
    tracing::info!("connection established");

    match sqlx::query_as::<_, (String,)>("SELECT version()")
        .fetch_one(&pool)
        .await
    {
        Ok((version,)) => tracing::info!("server version: {}", version),
        Err(e) => tracing::error!("test query failed: {}", e),
    }
    pool.close().await;
    Ok(())
}
