//! Connection bootstrap: open the environment's database, reconcile its schema and
//! register the pool. Runs once per process before the listener is bound.
//!
//! TLS policy is an ordered list of strategies tried in turn. With `DB_SSL_MODE=disable`
//! the only strategy is a plain connection. Otherwise the pinned CA is tried first and a
//! TLS connection without certificate verification is the fallback, so a managed
//! provider whose chain cannot be resolved locally stays reachable.

use crate::config::{DbSettings, Settings, SslMode};
use crate::environment::{EnvironmentKey, EnvironmentRegistry};
use crate::error::{AppError, AttemptError, ConnectError};
use crate::migration::reconcile;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

const PEM_CERT_MARKER: &str = "-----BEGIN CERTIFICATE-----";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectStrategy {
    /// No TLS.
    Plain,
    /// TLS verified against the CA bundle at this path.
    PinnedCa(PathBuf),
    /// TLS without certificate verification.
    SkipVerify,
}

impl fmt::Display for ConnectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectStrategy::Plain => f.write_str("plain"),
            ConnectStrategy::PinnedCa(path) => write!(f, "pinned-ca({})", path.display()),
            ConnectStrategy::SkipVerify => f.write_str("skip-verify"),
        }
    }
}

/// Strategies for `db`, in the order they are attempted.
pub fn strategies(db: &DbSettings) -> Vec<ConnectStrategy> {
    match db.ssl_mode {
        SslMode::Disable => vec![ConnectStrategy::Plain],
        SslMode::Enabled => vec![
            ConnectStrategy::PinnedCa(db.ca_path.clone()),
            ConnectStrategy::SkipVerify,
        ],
    }
}

/// Try `attempt` for each strategy in order; first success wins. When every strategy
/// fails the error lists all of them.
pub async fn run_strategies<H, F, Fut>(
    strategies: &[ConnectStrategy],
    mut attempt: F,
) -> Result<H, ConnectError>
where
    F: FnMut(ConnectStrategy) -> Fut,
    Fut: Future<Output = Result<H, String>>,
{
    if strategies.is_empty() {
        return Err(ConnectError::NoStrategy);
    }
    let mut failures = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        match attempt(strategy.clone()).await {
            Ok(handle) => {
                if !failures.is_empty() {
                    tracing::warn!(%strategy, "connected after falling back");
                }
                return Ok(handle);
            }
            Err(reason) => {
                tracing::warn!(%strategy, "connection attempt failed: {}", reason);
                failures.push(AttemptError {
                    strategy: strategy.clone(),
                    reason,
                });
            }
        }
    }
    Err(ConnectError::Exhausted(failures))
}

/// Base connect options for `db` without any TLS choice applied.
pub fn base_options(db: &DbSettings) -> PgConnectOptions {
    let mut opts = PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.password);
    if !db.name.is_empty() {
        opts = opts.database(&db.name);
    }
    opts
}

/// Load the pinned CA and make sure it holds at least one PEM certificate.
pub async fn check_ca_bundle(path: &Path) -> Result<(), String> {
    let pem = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("reading CA certificate {}: {}", path.display(), e))?;
    if !pem.contains(PEM_CERT_MARKER) {
        return Err(format!("no PEM certificate in {}", path.display()));
    }
    Ok(())
}

async fn connect_with(db: &DbSettings, strategy: ConnectStrategy) -> Result<PgPool, String> {
    let opts = match &strategy {
        ConnectStrategy::Plain => base_options(db).ssl_mode(PgSslMode::Disable),
        ConnectStrategy::PinnedCa(path) => {
            check_ca_bundle(path).await?;
            base_options(db)
                .ssl_mode(PgSslMode::VerifyFull)
                .ssl_root_cert(path)
        }
        ConnectStrategy::SkipVerify => base_options(db).ssl_mode(PgSslMode::Require),
    };
    PgPoolOptions::new()
        .max_connections(db.max_connections)
        .connect_with(opts)
        .await
        .map_err(|e| e.to_string())
}

/// Open a pool for `db`, walking the TLS strategies.
pub async fn connect(db: &DbSettings) -> Result<PgPool, ConnectError> {
    let plan = strategies(db);
    run_strategies(&plan, |strategy| connect_with(db, strategy)).await
}

/// Connect, reconcile the schema and register the pool under the process environment.
pub async fn bootstrap(
    settings: &Settings,
    registry: &EnvironmentRegistry,
) -> Result<EnvironmentKey, AppError> {
    let key = settings.environment();
    tracing::info!(environment = %key, host = %settings.db.host, "connecting to database");
    let pool = connect(&settings.db).await?;
    reconcile(&pool).await?;
    registry.register(key.clone(), pool)?;
    Ok(key)
}
