//! Environment registry: one database handle per deployment environment, chosen per request.

use crate::error::{AppError, ConfigurationError};
use sqlx::PgPool;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Logical deployment context that decides which database a request talks to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EnvironmentKey {
    Ci,
    Qa,
    Prod,
    /// Any other `APP_ENV` value (e.g. `dev`). Only reachable through bootstrap.
    Other(String),
}

impl EnvironmentKey {
    pub fn as_str(&self) -> &str {
        match self {
            EnvironmentKey::Ci => "ci",
            EnvironmentKey::Qa => "qa",
            EnvironmentKey::Prod => "prod",
            EnvironmentKey::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for EnvironmentKey {
    fn from(s: &str) -> Self {
        match s {
            "ci" => EnvironmentKey::Ci,
            "qa" => EnvironmentKey::Qa,
            "prod" => EnvironmentKey::Prod,
            other => EnvironmentKey::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EnvironmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the environment for a request. The CI flag wins over any header; otherwise
/// only an exact `prod` selects production and everything else falls back to QA.
pub fn select_key(ci: bool, requested: Option<&str>) -> EnvironmentKey {
    if ci {
        return EnvironmentKey::Ci;
    }
    match requested {
        Some("prod") => EnvironmentKey::Prod,
        _ => EnvironmentKey::Qa,
    }
}

/// Process-wide table of initialized database handles, filled during bootstrap and
/// read on every request. Generic over the handle so routing can be exercised
/// without a live database.
pub struct EnvironmentRegistry<H = PgPool> {
    ci: bool,
    handles: RwLock<HashMap<EnvironmentKey, H>>,
}

impl<H: Clone> EnvironmentRegistry<H> {
    pub fn new(ci: bool) -> Self {
        EnvironmentRegistry {
            ci,
            handles: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_ci(&self) -> bool {
        self.ci
    }

    /// Register the handle for `key`. Each key is written exactly once.
    pub fn register(&self, key: EnvironmentKey, handle: H) -> Result<(), ConfigurationError> {
        let mut handles = self.handles.write().map_err(|_| ConfigurationError::Poisoned)?;
        if handles.contains_key(&key) {
            return Err(ConfigurationError::AlreadyRegistered(key));
        }
        tracing::info!(environment = %key, "database registered");
        handles.insert(key, handle);
        Ok(())
    }

    pub fn get(&self, key: &EnvironmentKey) -> Result<H, ConfigurationError> {
        let handles = self.handles.read().map_err(|_| ConfigurationError::Poisoned)?;
        handles
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnregisteredEnvironment(key.clone()))
    }

    /// Resolve the handle for a request that asked for `requested` (the `X-Env` value).
    pub fn resolve(&self, requested: Option<&str>) -> Result<H, AppError> {
        let key = select_key(self.ci, requested);
        self.get(&key).map_err(|e| {
            tracing::error!(environment = %key, "request routed to an environment with no database");
            AppError::from(e)
        })
    }

    pub fn keys(&self) -> Vec<EnvironmentKey> {
        self.handles
            .read()
            .map(|h| h.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().map(|h| h.is_empty()).unwrap_or(true)
    }
}

impl<H: Clone> Default for EnvironmentRegistry<H> {
    fn default() -> Self {
        Self::new(false)
    }
}
