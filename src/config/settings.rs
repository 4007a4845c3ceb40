//! Typed process settings read from environment variables.

use crate::environment::EnvironmentKey;
use crate::error::ConfigurationError;
use std::path::PathBuf;

/// Pinned CA bundle expected next to the binary when TLS is on.
pub const DEFAULT_CA_PATH: &str = "BaltimoreCyberTrustRoot.crt.pem";

/// Origins allowed by CORS when `CORS_ORIGINS` is unset: local frontend, e2e runner and
/// the deployed QA and PROD frontends.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    "https://frontqa-t0a9.onrender.com",
    "https://frontqa.onrender.com",
];

/// TLS mode for the database connection, from `DB_SSL_MODE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SslMode {
    /// `disable`: plain TCP (CI and local).
    Disable,
    /// Anything else: pinned CA first, then unverified TLS.
    Enabled,
}

impl SslMode {
    fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("disable") {
            SslMode::Disable
        } else {
            SslMode::Enabled
        }
    }
}

#[derive(Clone)]
pub struct DbSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub ssl_mode: SslMode,
    pub ca_path: PathBuf,
    pub max_connections: u32,
}

impl std::fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSettings")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("ca_path", &self.ca_path)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Clone)]
pub struct Settings {
    pub db: DbSettings,
    pub jwt_secret: String,
    /// Raw `APP_ENV`; empty when unset.
    pub app_env: String,
    /// `CI=true` pins every request to the CI database.
    pub ci: bool,
    pub port: u16,
    /// Wrap the mutating routes in the access guard.
    pub auth_enabled: bool,
    pub cors_origins: Vec<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("db", &self.db)
            .field("jwt_secret", &"[REDACTED]")
            .field("app_env", &self.app_env)
            .field("ci", &self.ci)
            .field("port", &self.port)
            .field("auth_enabled", &self.auth_enabled)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source (process env, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).unwrap_or_default();
        let db = DbSettings {
            user: var("DB_USER"),
            password: var("DB_PASS"),
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or("DB_PORT", lookup("DB_PORT"), 5432)?,
            name: var("DB_NAME"),
            ssl_mode: SslMode::parse(&var("DB_SSL_MODE")),
            ca_path: lookup("DB_SSL_CA")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CA_PATH)),
            max_connections: parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), 5)?,
        };
        let cors_origins = match lookup("CORS_ORIGINS").filter(|s| !s.trim().is_empty()) {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };
        Ok(Settings {
            db,
            jwt_secret: var("JWT_SECRET"),
            app_env: var("APP_ENV").trim().to_string(),
            ci: lookup("CI").as_deref() == Some("true"),
            port: parse_or("PORT", lookup("PORT"), 8080)?,
            auth_enabled: lookup("AUTH_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            cors_origins,
        })
    }

    /// Environment this process bootstraps: `ci` under CI, else `APP_ENV`, else `qa`.
    pub fn environment(&self) -> EnvironmentKey {
        startup_environment(self.ci, &self.app_env)
    }
}

/// Environment chosen at startup from the CI flag and `APP_ENV`.
pub fn startup_environment(ci: bool, app_env: &str) -> EnvironmentKey {
    if ci {
        EnvironmentKey::Ci
    } else if app_env.is_empty() {
        EnvironmentKey::Qa
    } else {
        EnvironmentKey::from(app_env)
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigurationError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s.parse().map_err(|_| ConfigurationError::Invalid {
            name,
            value: s.to_string(),
        }),
    }
}
