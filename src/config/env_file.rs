//! Per-environment `.env` loading.

use std::path::{Path, PathBuf};

/// File holding the variables for `env`: `.env.prod`, `.env.qa`, or `.env`.
pub fn env_file_name(env: &str) -> &'static str {
    match env {
        "prod" => ".env.prod",
        "qa" => ".env.qa",
        _ => ".env",
    }
}

/// Load the env file for `env` from the working directory. A missing file is not an
/// error: CI and hosted deployments provide variables directly.
pub fn load_env(env: &str) -> Option<PathBuf> {
    load_env_from(Path::new("."), env)
}

pub fn load_env_from(dir: &Path, env: &str) -> Option<PathBuf> {
    let path = dir.join(env_file_name(env));
    match dotenvy::from_path(&path) {
        Ok(()) => {
            tracing::info!("loaded {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::warn!("{} not loaded (expected in CI/PROD): {}", path.display(), e);
            None
        }
    }
}
