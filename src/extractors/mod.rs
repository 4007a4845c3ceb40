//! Request extractors and guards.

pub mod auth;
pub mod environment;

pub use auth::{guard, AccessGuard, Identity};
pub use environment::{Db, EnvSelector, ENV_HEADER};
