//! HTTP handlers. Every handler that touches data takes a [`Db`](crate::extractors::Db),
//! so the database follows the request's environment.

pub mod auth;
pub mod movimientos;
pub mod productos;
