//! Business routes. Mutating routes sit behind the access guard when `AUTH_ENABLED` is set.

use crate::extractors::auth::{ROLE_ADMIN, ROLE_BUYER, ROLE_SELLER};
use crate::extractors::{guard, AccessGuard};
use crate::handlers::{auth, movimientos, productos};
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, MethodRouter},
    Router,
};

/// Roles accepted per protected route.
pub const USUARIOS_ROLES: &[&str] = &[ROLE_ADMIN];
pub const PRODUCTOS_ROLES: &[&str] = &[ROLE_SELLER, ROLE_BUYER];
pub const COMPRAS_ROLES: &[&str] = &[ROLE_BUYER, ROLE_SELLER];
pub const VENTAS_ROLES: &[&str] = &[ROLE_SELLER];

fn protect(
    method: MethodRouter<AppState>,
    state: &AppState,
    roles: &[&str],
) -> MethodRouter<AppState> {
    if !state.settings.auth_enabled {
        return method;
    }
    method.route_layer(from_fn_with_state(
        AccessGuard::new(state.codec.clone(), roles),
        guard,
    ))
}

pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route(
            "/usuarios",
            protect(post(auth::create_usuario), state, USUARIOS_ROLES),
        )
        .route(
            "/productos",
            get(productos::list).merge(protect(post(productos::create), state, PRODUCTOS_ROLES)),
        )
        .route(
            "/compras",
            protect(post(movimientos::registrar_compra), state, COMPRAS_ROLES),
        )
        .route(
            "/ventas",
            protect(post(movimientos::registrar_venta), state, VENTAS_ROLES),
        )
}
