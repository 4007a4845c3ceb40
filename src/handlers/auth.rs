//! Login and user creation.

use crate::error::AppError;
use crate::extractors::Db;
use crate::models::{LoginRequest, LoginResponse, NewUsuario, Usuario};
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// POST /login: check credentials and issue a token carrying the user's role.
pub async fn login(
    State(state): State<AppState>,
    Db(pool): Db,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user: Option<Usuario> = sqlx::query_as("SELECT * FROM usuarios WHERE nombre = $1")
        .bind(&body.nombre)
        .fetch_optional(&pool)
        .await?;
    let user = match user {
        Some(u) if verify_password(&body.clave, &u.clave) => u,
        _ => {
            tracing::info!(nombre = %body.nombre, "login rejected");
            return Err(AppError::InvalidCredentials);
        }
    };
    let subject = u64::try_from(user.id)
        .map_err(|_| AppError::Internal(format!("user id out of range: {}", user.id)))?;
    let token = state.codec.issue(subject, &user.rol)?;
    Ok(Json(LoginResponse {
        token,
        rol: user.rol,
    }))
}

/// POST /usuarios: create a user. The role is stored as given.
pub async fn create_usuario(
    Db(pool): Db,
    Json(body): Json<NewUsuario>,
) -> Result<(StatusCode, Json<Usuario>), AppError> {
    if body.nombre.trim().is_empty() {
        return Err(AppError::Validation("nombre is required".into()));
    }
    if body.clave.is_empty() {
        return Err(AppError::Validation("clave is required".into()));
    }
    let hash = hash_password(&body.clave)?;
    let user: Usuario = sqlx::query_as(
        "INSERT INTO usuarios (nombre, clave, rol) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(body.nombre.trim())
    .bind(&hash)
    .bind(&body.rol)
    .fetch_one(&pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(format!("user already exists: {}", body.nombre.trim()))
        }
        other => AppError::Db(other),
    })?;
    tracing::info!(id = user.id, rol = %user.rol, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}
