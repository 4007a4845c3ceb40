//! Product catalog.

use crate::error::AppError;
use crate::extractors::Db;
use crate::models::{NewProducto, Producto};
use axum::{http::StatusCode, Json};

/// GET|HEAD /productos
pub async fn list(Db(pool): Db) -> Result<Json<Vec<Producto>>, AppError> {
    let rows: Vec<Producto> = sqlx::query_as("SELECT * FROM productos ORDER BY id")
        .fetch_all(&pool)
        .await?;
    Ok(Json(rows))
}

/// POST /productos
pub async fn create(
    Db(pool): Db,
    Json(body): Json<NewProducto>,
) -> Result<(StatusCode, Json<Producto>), AppError> {
    if body.nombre.trim().is_empty() {
        return Err(AppError::Validation("nombre is required".into()));
    }
    let row: Producto = sqlx::query_as(
        "INSERT INTO productos (nombre, costo, precio, stock) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(body.nombre.trim())
    .bind(body.costo)
    .bind(body.precio)
    .bind(body.stock)
    .fetch_one(&pool)
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}
