//! Stock movements: purchases add stock, sales remove it.

use crate::error::AppError;
use crate::extractors::{Db, Identity};
use crate::models::{precio_bruto, precio_final, Compra, NewCompra, NewVenta, Venta};
use axum::{http::StatusCode, Json};

/// Acting user: the authenticated subject when the route is guarded, else the body's id.
fn acting_user(identity: Option<Identity>, from_body: Option<i64>) -> Result<i64, AppError> {
    match identity {
        Some(id) => i64::try_from(id.subject)
            .map_err(|_| AppError::BadRequest(format!("subject out of range: {}", id.subject))),
        None => from_body.ok_or_else(|| AppError::Validation("usuario_id is required".into())),
    }
}

/// Discount is an amount off the sale total: never negative, never above the total.
fn check_discount(descuento: f64, bruto: f64) -> Result<(), AppError> {
    if !(0.0..=bruto).contains(&descuento) {
        return Err(AppError::Validation(format!(
            "descuento must be between 0 and {}",
            bruto
        )));
    }
    Ok(())
}

fn positive_quantity(cantidad: i32) -> Result<(), AppError> {
    if cantidad <= 0 {
        return Err(AppError::Validation("cantidad must be greater than 0".into()));
    }
    Ok(())
}

/// POST /compras
pub async fn registrar_compra(
    identity: Option<Identity>,
    Db(pool): Db,
    Json(body): Json<NewCompra>,
) -> Result<(StatusCode, Json<Compra>), AppError> {
    positive_quantity(body.cantidad)?;
    let usuario_id = acting_user(identity, body.usuario_id)?;

    let mut tx = pool.begin().await?;
    let updated: Option<(i64,)> = sqlx::query_as(
        "UPDATE productos SET stock = stock + $2, updated_at = NOW() WHERE id = $1 RETURNING id",
    )
    .bind(body.producto_id)
    .bind(body.cantidad)
    .fetch_optional(&mut *tx)
    .await?;
    if updated.is_none() {
        return Err(AppError::NotFound(format!("producto {}", body.producto_id)));
    }
    let compra: Compra = sqlx::query_as(
        "INSERT INTO compras (usuario_id, producto_id, cantidad, costo_unit) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(usuario_id)
    .bind(body.producto_id)
    .bind(body.cantidad)
    .bind(body.costo_unit)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    tracing::info!(producto_id = compra.producto_id, cantidad = compra.cantidad, "purchase recorded");
    Ok((StatusCode::CREATED, Json(compra)))
}

/// POST /ventas. Fails with 409 when stock does not cover the quantity.
pub async fn registrar_venta(
    identity: Option<Identity>,
    Db(pool): Db,
    Json(body): Json<NewVenta>,
) -> Result<(StatusCode, Json<Venta>), AppError> {
    positive_quantity(body.cantidad)?;
    if body.descuento < 0.0 {
        return Err(AppError::Validation("descuento must not be negative".into()));
    }
    let usuario_id = acting_user(identity, body.usuario_id)?;

    let mut tx = pool.begin().await?;
    let exists: Option<(i32,)> = sqlx::query_as("SELECT stock FROM productos WHERE id = $1 FOR UPDATE")
        .bind(body.producto_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("producto {}", body.producto_id)));
    }
    let updated: Option<(f64,)> = sqlx::query_as(
        "UPDATE productos SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2 RETURNING precio",
    )
    .bind(body.producto_id)
    .bind(body.cantidad)
    .fetch_optional(&mut *tx)
    .await?;
    let (precio,) = updated.ok_or_else(|| AppError::Conflict("insufficient stock".into()))?;
    check_discount(body.descuento, precio_bruto(precio, body.cantidad))?;
    let venta: Venta = sqlx::query_as(
        "INSERT INTO ventas (usuario_id, producto_id, cantidad, descuento, precio_final) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(usuario_id)
    .bind(body.producto_id)
    .bind(body.cantidad)
    .bind(body.descuento)
    .bind(precio_final(precio, body.cantidad, body.descuento))
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    tracing::info!(producto_id = venta.producto_id, cantidad = venta.cantidad, "sale recorded");
    Ok((StatusCode::CREATED, Json(venta)))
}
