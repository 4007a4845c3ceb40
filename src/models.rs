//! Record kinds stored per environment, and the request bodies that create them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Usuario {
    pub id: i64,
    pub nombre: String,
    #[serde(skip_serializing)]
    pub clave: String,
    pub rol: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Producto {
    pub id: i64,
    pub nombre: String,
    pub costo: f64,
    pub precio: f64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Compra {
    pub id: i64,
    pub usuario_id: i64,
    pub producto_id: i64,
    pub cantidad: i32,
    pub costo_unit: f64,
    pub created_at: DateTime<Utc>,
}

impl Compra {
    pub fn costo_total(&self) -> f64 {
        f64::from(self.cantidad) * self.costo_unit
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Venta {
    pub id: i64,
    pub usuario_id: i64,
    pub producto_id: i64,
    pub cantidad: i32,
    pub descuento: f64,
    pub precio_final: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub nombre: String,
    pub clave: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub rol: String,
}

#[derive(Debug, Deserialize)]
pub struct NewUsuario {
    pub nombre: String,
    pub clave: String,
    pub rol: String,
}

#[derive(Debug, Deserialize)]
pub struct NewProducto {
    pub nombre: String,
    pub costo: f64,
    pub precio: f64,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Deserialize)]
pub struct NewCompra {
    /// Ignored when the request carries an authenticated identity.
    pub usuario_id: Option<i64>,
    pub producto_id: i64,
    pub cantidad: i32,
    pub costo_unit: f64,
}

#[derive(Debug, Deserialize)]
pub struct NewVenta {
    pub usuario_id: Option<i64>,
    pub producto_id: i64,
    pub cantidad: i32,
    /// Amount taken off the sale total.
    #[serde(default)]
    pub descuento: f64,
}

/// Sale total before discount.
pub fn precio_bruto(precio: f64, cantidad: i32) -> f64 {
    precio * f64::from(cantidad)
}

/// Sale total: `precio * cantidad` minus the absolute `descuento`.
pub fn precio_final(precio: f64, cantidad: i32, descuento: f64) -> f64 {
    precio_bruto(precio, cantidad) - descuento
}
