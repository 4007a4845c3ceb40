//! Schema reconciliation for the record kinds: users, products, purchases and sales.
//! Idempotent: tables are created if missing and columns added if missing, so it can run
//! on every startup against an existing database.

use crate::error::AppError;
use sqlx::PgPool;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Column name and full SQL definition (type and constraints).
pub struct ColumnDef {
    pub name: &'static str,
    pub definition: &'static str,
}

pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

const fn col(name: &'static str, definition: &'static str) -> ColumnDef {
    ColumnDef { name, definition }
}

/// Known record kinds, in dependency order (referenced tables first).
pub const TABLES: &[TableDef] = &[
    TableDef {
        name: "usuarios",
        columns: &[
            col("id", "BIGSERIAL PRIMARY KEY"),
            col("nombre", "TEXT NOT NULL UNIQUE"),
            col("clave", "TEXT NOT NULL"),
            col("rol", "TEXT NOT NULL"),
            col("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
            col("updated_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
        ],
    },
    TableDef {
        name: "productos",
        columns: &[
            col("id", "BIGSERIAL PRIMARY KEY"),
            col("nombre", "TEXT NOT NULL"),
            col("costo", "DOUBLE PRECISION NOT NULL DEFAULT 0"),
            col("precio", "DOUBLE PRECISION NOT NULL DEFAULT 0"),
            col("stock", "INTEGER NOT NULL DEFAULT 0"),
            col("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
            col("updated_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
        ],
    },
    TableDef {
        name: "compras",
        columns: &[
            col("id", "BIGSERIAL PRIMARY KEY"),
            col("usuario_id", "BIGINT NOT NULL REFERENCES usuarios(id)"),
            col("producto_id", "BIGINT NOT NULL REFERENCES productos(id)"),
            col("cantidad", "INTEGER NOT NULL"),
            col("costo_unit", "DOUBLE PRECISION NOT NULL"),
            col("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
        ],
    },
    TableDef {
        name: "ventas",
        columns: &[
            col("id", "BIGSERIAL PRIMARY KEY"),
            col("usuario_id", "BIGINT NOT NULL REFERENCES usuarios(id)"),
            col("producto_id", "BIGINT NOT NULL REFERENCES productos(id)"),
            col("cantidad", "INTEGER NOT NULL"),
            col("descuento", "DOUBLE PRECISION NOT NULL DEFAULT 0"),
            col("precio_final", "DOUBLE PRECISION NOT NULL"),
            col("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
        ],
    },
];

pub fn create_table_sql(table: &TableDef) -> String {
    let cols: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote(c.name), c.definition))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote(table.name),
        cols.join(",\n    ")
    )
}

/// `ADD COLUMN IF NOT EXISTS` for every non-key column, for tables created by older builds.
pub fn add_column_sql(table: &TableDef) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|c| !c.definition.contains("PRIMARY KEY"))
        .map(|c| {
            format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
                quote(table.name),
                quote(c.name),
                c.definition
            )
        })
        .collect()
}

/// Bring `pool`'s schema up to date with [`TABLES`].
pub async fn reconcile(pool: &PgPool) -> Result<(), AppError> {
    for table in TABLES {
        sqlx::query(&create_table_sql(table)).execute(pool).await?;
        for sql in add_column_sql(table) {
            // Adding NOT NULL columns without defaults fails on populated tables; keep going.
            if let Err(e) = sqlx::query(&sql).execute(pool).await {
                tracing::warn!(table = table.name, "column reconciliation skipped: {}", e);
            }
        }
    }
    tracing::info!(tables = TABLES.len(), "schema reconciled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_tables_come_first() {
        let names: Vec<&str> = TABLES.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["usuarios", "productos", "compras", "ventas"]);
    }

    #[test]
    fn create_is_idempotent_ddl() {
        let sql = create_table_sql(&TABLES[1]);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"productos\""));
        assert!(sql.contains("\"stock\" INTEGER NOT NULL DEFAULT 0"));
    }

    #[test]
    fn add_columns_skip_primary_key() {
        let stmts = add_column_sql(&TABLES[0]);
        assert_eq!(stmts.len(), TABLES[0].columns.len() - 1);
        assert!(stmts.iter().all(|s| s.contains("ADD COLUMN IF NOT EXISTS")));
        assert!(!stmts.iter().any(|s| s.contains("\"id\"")));
    }
}
