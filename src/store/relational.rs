//! C6: relational store adapter — dynamic per-attribute tables plus the
//! two bookkeeping tables shared by every entity (§3, §4.6). Real,
//! runnable SQL against Postgres via `sqlx`, following
//! `entity-gateway::refresh::postgres::RefreshPipeline`'s idiom:
//! `PgPool`, dynamic query strings assembled from sanitized
//! identifiers, and `Row`/`try_get` to pull typed cells back out.

use std::collections::HashMap;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::inference::ColumnType;
use crate::model::{RawValue, ScalarValue};
use crate::sanitize::sanitize_identifier;
use crate::schema::{ColumnSchema, SchemaInfo};
use crate::{EntityError, Result};

/// Bookkeeping table names, process-wide and fixed (§3).
const MAPPING_TABLE: &str = "attribute_tables";
const SCHEMA_TABLE: &str = "table_schemas";

/// A row of the `(entity_id, attribute_name) -> (table_name, version)`
/// mapping table. `entity_attribute_id` is the surrogate key every
/// backing table's rows carry as a foreign key (§3).
#[derive(Debug, Clone)]
pub struct MappingRow {
    pub entity_attribute_id: i32,
    pub table_name: String,
    pub schema_version: i32,
}

pub struct RelationalStore {
    pool: PgPool,
}

impl RelationalStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(database_url, 10, 1, 300, 1800).await
    }

    /// Like [`connect`](Self::connect), but with pool bounds read from
    /// `ServiceConfig::relational` rather than the teacher's hardcoded
    /// defaults (§5: "`sqlx::PgPoolOptions` bounds ... for the
    /// pooled-connection requirement").
    pub async fn connect_with(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        idle_timeout_secs: u64,
        max_lifetime_secs: u64,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .idle_timeout(std::time::Duration::from_secs(idle_timeout_secs))
            .max_lifetime(std::time::Duration::from_secs(max_lifetime_secs))
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.bootstrap().await?;
        Ok(store)
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the two process-wide bookkeeping tables if absent (§3).
    pub async fn bootstrap(&self) -> Result<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {MAPPING_TABLE} (
                entity_attribute_id SERIAL PRIMARY KEY,
                entity_id TEXT NOT NULL,
                attribute_name TEXT NOT NULL,
                table_name TEXT NOT NULL,
                schema_version INTEGER NOT NULL,
                UNIQUE (entity_id, attribute_name)
            )"
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {SCHEMA_TABLE} (
                table_name TEXT NOT NULL,
                schema_version INTEGER NOT NULL,
                schema_json JSONB NOT NULL,
                UNIQUE (table_name, schema_version)
            )"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_mapping(
        &self,
        entity_id: &str,
        attribute_name: &str,
    ) -> Result<Option<MappingRow>> {
        let row = sqlx::query(&format!(
            "SELECT entity_attribute_id, table_name, schema_version FROM {MAPPING_TABLE}
             WHERE entity_id = $1 AND attribute_name = $2"
        ))
        .bind(entity_id)
        .bind(attribute_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| MappingRow {
            entity_attribute_id: r.get("entity_attribute_id"),
            table_name: r.get("table_name"),
            schema_version: r.get("schema_version"),
        }))
    }

    /// Inserts a fresh `(entity_id, attribute_name) -> (table_name,
    /// version=1)` mapping. If a concurrent writer won the race on the
    /// unique constraint, the conflict is swallowed and the existing
    /// row is returned instead — the loser proceeds down the
    /// compatibility path as §5 requires, rather than erroring.
    pub async fn insert_mapping_if_absent(
        &self,
        entity_id: &str,
        attribute_name: &str,
        table_name: &str,
    ) -> Result<MappingRow> {
        let inserted = sqlx::query(&format!(
            "INSERT INTO {MAPPING_TABLE} (entity_id, attribute_name, table_name, schema_version)
             VALUES ($1, $2, $3, 1)
             ON CONFLICT (entity_id, attribute_name) DO NOTHING
             RETURNING entity_attribute_id, table_name, schema_version"
        ))
        .bind(entity_id)
        .bind(attribute_name)
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(MappingRow {
                entity_attribute_id: row.get("entity_attribute_id"),
                table_name: row.get("table_name"),
                schema_version: row.get("schema_version"),
            });
        }

        self.get_mapping(entity_id, attribute_name)
            .await?
            .ok_or_else(|| {
                EntityError::StoreUnavailable(
                    "mapping insert conflicted but no row could be read back".to_string(),
                )
            })
    }

    pub async fn bump_schema_version(
        &self,
        entity_id: &str,
        attribute_name: &str,
        new_version: i32,
    ) -> Result<()> {
        sqlx::query(&format!(
            "UPDATE {MAPPING_TABLE} SET schema_version = $1
             WHERE entity_id = $2 AND attribute_name = $3"
        ))
        .bind(new_version)
        .bind(entity_id)
        .bind(attribute_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn put_schema_version(
        &self,
        table_name: &str,
        version: i32,
        schema: &SchemaInfo,
    ) -> Result<()> {
        let schema_json = serde_json::to_value(schema)
            .map_err(|e| EntityError::InvalidArgument(format!("schema serialization: {e}")))?;

        sqlx::query(&format!(
            "INSERT INTO {SCHEMA_TABLE} (table_name, schema_version, schema_json)
             VALUES ($1, $2, $3)
             ON CONFLICT (table_name, schema_version) DO NOTHING"
        ))
        .bind(table_name)
        .bind(version)
        .bind(schema_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The stored schema at the highest recorded version for a table.
    pub async fn get_latest_schema(&self, table_name: &str) -> Result<Option<(i32, SchemaInfo)>> {
        let row = sqlx::query(&format!(
            "SELECT schema_version, schema_json FROM {SCHEMA_TABLE}
             WHERE table_name = $1 ORDER BY schema_version DESC LIMIT 1"
        ))
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let version: i32 = row.get("schema_version");
        let schema_json: serde_json::Value = row.get("schema_json");
        let schema: SchemaInfo = serde_json::from_value(schema_json)
            .map_err(|e| EntityError::StoreUnavailable(format!("corrupt schema row: {e}")))?;
        Ok(Some((version, schema)))
    }

    /// `table_exists` — queried via `to_regclass`, matching Postgres's
    /// own idiom for "does this relation exist" without catalog joins.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT to_regclass($1) IS NOT NULL AS exists")
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("exists"))
    }

    /// Materializes a backing table for a tabular attribute's schema
    /// (§3, §4.7 step 4). Column identifiers are sanitized again here
    /// as a defense even though callers are expected to have already
    /// sanitized them (§3's "must be applied ... before it reaches the
    /// relational layer").
    pub async fn create_table(&self, table_name: &str, schema: &SchemaInfo) -> Result<()> {
        let mut column_defs = vec![
            "id BIGSERIAL PRIMARY KEY".to_string(),
            format!("entity_attribute_id INTEGER NOT NULL REFERENCES {MAPPING_TABLE}(entity_attribute_id)"),
        ];
        for col in &schema.columns {
            let name = sanitize_identifier(&col.name);
            let sql_ty = sql_type_for(col.ty);
            let nullability = if col.is_nullable { "" } else { " NOT NULL" };
            column_defs.push(format!("{name} {sql_ty}{nullability}"));
        }
        column_defs.push("created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT now()".to_string());

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table_name} ({})",
            column_defs.join(", ")
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    /// Appends rows to a backing table in a single statement, so the
    /// batch is atomic (§4.6). `columns` gives the schema's column
    /// order; `rows` are the already-validated cells in that order.
    pub async fn insert_rows(
        &self,
        table_name: &str,
        entity_attribute_id: i32,
        columns: &[ColumnSchema],
        rows: &[Vec<ScalarValue>],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let sanitized_cols: Vec<String> = columns
            .iter()
            .map(|c| sanitize_identifier(&c.name))
            .collect();

        let mut column_list = vec!["entity_attribute_id".to_string()];
        column_list.extend(sanitized_cols.clone());

        let mut placeholders = Vec::with_capacity(rows.len());
        let mut bind_count = 1usize;
        let mut values_sql = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row_placeholders = Vec::with_capacity(row.len() + 1);
            for _ in 0..=row.len() {
                row_placeholders.push(format!("${bind_count}"));
                bind_count += 1;
            }
            values_sql.push(format!("({})", row_placeholders.join(", ")));
            placeholders.push(row_placeholders);
        }

        let sql = format!(
            "INSERT INTO {table_name} ({}) VALUES {}",
            column_list.join(", "),
            values_sql.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for row in rows {
            query = query.bind(entity_attribute_id);
            for (cell, col) in row.iter().zip(columns) {
                query = bind_scalar(query, cell, col.ty);
            }
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    /// `get_data(table, filters?, projection?)` (§4.6 read path): a
    /// fresh tabular `RawValue`. Bookkeeping columns (`entity_attribute_id`,
    /// `created_at`) are hidden unless explicitly named in `projection`.
    pub async fn get_data(
        &self,
        table_name: &str,
        schema: &SchemaInfo,
        filters: Option<&HashMap<String, String>>,
        projection: Option<&[String]>,
    ) -> Result<RawValue> {
        let all_columns: Vec<String> = schema.columns.iter().map(|c| c.name.clone()).collect();
        let selected: Vec<String> = match projection {
            Some(cols) if !cols.is_empty() => cols.to_vec(),
            _ => all_columns.clone(),
        };

        let select_list: Vec<String> = selected
            .iter()
            .map(|c| sanitize_identifier(c))
            .collect();

        let mut sql = format!(
            "SELECT {} FROM {table_name}",
            select_list.join(", ")
        );

        let mut binds: Vec<String> = Vec::new();
        if let Some(filters) = filters {
            if !filters.is_empty() {
                let mut clauses = Vec::new();
                for (idx, (col, value)) in filters.iter().enumerate() {
                    clauses.push(format!("{} = ${}", sanitize_identifier(col), idx + 1));
                    binds.push(value.clone());
                }
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
        }

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut out_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(selected.len());
            for col_name in &selected {
                let ty = bookkeeping_column_type(col_name)
                    .or_else(|| schema.column(col_name).map(|c| c.ty))
                    .unwrap_or(ColumnType::String);
                cells.push(extract_scalar(row, col_name, ty));
            }
            out_rows.push(cells);
        }

        Ok(RawValue::Tabular {
            columns: selected,
            rows: out_rows,
        })
    }
}

/// The SQL type of the two fixed bookkeeping columns every backing
/// table carries (§4.6), so an explicit projection naming them reads
/// back the real `INTEGER`/`TIMESTAMPTZ` value instead of guessing
/// `ColumnType::String` and getting `Null` back from a failed
/// `try_get`.
fn bookkeeping_column_type(col: &str) -> Option<ColumnType> {
    match col {
        "entity_attribute_id" => Some(ColumnType::Int),
        "created_at" => Some(ColumnType::Datetime),
        _ => None,
    }
}

fn sql_type_for(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Int => "INTEGER",
        ColumnType::Float => "DOUBLE PRECISION",
        ColumnType::String => "TEXT",
        ColumnType::Bool => "BOOLEAN",
        ColumnType::Date => "DATE",
        ColumnType::Datetime => "TIMESTAMP WITH TIME ZONE",
    }
}

fn bind_scalar<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    value: &'q ScalarValue,
    ty: ColumnType,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match (ty, value) {
        (_, ScalarValue::Null) => query.bind(Option::<String>::None),
        (ColumnType::Int, ScalarValue::Int(i)) => query.bind(*i),
        (ColumnType::Int, ScalarValue::Float(f)) => query.bind(*f as i64),
        (ColumnType::Float, ScalarValue::Int(i)) => query.bind(*i as f64),
        (ColumnType::Float, ScalarValue::Float(f)) => query.bind(*f),
        (ColumnType::Bool, ScalarValue::Bool(b)) => query.bind(*b),
        (ColumnType::Date, ScalarValue::String(s)) => query.bind(s.clone()),
        (ColumnType::Datetime, ScalarValue::String(s)) => query.bind(s.clone()),
        (_, ScalarValue::String(s)) => query.bind(s.clone()),
        (_, ScalarValue::Int(i)) => query.bind(i.to_string()),
        (_, ScalarValue::Float(f)) => query.bind(f.to_string()),
        (_, ScalarValue::Bool(b)) => query.bind(b.to_string()),
    }
}

fn extract_scalar(row: &sqlx::postgres::PgRow, col: &str, ty: ColumnType) -> ScalarValue {
    match ty {
        ColumnType::Int => row
            .try_get::<i64, _>(col)
            .map(ScalarValue::Int)
            .unwrap_or(ScalarValue::Null),
        ColumnType::Float => row
            .try_get::<f64, _>(col)
            .map(ScalarValue::Float)
            .unwrap_or(ScalarValue::Null),
        ColumnType::Bool => row
            .try_get::<bool, _>(col)
            .map(ScalarValue::Bool)
            .unwrap_or(ScalarValue::Null),
        ColumnType::Date => row
            .try_get::<chrono::NaiveDate, _>(col)
            .map(|d| ScalarValue::String(d.to_string()))
            .unwrap_or(ScalarValue::Null),
        ColumnType::Datetime => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(col)
            .map(|d| ScalarValue::String(d.to_rfc3339()))
            .unwrap_or(ScalarValue::Null),
        ColumnType::String => row
            .try_get::<String, _>(col)
            .map(ScalarValue::String)
            .unwrap_or(ScalarValue::Null),
    }
}
