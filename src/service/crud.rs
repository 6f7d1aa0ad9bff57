//! Executes built statements on a database's pool and turns rows into JSON.

use crate::catalog::ResolvedTable;
use crate::error::AppError;
use crate::sql::{bind_text, delete, insert, select_all, update, QueryBuf};
use serde_json::{Map, Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row};

pub struct CrudService;

impl CrudService {
    /// Insert one row from validated fields. Returns rows affected.
    pub async fn insert(
        pool: &PgPool,
        target: &ResolvedTable,
        fields: &[String],
        values: &[Value],
    ) -> Result<u64, AppError> {
        let q = insert(target, fields, values);
        Self::execute(pool, target, &q).await
    }

    /// Every row of the table.
    pub async fn select_all(pool: &PgPool, target: &ResolvedTable) -> Result<Vec<Value>, AppError> {
        let q = select_all(target);
        Self::query_many(pool, target, &q).await
    }

    /// Update the row with primary key `key`. Returns rows affected.
    pub async fn update(
        pool: &PgPool,
        target: &ResolvedTable,
        key: &Value,
        fields: &[String],
        values: &[Value],
    ) -> Result<u64, AppError> {
        let q = update(target, key, fields, values)?;
        Self::execute(pool, target, &q).await
    }

    /// Delete the row with primary key `key`. Returns rows affected.
    pub async fn delete(pool: &PgPool, target: &ResolvedTable, key: &Value) -> Result<u64, AppError> {
        let q = delete(target, key)?;
        Self::execute(pool, target, &q).await
    }

    async fn execute(pool: &PgPool, target: &ResolvedTable, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(database = %target.database, sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(bind_text(p));
        }
        let done = query.execute(pool).await?;
        Ok(done.rows_affected())
    }

    async fn query_many(pool: &PgPool, target: &ResolvedTable, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(database = %target.database, sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(bind_text(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &PgRow) -> Value {
    let mut map = Map::new();
    for (idx, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, idx));
    }
    Value::Object(map)
}

/// Decode one cell by trying the types `select_all` leaves uncast; NULL and anything else become null.
fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        row.try_get::<Option<T>, _>(idx).ok().flatten()
    }

    if let Some(n) = get::<i16>(row, idx) {
        return Value::Number(n.into());
    }
    if let Some(n) = get::<i32>(row, idx) {
        return Value::Number(n.into());
    }
    if let Some(n) = get::<i64>(row, idx) {
        return Value::Number(n.into());
    }
    if let Some(n) = get::<f32>(row, idx) {
        return Number::from_f64(n as f64).map_or(Value::Null, Value::Number);
    }
    if let Some(n) = get::<f64>(row, idx) {
        return Number::from_f64(n).map_or(Value::Null, Value::Number);
    }
    if let Some(b) = get::<bool>(row, idx) {
        return Value::Bool(b);
    }
    if let Some(u) = get::<uuid::Uuid>(row, idx) {
        return Value::String(u.to_string());
    }
    if let Some(d) = get::<chrono::DateTime<chrono::Utc>>(row, idx) {
        return Value::String(d.to_rfc3339());
    }
    if let Some(d) = get::<chrono::NaiveDateTime>(row, idx) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Some(d) = get::<chrono::NaiveDate>(row, idx) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Some(s) = get::<String>(row, idx) {
        return Value::String(s);
    }
    if let Some(j) = get::<Value>(row, idx) {
        return j;
    }
    Value::Null
}
