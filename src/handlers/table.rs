//! Table CRUD handlers: `/:db/:table`, and `/:table` on the default database.

use crate::catalog::ResolvedTable;
use crate::error::AppError;
use crate::response::{success_many, success_one, Mutation};
use crate::service::CrudService;
use crate::sql::{unknown_fields, validate_fields};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

async fn resolve(state: &AppState, db: &str, table: &str) -> Result<ResolvedTable, AppError> {
    state
        .catalog
        .resolve_table(db, table)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("table {} not found in database {}", table, db)))
}

fn default_database(state: &AppState) -> Result<String, AppError> {
    state
        .settings
        .default_database
        .clone()
        .ok_or_else(|| AppError::NotFound("no default database configured".into()))
}

/// Split a JSON object body into parallel field and value lists. Empty bodies are rejected.
fn split_body(body: Value) -> Result<(Vec<String>, Vec<Value>), AppError> {
    let Value::Object(map) = body else {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    };
    if map.is_empty() {
        return Err(AppError::BadRequest("body must name at least one field".into()));
    }
    Ok(map.into_iter().unzip())
}

fn check_fields(target: &ResolvedTable, fields: &[String]) -> Result<(), AppError> {
    if validate_fields(&target.table, fields) {
        return Ok(());
    }
    Err(AppError::Validation(format!(
        "field name not found in table {}: {}",
        target.table.name,
        unknown_fields(&target.table, fields).join(", ")
    )))
}

/// Primary-key value from the query parameter named after the key column.
fn key_value(target: &ResolvedTable, params: &HashMap<String, String>) -> Result<Value, AppError> {
    let pk = target.table.primary_key().ok_or_else(|| {
        AppError::BadRequest(format!("table {} has no primary key", target.table.name))
    })?;
    params
        .get(pk)
        .map(|v| Value::String(v.clone()))
        .ok_or_else(|| AppError::BadRequest(format!("query parameter '{}' (primary key) is required", pk)))
}

fn mutated(message: &'static str, rows_affected: u64, status: StatusCode) -> Result<impl IntoResponse, AppError> {
    if rows_affected == 0 && status != StatusCode::CREATED {
        return Err(AppError::NotFound("no record matches the primary key".into()));
    }
    Ok(success_one(status, Mutation { message, rows_affected }))
}

async fn create_in(state: &AppState, db: &str, table: &str, body: Value) -> Result<impl IntoResponse, AppError> {
    let target = resolve(state, db, table).await?;
    let (fields, values) = split_body(body)?;
    check_fields(&target, &fields)?;
    let pool = state.pools.pool_for(&target.database);
    let n = CrudService::insert(&pool, &target, &fields, &values).await?;
    mutated("record added", n, StatusCode::CREATED)
}

async fn list_in(state: &AppState, db: &str, table: &str) -> Result<impl IntoResponse, AppError> {
    let target = resolve(state, db, table).await?;
    let pool = state.pools.pool_for(&target.database);
    let rows = CrudService::select_all(&pool, &target).await?;
    Ok(success_many(rows))
}

async fn update_in(
    state: &AppState,
    db: &str,
    table: &str,
    params: &HashMap<String, String>,
    body: Value,
) -> Result<impl IntoResponse, AppError> {
    let target = resolve(state, db, table).await?;
    let (fields, values) = split_body(body)?;
    check_fields(&target, &fields)?;
    let key = key_value(&target, params)?;
    let pool = state.pools.pool_for(&target.database);
    let n = CrudService::update(&pool, &target, &key, &fields, &values).await?;
    mutated("record updated", n, StatusCode::OK)
}

async fn delete_in(
    state: &AppState,
    db: &str,
    table: &str,
    params: &HashMap<String, String>,
) -> Result<impl IntoResponse, AppError> {
    let target = resolve(state, db, table).await?;
    let key = key_value(&target, params)?;
    let pool = state.pools.pool_for(&target.database);
    let n = CrudService::delete(&pool, &target, &key).await?;
    mutated("record deleted", n, StatusCode::OK)
}

pub async fn create(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    create_in(&state, &db, &table, body).await
}

pub async fn list(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    list_in(&state, &db, &table).await
}

pub async fn update(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    update_in(&state, &db, &table, &params, body).await
}

pub async fn delete(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    delete_in(&state, &db, &table, &params).await
}

pub async fn create_default(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let db = default_database(&state)?;
    create_in(&state, &db, &table, body).await
}

pub async fn list_default(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = default_database(&state)?;
    list_in(&state, &db, &table).await
}

pub async fn update_default(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let db = default_database(&state)?;
    update_in(&state, &db, &table, &params, body).await
}

pub async fn delete_default(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let db = default_database(&state)?;
    delete_in(&state, &db, &table, &params).await
}
