//! Builds parameterized INSERT, SELECT, UPDATE, DELETE for a table known only at runtime.
//! Every identifier comes from a resolved snapshot; every value is a bound parameter.

use crate::catalog::{ColumnDef, ResolvedTable};
use crate::error::AppError;
use serde_json::Value;

/// Column types `CrudService` decodes natively; anything else is selected as text.
const NATIVE_TYPES: &[&str] = &[
    "smallint",
    "integer",
    "bigint",
    "real",
    "double precision",
    "boolean",
    "uuid",
    "timestamp with time zone",
    "timestamp without time zone",
    "date",
    "text",
    "character varying",
    "character",
    "json",
    "jsonb",
];

/// Quote identifier for PostgreSQL (safe: only from a snapshot).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(name))
}

/// Cast applied to a bound parameter. `data_type` drops length modifiers, so `character` and
/// `bit` map to their unbounded forms; `character` alone would mean char(1) and truncate the value.
/// Enums, domains and arrays are cast to their underlying type when introspection recorded it.
fn cast_target(c: &ColumnDef) -> Option<String> {
    match c.type_name.as_str() {
        "character" => Some("bpchar".to_string()),
        "bit" => Some("varbit".to_string()),
        "USER-DEFINED" | "ARRAY" => match (&c.udt_schema, &c.udt_name) {
            (Some(schema), Some(name)) if !name.is_empty() => Some(qualified(schema, name)),
            _ => None,
        },
        ty if !ty.is_empty()
            && ty
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == ' ' || ch == '_') =>
        {
            Some(ty.to_string())
        }
        _ => None,
    }
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Binds `v` and returns its placeholder, cast to the column type when possible.
    fn push_param(&mut self, v: Value, column: Option<&ColumnDef>) -> String {
        self.params.push(v);
        let n = self.params.len();
        match column.and_then(cast_target) {
            Some(ty) => format!("${}::{}", n, ty),
            None => format!("${}", n),
        }
    }
}

fn select_column_list(target: &ResolvedTable) -> String {
    target
        .table
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            if NATIVE_TYPES.contains(&c.type_name.as_str()) {
                q
            } else {
                format!("{}::text AS {}", q, q)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn require_primary_key(target: &ResolvedTable) -> Result<&ColumnDef, AppError> {
    let pk = target.table.primary_key().ok_or_else(|| {
        AppError::BadRequest(format!(
            "table {} has no primary key; update and delete by key are not possible",
            target.table.name
        ))
    })?;
    // A snapshot whose key names a missing column is as unusable as one without a key.
    target.table.column(pk).ok_or_else(|| {
        AppError::BadRequest(format!(
            "primary key {} of table {} is not among its columns",
            pk, target.table.name
        ))
    })
}

/// INSERT with the given columns in caller order. Fields must already have passed `validate_fields`.
pub fn insert(target: &ResolvedTable, fields: &[String], values: &[Value]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified(&target.schema, &target.table.name);
    let mut cols = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    for (name, val) in fields.iter().zip(values) {
        placeholders.push(q.push_param(val.clone(), target.table.column(name)));
        cols.push(quoted(name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// SELECT every column of the table, unfiltered.
pub fn select_all(target: &ResolvedTable) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified(&target.schema, &target.table.name);
    let cols = select_column_list(target);
    q.sql = if cols.is_empty() {
        format!("SELECT * FROM {}", table)
    } else {
        format!("SELECT {} FROM {}", cols, table)
    };
    q
}

/// UPDATE the row whose primary key equals `key`. The key travels as the last parameter.
pub fn update(
    target: &ResolvedTable,
    key: &Value,
    fields: &[String],
    values: &[Value],
) -> Result<QueryBuf, AppError> {
    let pk = require_primary_key(target)?;
    if fields.is_empty() {
        return Err(AppError::BadRequest("update needs at least one field".into()));
    }
    let mut q = QueryBuf::new();
    let table = qualified(&target.schema, &target.table.name);
    let mut sets = Vec::with_capacity(fields.len());
    for (name, val) in fields.iter().zip(values) {
        let rhs = q.push_param(val.clone(), target.table.column(name));
        sets.push(format!("{} = {}", quoted(name), rhs));
    }
    let key_ph = q.push_param(key.clone(), Some(pk));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        table,
        sets.join(", "),
        quoted(&pk.name),
        key_ph
    );
    Ok(q)
}

/// DELETE the row whose primary key equals `key`.
pub fn delete(target: &ResolvedTable, key: &Value) -> Result<QueryBuf, AppError> {
    let pk = require_primary_key(target)?;
    let mut q = QueryBuf::new();
    let table = qualified(&target.schema, &target.table.name);
    let key_ph = q.push_param(key.clone(), Some(pk));
    q.sql = format!("DELETE FROM {} WHERE {} = {}", table, quoted(&pk.name), key_ph);
    Ok(q)
}
