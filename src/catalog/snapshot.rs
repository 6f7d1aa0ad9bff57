//! Snapshot model: one database's tables, columns and primary keys.
//!
//! Field names on disk follow the persisted format (`DB`, `Tablecount`,
//! `Tables`, ...). Older files wrote empty lists as `null`; both read back as
//! empty.

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    #[serde(rename = "Column_name")]
    pub name: String,
    /// Declared type as reported by information_schema; never parsed.
    #[serde(rename = "Column_type")]
    pub type_name: String,
    /// Schema of the underlying type (`udt_schema`). Absent in snapshots written before it was recorded.
    #[serde(rename = "Udt_schema", default, skip_serializing_if = "Option::is_none")]
    pub udt_schema: Option<String>,
    /// Underlying type name (`udt_name`), e.g. an enum's name or `_int4` for `integer[]`.
    #[serde(rename = "Udt_name", default, skip_serializing_if = "Option::is_none")]
    pub udt_name: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        ColumnDef {
            name: name.into(),
            type_name: type_name.into(),
            udt_schema: None,
            udt_name: None,
        }
    }

    pub fn with_udt(mut self, schema: impl Into<String>, name: impl Into<String>) -> Self {
        self.udt_schema = Some(schema.into());
        self.udt_name = Some(name.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(rename = "Table_name")]
    pub name: String,
    #[serde(rename = "Column_count", default)]
    pub column_count: usize,
    /// Empty when no primary-key constraint was discovered.
    #[serde(rename = "Primary_key", default)]
    pub primary_key: String,
    #[serde(rename = "Columns", default, deserialize_with = "null_as_empty")]
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>, primary_key: Option<String>) -> Self {
        TableDef {
            name: name.into(),
            column_count: columns.len(),
            primary_key: primary_key.unwrap_or_default(),
            columns,
        }
    }

    /// Primary-key column, or None when the table has none.
    pub fn primary_key(&self) -> Option<&str> {
        if self.primary_key.is_empty() {
            None
        } else {
            Some(self.primary_key.as_str())
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "DB")]
    pub database: String,
    #[serde(rename = "Tablecount", default)]
    pub table_count: usize,
    #[serde(rename = "Tables", default, deserialize_with = "null_as_empty")]
    pub tables: Vec<TableDef>,
}

impl Snapshot {
    pub fn new(database: impl Into<String>, tables: Vec<TableDef>) -> Self {
        Snapshot {
            database: database.into(),
            table_count: tables.len(),
            tables,
        }
    }

    /// Empty snapshot served for a database with nothing persisted.
    pub fn empty(database: impl Into<String>) -> Self {
        Snapshot::new(database, Vec::new())
    }

    /// First table with the given name. Names are unique in any snapshot that
    /// passed `check_unique_tables`.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Duplicate table names are a configuration anomaly, not something to pick a winner for.
    pub fn check_unique_tables(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for t in &self.tables {
            if !seen.insert(t.name.as_str()) {
                return Err(ConfigError::DuplicateTable {
                    database: self.database.clone(),
                    table: t.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> TableDef {
        TableDef::new(
            "product",
            vec![
                ColumnDef::new("id", "integer"),
                ColumnDef::new("name", "character varying"),
                ColumnDef::new("price", "numeric"),
            ],
            Some("id".into()),
        )
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let snap = Snapshot::new("shop", vec![product()]);
        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["DB"], "shop");
        assert_eq!(v["Tablecount"], 1);
        assert_eq!(v["Tables"][0]["Table_name"], "product");
        assert_eq!(v["Tables"][0]["Column_count"], 3);
        assert_eq!(v["Tables"][0]["Primary_key"], "id");
        assert_eq!(v["Tables"][0]["Columns"][1]["Column_name"], "name");
        assert_eq!(v["Tables"][0]["Columns"][1]["Column_type"], "character varying");
    }

    #[test]
    fn null_lists_read_back_empty() {
        let raw = r#"{"DB":"empty","Tables":null,"Tablecount":0}"#;
        let snap: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snap, Snapshot::empty("empty"));

        let raw = r#"{"Table_name":"t","Column_count":0,"Columns":null,"Primary_key":""}"#;
        let t: TableDef = serde_json::from_str(raw).unwrap();
        assert!(t.columns.is_empty());
        assert_eq!(t.primary_key(), None);
    }

    #[test]
    fn underlying_type_is_optional_on_disk() {
        let old = r#"{"Column_name":"m","Column_type":"USER-DEFINED"}"#;
        let c: ColumnDef = serde_json::from_str(old).unwrap();
        assert_eq!(c, ColumnDef::new("m", "USER-DEFINED"));
        assert!(!serde_json::to_string(&c).unwrap().contains("Udt_"));

        let c = ColumnDef::new("m", "USER-DEFINED").with_udt("public", "mood");
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["Udt_schema"], "public");
        assert_eq!(v["Udt_name"], "mood");
        assert_eq!(serde_json::from_value::<ColumnDef>(v).unwrap(), c);
    }

    #[test]
    fn empty_primary_key_is_absent() {
        let t = TableDef::new("log", vec![ColumnDef::new("line", "text")], None);
        assert_eq!(t.primary_key(), None);
        assert_eq!(product().primary_key(), Some("id"));
    }

    #[test]
    fn duplicate_table_names_are_rejected() {
        let snap = Snapshot::new("shop", vec![product(), product()]);
        match snap.check_unique_tables() {
            Err(ConfigError::DuplicateTable { database, table }) => {
                assert_eq!(database, "shop");
                assert_eq!(table, "product");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(Snapshot::new("shop", vec![product()]).check_unique_tables().is_ok());
    }
}
