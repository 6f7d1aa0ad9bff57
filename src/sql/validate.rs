//! Field and identifier checks run before any SQL text is built.

use crate::catalog::TableDef;
use crate::error::ConfigError;
use regex::Regex;
use std::sync::OnceLock;

/// Names usable as a database name and as a snapshot file name: no path separators, no dots, no quotes.
fn identifier_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_$-]{0,62}$").expect("static pattern"))
}

pub fn is_safe_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

pub fn check_identifier(name: &str) -> Result<(), ConfigError> {
    if is_safe_identifier(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

/// True iff every name is a column of `table` (exact, case-sensitive). Empty input is valid.
pub fn validate_fields<S: AsRef<str>>(table: &TableDef, fields: &[S]) -> bool {
    fields.iter().all(|f| table.has_column(f.as_ref()))
}

/// Requested names that are not columns of `table`, in request order.
pub fn unknown_fields<'a, S: AsRef<str>>(table: &TableDef, fields: &'a [S]) -> Vec<&'a str> {
    fields
        .iter()
        .map(<S as AsRef<str>>::as_ref)
        .filter(|f| !table.has_column(f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnDef;

    fn table() -> TableDef {
        TableDef::new(
            "product",
            vec![
                ColumnDef::new("id", "integer"),
                ColumnDef::new("name", "text"),
                ColumnDef::new("price", "numeric"),
            ],
            Some("id".into()),
        )
    }

    #[test]
    fn all_columns_are_valid() {
        assert!(validate_fields(&table(), &["id", "name", "price"]));
        assert!(validate_fields(&table(), &["price", "id"]));
    }

    #[test]
    fn one_bogus_field_fails_the_set() {
        assert!(!validate_fields(&table(), &["id", "name", "price", "bogus"]));
        assert_eq!(unknown_fields(&table(), &["bogus", "name", "Name"]), vec!["bogus", "Name"]);
    }

    #[test]
    fn empty_field_list_is_vacuously_valid() {
        let none: [&str; 0] = [];
        assert!(validate_fields(&table(), &none));
    }

    #[test]
    fn identifiers_reject_path_and_sql_metacharacters() {
        assert!(is_safe_identifier("shop"));
        assert!(is_safe_identifier("shop_2024"));
        assert!(is_safe_identifier("my-db"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("../etc"));
        assert!(!is_safe_identifier("a/b"));
        assert!(!is_safe_identifier("shop; drop table x"));
        assert!(!is_safe_identifier("sh\"op"));
        assert!(!is_safe_identifier(&"x".repeat(64)));
        assert!(check_identifier("-x").is_err());
    }
}
