//! Convert serde_json::Value to the text form bound to statements.
//!
//! Placeholders carry a cast to the column type (`$1::integer`), so every
//! value is sent as text and PostgreSQL does the conversion.

use serde_json::Value;

/// Text representation of a JSON value for binding; `None` binds SQL NULL.
pub fn bind_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_bind_as_their_text() {
        assert_eq!(bind_text(&json!("Widget")), Some("Widget".into()));
        assert_eq!(bind_text(&json!(9.99)), Some("9.99".into()));
        assert_eq!(bind_text(&json!(42)), Some("42".into()));
        assert_eq!(bind_text(&json!(true)), Some("true".into()));
        assert_eq!(bind_text(&Value::Null), None);
    }

    #[test]
    fn structured_values_bind_as_json_text() {
        assert_eq!(bind_text(&json!({"a": 1})), Some(r#"{"a":1}"#.into()));
        assert_eq!(bind_text(&json!([1, 2])), Some("[1,2]".into()));
    }
}
