//! Boundary row type and datatype coercion.
//!
//! The excluded file-reading layer delivers each table as a list of rows,
//! each a mapping from column name to raw string/number/boolean. We take
//! that contract literally: a row is a `serde_json::Map`.

use ontotransit_graph::Literal;
use ontotransit_schema::{Datatype, KindDecl};
use serde_json::Value;

use crate::error::PopulateError;

pub type Row = serde_json::Map<String, Value>;

/// Raw text of a column, trimmed. Missing columns, nulls, and
/// empty-after-trim strings all read as absent.
pub fn raw_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Build the primary key of a row from the kind's key declaration.
/// Composite keys join with `:`.
pub fn row_key(decl: &KindDecl, row: &Row) -> Result<String, PopulateError> {
    let mut parts = Vec::with_capacity(decl.key.len());
    for part in &decl.key {
        match raw_text(row, part.column).or_else(|| part.default.map(str::to_string)) {
            Some(v) => parts.push(v),
            None => {
                return Err(PopulateError::mapping(
                    decl.kind,
                    parts.join(":"),
                    format!("missing key field `{}`", part.column),
                ))
            }
        }
    }
    Ok(parts.join(":"))
}

/// Coerce a raw value to its declared datatype. The error is a bare detail
/// string; callers attach kind/key context.
pub fn coerce(raw: &str, datatype: Datatype) -> Result<Literal, String> {
    match datatype {
        Datatype::Text => Ok(Literal::Text(raw.to_string())),
        Datatype::Integer => parse_int(raw)
            .map(Literal::Integer)
            .ok_or_else(|| format!("expected an integer, got `{raw}`")),
        Datatype::Float => match raw.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Literal::Float(x)),
            _ => Err(format!("expected a number, got `{raw}`")),
        },
        Datatype::Boolean => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(Literal::Boolean(true)),
            "0" | "false" => Ok(Literal::Boolean(false)),
            _ => Err(format!("expected a boolean flag, got `{raw}`")),
        },
        Datatype::AccessibilityCode => match raw.to_ascii_lowercase().as_str() {
            "0" | "unknown" => Ok(Literal::Text("unknown".into())),
            "1" | "accessible" => Ok(Literal::Text("accessible".into())),
            "2" | "not_accessible" => Ok(Literal::Text("not_accessible".into())),
            _ => Err(format!("unknown accessibility code `{raw}`")),
        },
    }
}

// GTFS exports sometimes carry integral floats ("3.0"); accept those, reject
// anything with a fractional part.
fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(i);
    }
    let f: f64 = raw.parse().ok()?;
    (f.is_finite() && f.fract() == 0.0).then(|| f as i64)
}

/// Convenience for building rows in tests and table fixtures.
pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontotransit_schema::{transit_schema, EntityKind};

    #[test]
    fn test_raw_text_normalizes_absence() {
        let mut r = Row::new();
        r.insert("a".into(), Value::String("  ".into()));
        r.insert("b".into(), Value::Null);
        r.insert("c".into(), Value::String(" x ".into()));
        r.insert("d".into(), serde_json::json!(42));
        assert_eq!(raw_text(&r, "a"), None);
        assert_eq!(raw_text(&r, "b"), None);
        assert_eq!(raw_text(&r, "missing"), None);
        assert_eq!(raw_text(&r, "c"), Some("x".into()));
        assert_eq!(raw_text(&r, "d"), Some("42".into()));
    }

    #[test]
    fn test_integer_coercion_accepts_integral_floats() {
        assert_eq!(coerce("3", Datatype::Integer), Ok(Literal::Integer(3)));
        assert_eq!(coerce("3.0", Datatype::Integer), Ok(Literal::Integer(3)));
        assert!(coerce("3.5", Datatype::Integer).is_err());
        assert!(coerce("abc", Datatype::Integer).is_err());
    }

    #[test]
    fn test_accessibility_codes_normalize() {
        assert_eq!(
            coerce("1", Datatype::AccessibilityCode),
            Ok(Literal::Text("accessible".into()))
        );
        assert_eq!(
            coerce("2", Datatype::AccessibilityCode),
            Ok(Literal::Text("not_accessible".into()))
        );
        assert_eq!(
            coerce("0", Datatype::AccessibilityCode),
            Ok(Literal::Text("unknown".into()))
        );
        assert!(coerce("7", Datatype::AccessibilityCode).is_err());
    }

    #[test]
    fn test_transfer_key_defaults_transfer_type() {
        let schema = transit_schema();
        let decl = schema.kind(EntityKind::Transfer);
        let key = row_key(decl, &row(&[("from_stop_id", "A"), ("to_stop_id", "B")])).unwrap();
        assert_eq!(key, "A:B:0");
    }

    #[test]
    fn test_missing_key_field_is_a_mapping_error() {
        let schema = transit_schema();
        let decl = schema.kind(EntityKind::Stop);
        let err = row_key(decl, &row(&[("stop_name", "Centre")])).unwrap_err();
        assert!(err.to_string().contains("missing key field `stop_id`"));
    }
}
