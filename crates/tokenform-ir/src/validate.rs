//! Structural legality checks over `serde_json::Value` records.
//!
//! Several rejections in the source threat model — arbitrary-precision
//! integers, symbols, functions, timestamp/regex/map/set objects, non-UTF-8
//! strings, cyclic references — have no representation in `serde_json::Value`
//! at all: a `String` is always valid UTF-8, a `Value` is an owned tree with
//! no aliasing, and the parser only ever produces `Null | Bool | Number |
//! String | Array | Object`. Those checks are therefore not implemented here;
//! rejecting at the type level is stronger than rejecting at runtime. What
//! remains, and is enforced below, is depth and reserved field names.

use crate::error::ValidationKind;
use crate::{IrError, Result, MAX_DEPTH, RESERVED_FIELD_NAMES};
use serde_json::Value as Json;

/// Validates every record in `records`, short-circuiting on the first
/// failure with a precise path (`spec.md` §4.1, §4.9).
pub fn validate(records: &[Json]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        let path = format!("[{i}]");
        if !record.is_object() {
            return Err(IrError::validation(path, ValidationKind::NotARecord));
        }
        validate_node(record, &path, 0)?;
    }
    Ok(())
}

fn validate_node(value: &Json, path: &str, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(IrError::validation(
            path,
            ValidationKind::DepthExceeded { depth },
        ));
    }
    match value {
        Json::Object(map) => {
            for (key, child) in map {
                if key.is_empty() {
                    return Err(IrError::validation(path, ValidationKind::EmptyFieldName));
                }
                if RESERVED_FIELD_NAMES.contains(&key.as_str()) {
                    return Err(IrError::validation(
                        path,
                        ValidationKind::ReservedFieldName(key.clone()),
                    ));
                }
                let child_path = format!("{path}.{key}");
                validate_node(child, &child_path, depth + 1)?;
            }
            Ok(())
        }
        Json::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let child_path = format!("{path}[{i}]");
                validate_node(item, &child_path, depth + 1)?;
            }
            Ok(())
        }
        Json::Null | Json::Bool(_) | Json::Number(_) | Json::String(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_flat_record() {
        let records = vec![json!({"id": 1, "name": "Alice"})];
        assert!(validate(&records).is_ok());
    }

    #[test]
    fn rejects_reserved_field_name() {
        let records = vec![json!({"__proto__": 1})];
        let err = validate(&records).unwrap_err();
        assert!(matches!(
            err,
            IrError::Validation {
                kind: ValidationKind::ReservedFieldName(_),
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_field_name() {
        let records = vec![json!({"": 1})];
        let err = validate(&records).unwrap_err();
        assert!(matches!(
            err,
            IrError::Validation {
                kind: ValidationKind::EmptyFieldName,
                ..
            }
        ));
    }

    #[test]
    fn rejects_excessive_depth() {
        let mut value = json!(1);
        for _ in 0..(MAX_DEPTH + 5) {
            value = json!({"n": value});
        }
        let records = vec![value];
        let err = validate(&records).unwrap_err();
        assert!(matches!(
            err,
            IrError::Validation {
                kind: ValidationKind::DepthExceeded { .. },
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_object_record() {
        let records = vec![json!([1, 2, 3])];
        let err = validate(&records).unwrap_err();
        assert!(matches!(
            err,
            IrError::Validation {
                kind: ValidationKind::NotARecord,
                ..
            }
        ));
    }

    #[test]
    fn nested_reserved_name_reports_path() {
        let records = vec![json!({"a": {"constructor": 1}})];
        let err = validate(&records).unwrap_err();
        match err {
            IrError::Validation { path, .. } => assert_eq!(path, "[0].a"),
            _ => panic!("expected validation error"),
        }
    }
}
