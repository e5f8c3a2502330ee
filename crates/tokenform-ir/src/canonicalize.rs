//! Record normalization: flattening, schema inference, and number/string
//! canonicalization (`spec.md` §4.2).
//!
//! Schema unification follows the "superset/subset lattice" wording in the
//! source spec literally only for *top-level* rows — the common case, and
//! the one Scenario B in `spec.md` §8 exercises. Nested records found inside
//! arrays (the cold path per `spec.md` §9) are grouped by exact field-set
//! equality rather than lattice merge; see `DESIGN.md` for why folding them
//! into the same lattice as unrelated top-level rows would be wrong (two
//! unrelated entities whose fields happen to nest).

use std::collections::BTreeSet;

use serde_json::{Map as JsonMap, Number as JsonNumber, Value as Json};

use crate::error::CanonicalizationKind;
use crate::schema::{Schema, TypeTag};
use crate::value::{Record, Value};
use crate::{IrError, Result};

/// Options controlling schema inference.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalizeOptions {
    /// Collapse subset schema families into the smallest enclosing superset
    /// (`spec.md` §4.2, "benchmark-declared unified mode"). Defaults to
    /// `true` since this workspace has no benchmark harness of its own to
    /// gate the behavior — see `SPEC_FULL.md` §4.2.
    pub unify_schemas: bool,
}

impl Default for CanonicalizeOptions {
    fn default() -> Self {
        Self {
            unify_schemas: true,
        }
    }
}

/// Canonicalizes `records` into a schema list and a list of (schema-id, row)
/// pairs, preserving input row order (`spec.md` §4.2, §5 "Ordering").
pub fn canonicalize(
    records: &[Json],
    opts: CanonicalizeOptions,
) -> Result<(Vec<Schema>, Vec<(u32, Record)>)> {
    let mut flattened = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or_else(|| IrError::canonicalization(format!("[{i}]"), field_collision_na()))?;
        flattened.push(flatten_object(obj, &format!("[{i}]"))?);
    }

    let top_sets: Vec<Vec<String>> = flattened.iter().map(field_set_of).collect();
    let nested_sets = collect_nested_field_sets(&flattened);

    let top_pool = if opts.unify_schemas {
        maximal_supersets(&top_sets)
    } else {
        distinct_sets(&top_sets)
    };
    let nested_pool = distinct_sets(&nested_sets);

    let mut combined = top_pool;
    for set in nested_pool {
        if !combined.iter().any(|s| s == &set) {
            combined.push(set);
        }
    }
    combined.sort();
    combined.dedup();

    let tags = infer_type_tags(&combined, &flattened);

    let schemas: Vec<Schema> = combined
        .iter()
        .enumerate()
        .map(|(id, fields)| Schema {
            id: id as u32,
            fields: fields
                .iter()
                .map(|f| (f.clone(), tags[id].get(f).copied().unwrap_or(TypeTag::Null)))
                .collect(),
        })
        .collect();

    let mut rows = Vec::with_capacity(flattened.len());
    for mut record in flattened {
        let field_set: BTreeSet<&str> = record.keys().map(String::as_str).collect();
        let schema_id = assign_schema(&schemas, &field_set)
            .expect("every field set has a matching schema by construction");
        fill_nested_records(&mut record, &schemas);
        fill_to_schema(&mut record, &schemas[schema_id as usize]);
        rows.push((schema_id, record));
    }

    Ok((schemas, rows))
}

/// Placeholder used only when a top-level entry isn't an object; validation
/// is expected to have already rejected this, so the exact kind carried here
/// is not load-bearing.
fn field_collision_na() -> CanonicalizationKind {
    CanonicalizationKind::FieldCollision(String::new())
}

fn field_set_of(record: &Record) -> Vec<String> {
    record.keys().cloned().collect()
}

/// Finds the schema assigned to `field_set`: the schema whose fields are the
/// smallest superset of `field_set`, tie-broken by field-list ordering. This
/// is used both for top-level rows (where a superset may come from lattice
/// merge) and for nested records (where the match is normally exact).
pub fn assign_schema(schemas: &[Schema], field_set: &BTreeSet<&str>) -> Option<u32> {
    schemas
        .iter()
        .filter(|s| {
            let schema_fields: BTreeSet<&str> = s.field_names().collect();
            field_set.is_subset(&schema_fields)
        })
        .min_by_key(|s| (s.fields.len(), s.field_names().collect::<Vec<_>>()))
        .map(|s| s.id)
}

fn fill_to_schema(record: &mut Record, schema: &Schema) {
    for (name, _) in &schema.fields {
        record.entry(name.clone()).or_insert(Value::Null);
    }
}

/// Recursively assigns and null-fills any nested records reachable through
/// arrays, in place.
fn fill_nested_records(record: &mut Record, schemas: &[Schema]) {
    for value in record.values_mut() {
        fill_nested_in_value(value, schemas);
    }
}

fn fill_nested_in_value(value: &mut Value, schemas: &[Schema]) {
    match value {
        Value::Array(items) => {
            for item in items {
                fill_nested_in_value(item, schemas);
            }
        }
        Value::Record(sub) => {
            let field_set: BTreeSet<&str> = sub.keys().map(String::as_str).collect();
            if let Some(id) = assign_schema(schemas, &field_set) {
                fill_nested_records(sub, schemas);
                fill_to_schema(sub, &schemas[id as usize]);
            }
        }
        _ => {}
    }
}

fn collect_nested_field_sets(records: &[Record]) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for record in records {
        for value in record.values() {
            collect_nested_in_value(value, &mut out);
        }
    }
    out
}

fn collect_nested_in_value(value: &Value, out: &mut Vec<Vec<String>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_nested_in_value(item, out);
            }
        }
        Value::Record(sub) => {
            out.push(sub.keys().cloned().collect());
            for v in sub.values() {
                collect_nested_in_value(v, out);
            }
        }
        _ => {}
    }
}

fn distinct_sets(sets: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = Vec::new();
    for set in sets {
        if !out.iter().any(|s| s == set) {
            out.push(set.clone());
        }
    }
    out
}

/// Collapses `sets` so that any set which is a (possibly non-strict) subset
/// of another survives only as the smallest enclosing superset.
fn maximal_supersets(sets: &[Vec<String>]) -> Vec<Vec<String>> {
    let distinct = distinct_sets(sets);
    let as_btree: Vec<BTreeSet<&String>> = distinct.iter().map(|s| s.iter().collect()).collect();
    let mut maximal = Vec::new();
    for (i, a) in as_btree.iter().enumerate() {
        let dominated = as_btree
            .iter()
            .enumerate()
            .any(|(j, b)| i != j && a.is_subset(b) && a != b);
        if !dominated {
            maximal.push(distinct[i].clone());
        }
    }
    maximal
}

fn infer_type_tags(
    combined: &[Vec<String>],
    records: &[Record],
) -> Vec<std::collections::HashMap<String, TypeTag>> {
    let schemas_stub: Vec<Schema> = combined
        .iter()
        .enumerate()
        .map(|(id, fields)| Schema {
            id: id as u32,
            fields: fields.iter().map(|f| (f.clone(), TypeTag::Null)).collect(),
        })
        .collect();

    let mut tags = vec![std::collections::HashMap::new(); combined.len()];
    let mut visit = |record: &Record| {
        let field_set: BTreeSet<&str> = record.keys().map(String::as_str).collect();
        if let Some(id) = assign_schema(&schemas_stub, &field_set) {
            let bucket = &mut tags[id as usize];
            for (name, value) in record {
                let tag = value.type_tag();
                bucket
                    .entry(name.clone())
                    .and_modify(|t| *t = t.join(tag))
                    .or_insert(tag);
            }
        }
    };

    for record in records {
        visit(record);
        for value in record.values() {
            visit_nested(value, &mut visit);
        }
    }
    tags
}

fn visit_nested<'a>(value: &'a Value, visit: &mut impl FnMut(&'a Record)) {
    match value {
        Value::Array(items) => {
            for item in items {
                visit_nested(item, visit);
            }
        }
        Value::Record(sub) => {
            visit(sub);
            for v in sub.values() {
                visit_nested(v, visit);
            }
        }
        _ => {}
    }
}

/// Flattens one JSON object into a canonical [`Record`], rejecting field
/// names containing `.` and flattening-induced path collisions.
fn flatten_object(obj: &JsonMap<String, Json>, path: &str) -> Result<Record> {
    let mut out = Record::new();
    flatten_into(obj, path, &mut out)?;
    Ok(out)
}

fn flatten_into(obj: &JsonMap<String, Json>, path: &str, out: &mut Record) -> Result<()> {
    for (key, value) in obj {
        if key.contains('.') {
            return Err(IrError::canonicalization(
                format!("{path}.{key}"),
                CanonicalizationKind::DotInFieldName(key.clone()),
            ));
        }
        match value {
            Json::Object(nested) => {
                flatten_into(nested, &format!("{path}.{key}"), out)?;
            }
            other => {
                let canonical = convert_scalar_or_array(other)?;
                if out.insert(key.clone(), canonical).is_some() {
                    return Err(IrError::canonicalization(
                        format!("{path}.{key}"),
                        CanonicalizationKind::FieldCollision(key.clone()),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn convert_scalar_or_array(value: &Json) -> Result<Value> {
    match value {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(convert_number(n)),
        Json::String(s) => Ok(Value::Str(s.clone())),
        Json::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(convert_array_element(item)?);
            }
            Ok(Value::Array(out))
        }
        Json::Object(obj) => Ok(Value::Record(flatten_object(obj, "")?)),
    }
}

fn convert_array_element(value: &Json) -> Result<Value> {
    convert_scalar_or_array(value)
}

fn convert_number(n: &JsonNumber) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if let Some(f) = n.as_f64() {
        Value::Float(f)
    } else {
        // u64 beyond i64::MAX: still representable as f64 for our purposes.
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Renders a canonicalized number the way the wire and canonical-text forms
/// require: shortest round-trip decimal, `-0.0 ≡ 0`, integers within ±2^53 as
/// plain decimal (`spec.md` §4.2).
pub fn format_number(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        _ => panic!("format_number called on a non-numeric value"),
    }
}

fn format_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
        return format!("{}", f as i64);
    }
    let mut s = format!("{f}");
    if !s.contains('.') && !s.contains('e') && !s.contains('E') {
        s.push_str(".0");
    }
    s
}
