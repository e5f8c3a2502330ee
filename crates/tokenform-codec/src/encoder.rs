//! Binary framing of canonicalized records (`spec.md` §4.4, §6.1).
//!
//! Every field value — whether a top-level row field, a nested-record
//! field, or an array element — is written through [`encode_value`], which
//! prefixes a one-byte kind tag ahead of the payload. `spec.md` §4.2 notes
//! that a schema's per-field type tag is "informational; decoding does not
//! require it" — true only because every value on the wire is itself
//! self-describing. See `DESIGN.md` for why the schema type tag alone
//! cannot disambiguate a `mixed` column.

use byteorder::{LittleEndian, WriteBytesExt};
use sha2::{Digest, Sha256};

use tokenform_ir::{Record, Schema, StringTable, Value};

use crate::control::*;
use crate::error::{CodecError, EncodeErrorKind};
use crate::varint::{write_i64, write_u64};

/// The result of a successful encode: the canonical IR alongside its bytes
/// and content hash (`spec.md` §3 "IR Object").
#[derive(Debug, Clone)]
pub struct EncodedIr {
    pub schemas: Vec<Schema>,
    pub strings: StringTable,
    pub rows: Vec<(u32, Record)>,
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`.
    pub hash: String,
}

/// Encodes already-canonicalized `(schemas, rows)` into the framed byte
/// stream described in `spec.md` §6.1, tying off with a self-sealing
/// trailer.
#[tracing::instrument(level = "trace", skip(schemas, rows), fields(schemas = schemas.len(), rows = rows.len()))]
pub fn encode(schemas: Vec<Schema>, rows: Vec<(u32, Record)>) -> Result<EncodedIr, CodecError> {
    let strings = build_dictionary(&schemas, &rows);
    if strings.len() as u64 > (1u64 << 31) {
        return Err(CodecError::encode("<dictionary>", EncodeErrorKind::DictionaryOverflow));
    }

    let mut body = Vec::new();
    body.extend_from_slice(&TENS_MAGIC);
    body.push(TENS_VERSION);
    body.push(0); // reserved

    encode_dictionary(&mut body, &strings);
    encode_schema_table(&mut body, &schemas, &strings)?;
    encode_row_blocks(&mut body, &schemas, &rows, &strings)?;

    let seal = Sha256::digest(&body);
    body.push(CTRL_EOF);
    body.extend_from_slice(&seal);

    let hash = to_hex(&Sha256::digest(&body));
    tracing::trace!(hash = %hash, bytes = body.len(), "encoded IR");

    Ok(EncodedIr {
        schemas,
        strings,
        rows,
        bytes: body,
        hash,
    })
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Builds the string table in canonical insertion order: field names from
/// every schema (schema-id order), then string values encountered walking
/// rows in input order (`spec.md` §4.3).
fn build_dictionary(schemas: &[Schema], rows: &[(u32, Record)]) -> StringTable {
    let mut strings = StringTable::new();
    for schema in schemas {
        for (name, _) in &schema.fields {
            strings.add(name);
        }
    }
    for (_, row) in rows {
        for value in row.values() {
            collect_strings(value, &mut strings);
        }
    }
    strings
}

fn collect_strings(value: &Value, strings: &mut StringTable) {
    match value {
        Value::Str(s) => {
            strings.add(s);
        }
        Value::Array(items) => {
            for item in items {
                collect_strings(item, strings);
            }
        }
        Value::Record(sub) => {
            for value in sub.values() {
                collect_strings(value, strings);
            }
        }
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => {}
    }
}

fn encode_dictionary(out: &mut Vec<u8>, strings: &StringTable) {
    out.push(CTRL_DICT_BEGIN);
    write_u64(out, strings.len() as u64);
    for s in strings.iter() {
        write_u64(out, s.len() as u64);
        out.extend_from_slice(s.as_bytes());
    }
    out.push(CTRL_DICT_END);
}

fn dict_ref(strings: &StringTable, s: &str) -> u64 {
    strings.id_of(s).expect("every string was interned during dictionary construction") as u64
}

fn encode_schema_table(
    out: &mut Vec<u8>,
    schemas: &[Schema],
    strings: &StringTable,
) -> Result<(), CodecError> {
    out.push(CTRL_SCHEMA_BEGIN);
    write_u64(out, schemas.len() as u64);
    for schema in schemas {
        write_u64(out, schema.fields.len() as u64);
        for (name, _) in &schema.fields {
            write_u64(out, dict_ref(strings, name) + DICT_REF_BASE);
        }
        for (_, tag) in &schema.fields {
            out.push(tag.as_byte());
        }
    }
    out.push(CTRL_SCHEMA_END);
    Ok(())
}

fn encode_row_blocks(
    out: &mut Vec<u8>,
    schemas: &[Schema],
    rows: &[(u32, Record)],
    strings: &StringTable,
) -> Result<(), CodecError> {
    let mut i = 0;
    while i < rows.len() {
        let schema_id = rows[i].0;
        let mut j = i + 1;
        while j < rows.len() && rows[j].0 == schema_id && (j - i) < BLOCK_SIZE {
            j += 1;
        }
        let schema = &schemas[schema_id as usize];
        out.push(CTRL_BLOCK_BEGIN);
        write_u64(out, schema_id as u64);
        write_u64(out, (j - i) as u64);
        for (_, row) in &rows[i..j] {
            encode_row_fields(out, schema, row, schemas, strings)?;
        }
        out.push(CTRL_BLOCK_END);
        i = j;
    }
    Ok(())
}

/// Writes the presence bitmask followed by the tagged payload for each
/// present field, in schema field order. Shared by top-level row blocks and
/// nested-record encoding.
fn encode_row_fields(
    out: &mut Vec<u8>,
    schema: &Schema,
    row: &Record,
    schemas: &[Schema],
    strings: &StringTable,
) -> Result<(), CodecError> {
    let mask_len = (schema.fields.len() + 7) / 8;
    let mut mask = vec![0u8; mask_len];
    for (idx, (name, _)) in schema.fields.iter().enumerate() {
        let value = row
            .get(name)
            .expect("canonicalizer fills every schema field, at least with null");
        if !value.is_null() {
            mask[idx / 8] |= 0x80 >> (idx % 8);
        }
    }
    out.extend_from_slice(&mask);
    for (name, _) in &schema.fields {
        let value = row.get(name).expect("checked above");
        if !value.is_null() {
            encode_value(out, value, schemas, strings)?;
        }
    }
    Ok(())
}

/// Writes one self-describing value: a one-byte kind tag (for scalars) or a
/// control token (for arrays and nested records), followed by its payload.
fn encode_value(
    out: &mut Vec<u8>,
    value: &Value,
    schemas: &[Schema],
    strings: &StringTable,
) -> Result<(), CodecError> {
    match value {
        Value::Null => out.push(0),
        Value::Bool(b) => {
            out.push(1);
            out.push(*b as u8);
        }
        Value::Int(i) => {
            out.push(2);
            write_i64(out, *i);
        }
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(CodecError::encode("<float>", EncodeErrorKind::NonFiniteFloat));
            }
            out.push(3);
            out.write_f64::<LittleEndian>(*f)
                .expect("Vec<u8> writes never fail");
        }
        Value::Str(s) => {
            out.push(4);
            write_u64(out, dict_ref(strings, s) + DICT_REF_BASE);
        }
        Value::Array(items) => {
            out.push(CTRL_ARRAY_BEGIN);
            write_u64(out, items.len() as u64 + ARRAY_LEN_BASE);
            for item in items {
                encode_value(out, item, schemas, strings)?;
            }
        }
        Value::Record(sub) => {
            encode_nested_record(out, sub, schemas, strings)?;
        }
    }
    Ok(())
}

/// Encodes a nested record found inside an array element. The sub-record's
/// schema is recovered by exact field-set match against the schema already
/// assigned to it during canonicalization (`tokenform_ir::canonicalize`
/// fills every nested record to its schema before this runs), and referenced
/// by id rather than re-listing its field names (`spec.md` §4.4).
fn encode_nested_record(
    out: &mut Vec<u8>,
    sub: &Record,
    schemas: &[Schema],
    strings: &StringTable,
) -> Result<(), CodecError> {
    let field_set: std::collections::BTreeSet<&str> = sub.keys().map(String::as_str).collect();
    let schema_id = tokenform_ir::canonicalize::assign_schema(schemas, &field_set)
        .expect("canonicalizer registers a schema for every nested record it produces");
    let schema = &schemas[schema_id as usize];

    out.push(CTRL_OBJECT_BEGIN);
    write_u64(out, schema_id as u64);
    encode_row_fields(out, schema, sub, schemas, strings)?;
    out.push(CTRL_OBJECT_END);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenform_ir::{canonicalize, CanonicalizeOptions};
    use serde_json::json;

    fn encode_records(records: &[serde_json::Value]) -> EncodedIr {
        let (schemas, rows) = canonicalize(records, CanonicalizeOptions::default()).unwrap();
        encode(schemas, rows).unwrap()
    }

    #[test]
    fn header_is_magic_plus_version() {
        let ir = encode_records(&[]);
        assert_eq!(&ir.bytes[0..4], b"TENS");
        assert_eq!(ir.bytes[4], TENS_VERSION);
    }

    #[test]
    fn empty_record_list_has_empty_dict_and_schema() {
        let ir = encode_records(&[]);
        // HEADER(6) + DICT_BEGIN + count(0) + DICT_END + SCHEMA_BEGIN + count(0) + SCHEMA_END + EOF + 32
        assert_eq!(ir.bytes[6], CTRL_DICT_BEGIN);
        assert_eq!(ir.bytes[7], 0);
        assert_eq!(ir.bytes[8], CTRL_DICT_END);
        assert_eq!(ir.bytes[9], CTRL_SCHEMA_BEGIN);
        assert_eq!(ir.bytes[10], 0);
        assert_eq!(ir.bytes[11], CTRL_SCHEMA_END);
        assert_eq!(ir.bytes[12], CTRL_EOF);
        assert_eq!(ir.bytes.len(), 13 + 32);
    }

    #[test]
    fn key_order_invariance_produces_identical_bytes() {
        let a = encode_records(&[json!({"id": 1, "name": "Alice"})]);
        let b = encode_records(&[json!({"name": "Alice", "id": 1})]);
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn dictionary_deduplicates_repeated_strings() {
        let records: Vec<serde_json::Value> = (0..1000)
            .map(|i| {
                let status = match i % 4 {
                    0 => "open",
                    1 => "closed",
                    2 => "pending",
                    _ => "archived",
                };
                json!({"id": i, "status": status})
            })
            .collect();
        let ir = encode_records(&records);
        // dictionary: "id", "status", plus the 4 distinct status strings.
        assert_eq!(ir.strings.len(), 6);
    }

    #[test]
    fn encoded_length_beats_json_for_dense_low_cardinality_rows() {
        let records: Vec<serde_json::Value> = (0..200)
            .map(|i| json!({"id": i, "status": if i % 2 == 0 { "open" } else { "closed" }}))
            .collect();
        let ir = encode_records(&records);
        let json_len = serde_json::to_string(&records).unwrap().len();
        assert!(ir.bytes.len() < json_len, "{} !< {}", ir.bytes.len(), json_len);
    }
}
