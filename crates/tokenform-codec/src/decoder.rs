//! Inverse framing: bytes back to canonical records (`spec.md` §4.5).
//!
//! Magic, version, and the trailer self-seal are checked before any
//! structural parse — a truncated or corrupted stream fails fast without
//! walking a dictionary or schema table that may not even be there.

use byteorder::{LittleEndian, ReadBytesExt};
use sha2::{Digest, Sha256};
use std::io::Cursor;

use tokenform_ir::{Record, Schema, StringTable, TypeTag, Value};

use crate::control::*;
use crate::error::{CodecError, DecodeErrorKind};
use crate::varint::{new_cursor, peek_u8, read_exact, read_i64, read_u64, read_u8};

/// Records and supporting tables recovered from a byte stream.
#[derive(Debug, Clone)]
pub struct DecodedIr {
    pub schemas: Vec<Schema>,
    pub strings: StringTable,
    pub records: Vec<Record>,
}

const TRAILER_LEN: usize = 1 + 32; // CTRL_EOF + 32-byte seal
const HEADER_LEN: usize = 4 + 1 + 1; // magic + version + reserved

/// Decodes a byte stream produced by [`crate::encoder::encode`].
#[tracing::instrument(level = "trace", skip(bytes), fields(bytes = bytes.len()))]
pub fn decode(bytes: &[u8]) -> Result<DecodedIr, CodecError> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(CodecError::decode(bytes.len(), DecodeErrorKind::Truncated));
    }
    if bytes[0..4] != TENS_MAGIC {
        return Err(CodecError::decode(0, DecodeErrorKind::BadMagic));
    }
    if bytes[4] != TENS_VERSION {
        return Err(CodecError::decode(
            4,
            DecodeErrorKind::BadVersion { found: bytes[4] },
        ));
    }

    let trailer_start = bytes.len() - TRAILER_LEN;
    if bytes[trailer_start] != CTRL_EOF {
        return Err(CodecError::decode(trailer_start, DecodeErrorKind::BadTrailer));
    }
    let stored_seal = &bytes[trailer_start + 1..];
    let computed_seal = Sha256::digest(&bytes[..trailer_start]);
    if stored_seal != computed_seal.as_slice() {
        return Err(CodecError::decode(trailer_start, DecodeErrorKind::BadTrailer));
    }

    let mut cursor = new_cursor(&bytes[HEADER_LEN..trailer_start]);
    let strings = decode_dictionary(&mut cursor)?;
    let schemas = decode_schema_table(&mut cursor, &strings)?;
    let records = decode_row_blocks(&mut cursor, &schemas, &strings)?;
    tracing::trace!(records = records.len(), schemas = schemas.len(), "decoded IR");

    Ok(DecodedIr {
        schemas,
        strings,
        records,
    })
}

fn expect(cursor: &mut Cursor<&[u8]>, expected: u8) -> Result<(), CodecError> {
    let found = read_u8(cursor)?;
    if found != expected {
        return Err(CodecError::decode(
            cursor.position() as usize,
            DecodeErrorKind::UnexpectedToken { expected, found },
        ));
    }
    Ok(())
}

fn decode_dictionary(cursor: &mut Cursor<&[u8]>) -> Result<StringTable, CodecError> {
    expect(cursor, CTRL_DICT_BEGIN)?;
    let count = read_u64(cursor)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = read_u64(cursor)? as usize;
        let bytes = read_exact(cursor, len)?;
        let s = String::from_utf8(bytes)
            .map_err(|_| CodecError::decode(cursor.position() as usize, DecodeErrorKind::InvalidUtf8))?;
        entries.push(s);
    }
    expect(cursor, CTRL_DICT_END)?;
    Ok(StringTable::from_entries(entries))
}

fn dict_lookup(strings: &StringTable, raw_ref: u64, offset: usize) -> Result<String, CodecError> {
    if raw_ref < DICT_REF_BASE {
        return Err(CodecError::decode(
            offset,
            DecodeErrorKind::DictionaryOutOfRange {
                id: raw_ref as u32,
                len: strings.len() as u32,
            },
        ));
    }
    let id = (raw_ref - DICT_REF_BASE) as u32;
    strings
        .get(id)
        .map(str::to_owned)
        .ok_or_else(|| CodecError::decode(
            offset,
            DecodeErrorKind::DictionaryOutOfRange {
                id,
                len: strings.len() as u32,
            },
        ))
}

fn decode_schema_table(
    cursor: &mut Cursor<&[u8]>,
    strings: &StringTable,
) -> Result<Vec<Schema>, CodecError> {
    expect(cursor, CTRL_SCHEMA_BEGIN)?;
    let schema_count = read_u64(cursor)?;
    let mut schemas = Vec::with_capacity(schema_count as usize);
    for id in 0..schema_count {
        let offset = cursor.position() as usize;
        let field_count = read_u64(cursor)? as usize;
        let mut names = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let raw_ref = read_u64(cursor)?;
            names.push(dict_lookup(strings, raw_ref, offset)?);
        }
        let mut fields = Vec::with_capacity(field_count);
        for name in names {
            let tag_byte = read_u8(cursor)?;
            let tag = TypeTag::from_byte(tag_byte).ok_or_else(|| {
                CodecError::decode(cursor.position() as usize, DecodeErrorKind::UnknownControlCode { byte: tag_byte })
            })?;
            fields.push((name, tag));
        }
        schemas.push(Schema {
            id: id as u32,
            fields,
        });
    }
    expect(cursor, CTRL_SCHEMA_END)?;
    Ok(schemas)
}

fn decode_row_blocks(
    cursor: &mut Cursor<&[u8]>,
    schemas: &[Schema],
    strings: &StringTable,
) -> Result<Vec<Record>, CodecError> {
    let mut records = Vec::new();
    let total_len = cursor.get_ref().len();
    // The real trailer was already sliced off before this cursor was built
    // (`decode` passes `&bytes[HEADER_LEN..trailer_start]`), so reaching the
    // end of this slice is the only legitimate way to finish this loop.
    while (cursor.position() as usize) < total_len {
        let next = peek_u8(cursor).expect("position checked above");
        if next == CTRL_BLOCK_BEGIN {
            read_u8(cursor)?;
            let schema_id = read_u64(cursor)? as u32;
            let schema = schemas.get(schema_id as usize).ok_or_else(|| {
                CodecError::decode(
                    cursor.position() as usize,
                    DecodeErrorKind::SchemaOutOfRange {
                        id: schema_id,
                        len: schemas.len() as u32,
                    },
                )
            })?;
            let row_count = read_u64(cursor)?;
            for _ in 0..row_count {
                let row = decode_row_fields(cursor, schema, schemas, strings)?;
                records.push(row);
            }
            expect(cursor, CTRL_BLOCK_END)?;
        } else if is_forward_compat(next) {
            read_u8(cursor)?;
            let skip_len = read_u64(cursor)? as usize;
            read_exact(cursor, skip_len)?;
        } else {
            return Err(CodecError::decode(
                cursor.position() as usize,
                DecodeErrorKind::UnknownControlCode { byte: next },
            ));
        }
    }
    Ok(records)
}

fn decode_row_fields(
    cursor: &mut Cursor<&[u8]>,
    schema: &Schema,
    schemas: &[Schema],
    strings: &StringTable,
) -> Result<Record, CodecError> {
    let mask_len = (schema.fields.len() + 7) / 8;
    let mask = read_exact(cursor, mask_len)?;
    let mut row = Record::new();
    for (idx, (name, _)) in schema.fields.iter().enumerate() {
        let present = mask[idx / 8] & (0x80 >> (idx % 8)) != 0;
        let value = if present {
            decode_value(cursor, schemas, strings)?
        } else {
            Value::Null
        };
        row.insert(name.clone(), value);
    }
    Ok(row)
}

fn decode_value(
    cursor: &mut Cursor<&[u8]>,
    schemas: &[Schema],
    strings: &StringTable,
) -> Result<Value, CodecError> {
    let tag = read_u8(cursor)?;
    match tag {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(read_u8(cursor)? != 0)),
        2 => Ok(Value::Int(read_i64(cursor)?)),
        3 => {
            let bytes = read_exact(cursor, 8)?;
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&bytes);
            Ok(Value::Float(
                Cursor::new(&arr[..])
                    .read_f64::<LittleEndian>()
                    .expect("exactly 8 bytes"),
            ))
        }
        4 => {
            let offset = cursor.position() as usize;
            let raw_ref = read_u64(cursor)?;
            Ok(Value::Str(dict_lookup(strings, raw_ref, offset)?))
        }
        CTRL_ARRAY_BEGIN => {
            let raw_len = read_u64(cursor)?;
            let len = raw_len.saturating_sub(ARRAY_LEN_BASE) as usize;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(decode_value(cursor, schemas, strings)?);
            }
            Ok(Value::Array(items))
        }
        CTRL_OBJECT_BEGIN => {
            let schema_id = read_u64(cursor)? as u32;
            let schema = schemas.get(schema_id as usize).ok_or_else(|| {
                CodecError::decode(
                    cursor.position() as usize,
                    DecodeErrorKind::SchemaOutOfRange {
                        id: schema_id,
                        len: schemas.len() as u32,
                    },
                )
            })?;
            let row = decode_row_fields(cursor, schema, schemas, strings)?;
            expect(cursor, CTRL_OBJECT_END)?;
            Ok(Value::Record(row))
        }
        other => Err(CodecError::decode(
            cursor.position() as usize,
            DecodeErrorKind::UnknownControlCode { byte: other },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use serde_json::json;
    use tokenform_ir::{canonicalize, CanonicalizeOptions};

    fn roundtrip(records: &[serde_json::Value]) -> Vec<Record> {
        let (schemas, rows) = canonicalize(records, CanonicalizeOptions::default()).unwrap();
        let ir = encode(schemas, rows).unwrap();
        decode(&ir.bytes).unwrap().records
    }

    #[test]
    fn empty_list_roundtrips() {
        assert_eq!(roundtrip(&[]).len(), 0);
    }

    #[test]
    fn single_null_field_has_zero_presence_mask() {
        let records = vec![json!({"a": null})];
        let (schemas, rows) = canonicalize(&records, CanonicalizeOptions::default()).unwrap();
        let ir = encode(schemas, rows).unwrap();
        // HEADER(6) DICT_BEGIN,count=1,len=1,'a',DICT_END = 6 + 1+1+1+1+1 = 11
        assert_eq!(ir.bytes[11], CTRL_SCHEMA_BEGIN);
        let decoded = decode(&ir.bytes).unwrap();
        assert_eq!(decoded.records[0].get("a"), Some(&Value::Null));
    }

    #[test]
    fn sparse_unification_roundtrips_with_nulls() {
        let records = vec![json!({"a": 1}), json!({"a": 2, "b": 3})];
        let decoded = roundtrip(&records);
        assert_eq!(decoded[0].get("b"), Some(&Value::Null));
        assert_eq!(decoded[1].get("b"), Some(&Value::Int(3)));
    }

    #[test]
    fn array_of_records_roundtrips() {
        let records = vec![json!({"tags": [{"k": "a"}, {"k": "b", "v": 1}]})];
        let decoded = roundtrip(&records);
        match decoded[0].get("tags").unwrap() {
            Value::Array(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(&items[0], Value::Record(r) if r.get("k") == Some(&Value::Str("a".into()))));
            }
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn corrupted_dictionary_byte_fails_trailer_check() {
        let records = vec![json!({"id": 1, "name": "Alice"})];
        let (schemas, rows) = canonicalize(&records, CanonicalizeOptions::default()).unwrap();
        let ir = encode(schemas, rows).unwrap();
        let mut corrupted = ir.bytes.clone();
        // Flip a byte inside the dictionary area (just past the header).
        corrupted[7] ^= 0xFF;
        let err = decode(&corrupted).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Decode {
                kind: DecodeErrorKind::BadTrailer,
                ..
            }
        ));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = vec![0u8; 64];
        bytes[0..4].copy_from_slice(b"NOPE");
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Decode {
                kind: DecodeErrorKind::BadMagic,
                ..
            }
        ));
    }

    #[test]
    fn block_rollover_at_exact_block_size() {
        let records: Vec<serde_json::Value> = (0..BLOCK_SIZE * 2)
            .map(|i| json!({"id": i as i64}))
            .collect();
        let decoded = roundtrip(&records);
        assert_eq!(decoded.len(), BLOCK_SIZE * 2);
        assert_eq!(decoded[0].get("id"), Some(&Value::Int(0)));
        assert_eq!(
            decoded[BLOCK_SIZE * 2 - 1].get("id"),
            Some(&Value::Int((BLOCK_SIZE * 2 - 1) as i64))
        );
    }

    #[quickcheck_macros::quickcheck]
    fn decode_of_encode_is_identity(ids: Vec<i64>) -> bool {
        let records: Vec<serde_json::Value> =
            ids.iter().map(|i| json!({"id": i, "n": "x"})).collect();
        let (schemas, rows) = canonicalize(&records, CanonicalizeOptions::default()).unwrap();
        let ir = encode(schemas.clone(), rows.clone()).unwrap();
        let decoded = decode(&ir.bytes).unwrap();
        let expected: Vec<Record> = rows.into_iter().map(|(_, r)| r).collect();
        decoded.records == expected
    }

    #[quickcheck_macros::quickcheck]
    fn re_encoding_decoded_output_is_idempotent(ids: Vec<i64>) -> bool {
        let records: Vec<serde_json::Value> = ids.iter().map(|i| json!({"id": i})).collect();
        let (schemas, rows) = canonicalize(&records, CanonicalizeOptions::default()).unwrap();
        let ir = encode(schemas, rows).unwrap();
        let decoded = decode(&ir.bytes).unwrap();
        let rows2: Vec<(u32, Record)> = decoded
            .records
            .iter()
            .map(|r| {
                let field_set: std::collections::BTreeSet<&str> =
                    r.keys().map(String::as_str).collect();
                let id = tokenform_ir::canonicalize::assign_schema(&decoded.schemas, &field_set)
                    .unwrap();
                (id, r.clone())
            })
            .collect();
        let ir2 = encode(decoded.schemas, rows2).unwrap();
        ir2.bytes == ir.bytes
    }
}
