//! # Materializer
//!
//! Renders a decoded IR to the canonical text injected into prompts, and
//! frames/parses the on-disk token-cache file format (`spec.md` §4.8, §6.2).

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use tokenform_ir::canonicalize::format_number;
use tokenform_ir::{Record, Value};

use crate::error::StoreError;

const MAT_MAGIC: [u8; 4] = *b"TMAT";
const MAT_FORMAT_VERSION: u8 = 1;

/// Renders decoded canonical records as minified JSON: sorted keys, no
/// whitespace, no trailing newline (`spec.md` §6.3). This text is the sole
/// surface tokenizers see; changing it breaks prefix-cache hashes.
///
/// Built by hand rather than through `serde_json::to_string` on a
/// `serde_json::Value` tree: `serde_json::Number::from_f64` renders a
/// whole-number float as `5.0`, not the `format_number`/`format_float`
/// shortest-round-trip form (`tokenform_ir::canonicalize`) that the rest of
/// the pipeline treats as canonical.
pub fn render_canonical_text(records: &[Record]) -> String {
    let mut out = String::from("[");
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_record(record, &mut out);
    }
    out.push(']');
    out
}

fn write_record(record: &Record, out: &mut String) {
    // `Record` is a `BTreeMap`, so this iterates in sorted key order already.
    out.push('{');
    for (i, (key, value)) in record.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_json_string(key, out);
        out.push(':');
        write_value(value, out);
    }
    out.push('}');
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(_) | Value::Float(_) => out.push_str(&format_number(value)),
        Value::Str(s) => write_json_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Record(sub) => write_record(sub, out),
    }
}

/// Writes `s` as a quoted, JSON-escaped string, reusing `serde_json`'s own
/// escaping rules rather than hand-rolling them.
fn write_json_string(s: &str, out: &mut String) {
    out.push_str(&serde_json::to_string(s).expect("strings always serialize"));
}

/// Frames a token-cache file: `magic(4) format_ver(1) tokenizer_ver(1)
/// reserved(2)` followed by each token ID as a little-endian `i32`.
pub fn encode_tok_file(tokens: &[u32], tokenizer_version: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + tokens.len() * 4);
    out.extend_from_slice(&MAT_MAGIC);
    out.push(MAT_FORMAT_VERSION);
    out.push(tokenizer_version);
    out.extend_from_slice(&[0, 0]);
    for &id in tokens {
        out.write_i32::<LittleEndian>(id as i32).expect("Vec<u8> writes never fail");
    }
    out
}

/// Parses a token-cache file, returning the tokenizer version it was built
/// with and the token IDs. The caller compares the returned version against
/// [`tokenform_tokenizer::TOKENIZER_VERSION`] and discards a stale cache
/// (`spec.md` §4.7 "on version mismatch the cache is invalidated lazily").
pub fn decode_tok_file(bytes: &[u8]) -> Result<(u8, Vec<u32>), StoreError> {
    if bytes.len() < 8 || bytes[0..4] != MAT_MAGIC {
        return Err(StoreError::Corruption("materialization cache file".to_string()));
    }
    let format_version = bytes[4];
    if format_version != MAT_FORMAT_VERSION {
        return Err(StoreError::Corruption("materialization cache file".to_string()));
    }
    let tokenizer_version = bytes[5];
    let payload = &bytes[8..];
    if payload.len() % 4 != 0 {
        return Err(StoreError::Corruption("materialization cache file".to_string()));
    }
    let mut cursor = Cursor::new(payload);
    let mut tokens = Vec::with_capacity(payload.len() / 4);
    for _ in 0..(payload.len() / 4) {
        let id = cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| StoreError::Corruption("materialization cache file".to_string()))?;
        tokens.push(id as u32);
    }
    Ok((tokenizer_version, tokens))
}
