//! Thin wrappers around `integer-encoding`'s LEB128 implementation so the
//! rest of the crate reads in terms of "unsigned varint" / "zig-zag varint"
//! rather than a generic `VarInt` trait (`spec.md` §6.1).

use integer_encoding::{VarInt, VarIntReader, VarIntWriter};
use std::io::{Cursor, Read};

use crate::error::{CodecError, DecodeErrorKind};

/// Writes an unsigned varint (plain LEB128, no zig-zag).
pub fn write_u64(out: &mut Vec<u8>, value: u64) {
    out.write_varint(value).expect("Vec<u8> writes never fail");
}

/// Writes a zig-zag varint for a signed integer.
pub fn write_i64(out: &mut Vec<u8>, value: i64) {
    out.write_varint(value).expect("Vec<u8> writes never fail");
}

/// Reads an unsigned varint, advancing `cursor`.
pub fn read_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64, CodecError> {
    cursor
        .read_varint::<u64>()
        .map_err(|_| CodecError::decode(cursor.position() as usize, DecodeErrorKind::Truncated))
}

/// Reads a zig-zag varint, advancing `cursor`.
pub fn read_i64(cursor: &mut Cursor<&[u8]>) -> Result<i64, CodecError> {
    cursor
        .read_varint::<i64>()
        .map_err(|_| CodecError::decode(cursor.position() as usize, DecodeErrorKind::Truncated))
}

/// Reads exactly `n` raw bytes, advancing `cursor`.
pub fn read_exact(cursor: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<u8>, CodecError> {
    let mut buf = vec![0u8; n];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| CodecError::decode(cursor.position() as usize, DecodeErrorKind::Truncated))?;
    Ok(buf)
}

/// Reads a single raw byte, advancing `cursor`.
pub fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| CodecError::decode(cursor.position() as usize, DecodeErrorKind::Truncated))?;
    Ok(buf[0])
}

/// Peeks the next byte without advancing `cursor`, if any remain.
pub fn peek_u8(cursor: &Cursor<&[u8]>) -> Option<u8> {
    let pos = cursor.position() as usize;
    cursor.get_ref().get(pos).copied()
}

/// Minimal-length check: `integer-encoding` always emits the shortest form,
/// so this exists only to document the determinism invariant at call sites
/// (`spec.md` §4.4 "no overlong forms").
pub fn required_len_u64(value: u64) -> usize {
    value.required_space()
}

pub fn new_cursor(bytes: &[u8]) -> Cursor<&[u8]> {
    Cursor::new(bytes)
}
