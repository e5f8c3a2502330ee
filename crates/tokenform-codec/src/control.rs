//! The fixed control-token alphabet and framing constants (`spec.md` §6.1).
//!
//! Control tokens occupy `0x00..=0x1F`. `0x00..=0x0F` are the core tokens
//! this encoder version actually emits (plus two reserved-but-unused ones,
//! kept as named constants so a future encoder version can start emitting
//! them without renumbering anything). `0x10..=0x1F` is the forward-compatible
//! range: a decoder that doesn't recognize a code there skips its
//! length-prefixed payload instead of failing.

pub const TENS_MAGIC: [u8; 4] = *b"TENS";
pub const TENS_VERSION: u8 = 0x02;
pub const BLOCK_SIZE: usize = 256;

pub const CTRL_DICT_BEGIN: u8 = 0x01;
pub const CTRL_DICT_END: u8 = 0x02;
pub const CTRL_SCHEMA_BEGIN: u8 = 0x03;
pub const CTRL_SCHEMA_END: u8 = 0x04;
pub const CTRL_BLOCK_BEGIN: u8 = 0x05;
pub const CTRL_BLOCK_END: u8 = 0x06;
pub const CTRL_ARRAY_BEGIN: u8 = 0x07;
pub const CTRL_OBJECT_BEGIN: u8 = 0x08;
pub const CTRL_OBJECT_END: u8 = 0x09;
/// Reserved for dictionary-aligned boolean encoding; this encoder always
/// uses the one-byte bool form instead (`spec.md` §4.4).
pub const CTRL_TRUE: u8 = 0x0A;
pub const CTRL_FALSE: u8 = 0x0B;
pub const CTRL_EOF: u8 = 0x0C;

/// First control code in the forward-compatible, skippable range.
pub const CTRL_COMPAT_RANGE_START: u8 = 0x10;
/// Last control code in the forward-compatible, skippable range.
pub const CTRL_COMPAT_RANGE_END: u8 = 0x1F;

/// Offset added to dictionary-reference varints before encoding, so a bare
/// small integer never aliases a control byte if read out of position.
pub const DICT_REF_BASE: u64 = 0x20;
/// Offset added to array-length varints before encoding.
pub const ARRAY_LEN_BASE: u64 = 0x20;
/// Offset reserved for presence-mask chunking in a future streaming variant;
/// presence masks in this encoder are fixed-width raw bytes, not varints, so
/// this constant is not applied anywhere today (`spec.md` §9, streaming).
pub const MASK_CHUNK_BASE: u64 = 0x20;

pub fn is_forward_compat(byte: u8) -> bool {
    (CTRL_COMPAT_RANGE_START..=CTRL_COMPAT_RANGE_END).contains(&byte)
}
