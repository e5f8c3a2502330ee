//! # TokenForm codec — binary framing of the canonical IR
//!
//! This crate is the byte-level half of the TokenForm pipeline: it turns the
//! `(schemas, rows)` pairs produced by `tokenform_ir::canonicalize` into the
//! `TENS`-tagged wire format described in `spec.md` §4, and back.
//!
//! ```text
//! (schemas, rows) ─► encode() ─► EncodedIr { bytes, hash }
//! bytes           ─► decode() ─► DecodedIr { schemas, strings, records }
//! ```
//!
//! Every value on the wire is self-describing (a one-byte kind tag ahead of
//! scalars, a control token ahead of arrays and nested records), which is
//! what lets the decoder reconstruct records without first consulting the
//! schema's per-field type tag. See `DESIGN.md` for the rationale.

pub mod control;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod varint;

pub use decoder::{decode, DecodedIr};
pub use encoder::{encode, EncodedIr};
pub use error::{CodecError, DecodeErrorKind, EncodeErrorKind};

/// Result type shared by the encode/decode stages.
pub type Result<T> = std::result::Result<T, CodecError>;
