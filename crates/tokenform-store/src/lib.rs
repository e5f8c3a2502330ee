//! # TokenForm store — content-addressed IR storage and materialization
//!
//! `TokenMemory` is the only stateful component in the TokenForm pipeline: a
//! flat, content-addressed filesystem tree holding immutable IR bytes plus a
//! derived per-(hash, model-encoding) cache of tokenized text (`spec.md`
//! §4.6). Everything upstream — validation, canonicalization, encoding — is
//! pure given its inputs; this crate is where those pure results get a home.

pub mod error;
pub mod materialize;
pub mod memory;
pub mod storage;

pub use error::StoreError;
pub use materialize::render_canonical_text;
pub use memory::{MaterializeOptions, MaterializeResult, StoreResult, TokenMemory};

/// Result type shared by this crate.
pub type Result<T> = std::result::Result<T, StoreError>;
