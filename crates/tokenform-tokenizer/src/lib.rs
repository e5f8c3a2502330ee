//! # TokenForm tokenizer — model-to-encoding resolution and BPE tokenization
//!
//! Maps a model identifier to one of a handful of BPE vocabularies and
//! tokenizes text under it (`spec.md` §4.7). This crate knows nothing about
//! the IR or the wire format; `tokenform-store`'s Materializer is the only
//! caller that ties tokenization to a particular `TokenMemory` entry.

pub mod error;
pub mod manager;

pub use error::TokenizerError;
pub use manager::{resolve_encoding, resolve_encoding_strict, tokenize, EncodingTag, TokenizerCache, TOKENIZER_VERSION};

/// Result type shared by this crate.
pub type Result<T> = std::result::Result<T, TokenizerError>;
