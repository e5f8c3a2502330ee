//! # TokenMemory — content-addressed IR store and materialization cache
//!
//! As `spec.md` §4.6. `TokenMemory` owns a directory tree ([`crate::storage::Layout`])
//! holding two kinds of entries:
//!
//! - `ir/<hash[0:2]>/<hash>.bin` — immutable, written once per distinct hash.
//! - `mat/<encoding>/<hash>.tok` — derived, recomputable from the IR plus the
//!   tokenizer encoding; a stale [`tokenform_tokenizer::TOKENIZER_VERSION`]
//!   triggers exactly one rebuild (`spec.md` §4.7, §7).

use std::path::Path;

use tokenform_codec::{decode, DecodedIr};
use tokenform_tokenizer::{resolve_encoding, resolve_encoding_strict, EncodingTag, TokenizerCache, TOKENIZER_VERSION};

use crate::error::StoreError;
use crate::materialize::{decode_tok_file, encode_tok_file, render_canonical_text};
use crate::storage::{self, Layout};

/// Result of [`TokenMemory::store_ir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResult {
    pub hash: String,
    /// `false` if a file with this hash already existed (a previous writer,
    /// possibly this process, won the race first).
    pub is_new: bool,
}

/// Result of [`TokenMemory::materialize_and_cache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeResult {
    pub tokens: Vec<u32>,
    pub cache_hit: bool,
}

/// Per-call knobs for [`TokenMemory::materialize_and_cache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// If set, [`StoreError::ContextWindowExceeded`] is raised when the
    /// materialized token count exceeds this limit.
    pub max_tokens: Option<usize>,

    /// When `true`, an unrecognized `model_id` is rejected with
    /// [`tokenform_tokenizer::TokenizerError::ModelNotFound`] rather than
    /// silently falling back to `o200k_base` (`spec.md` §4.7).
    pub strict_model_resolution: bool,
}

pub struct TokenMemory {
    layout: Layout,
}

impl TokenMemory {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self {
            layout: Layout::new(root.as_ref())?,
        })
    }

    /// Writes already-encoded IR bytes under their content hash, iff absent.
    /// Idempotent and safe under concurrent writers.
    pub fn store_ir(&self, hash: &str, bytes: &[u8]) -> Result<StoreResult, StoreError> {
        let path = self.layout.ir_path(hash);
        let is_new = storage::write_if_absent(&path, bytes)?;
        if is_new {
            tracing::debug!(hash, "stored new IR");
        }
        Ok(StoreResult {
            hash: hash.to_string(),
            is_new,
        })
    }

    /// Loads and decodes the IR stored under `hash`, verifying its self-seal.
    pub fn load(&self, hash: &str) -> Result<DecodedIr, StoreError> {
        let path = self.layout.ir_path(hash);
        let bytes = storage::read(&path)?.ok_or_else(|| StoreError::IrNotFound(hash.to_string()))?;
        decode(&bytes).map_err(|_| StoreError::Corruption(hash.to_string()))
    }

    /// Resolves `model_id` to an encoding, returns its cached token IDs for
    /// `hash` if present and current, otherwise renders, tokenizes, and
    /// caches them.
    pub fn materialize_and_cache(
        &self,
        hash: &str,
        model_id: &str,
        tokenizers: &TokenizerCache,
        opts: MaterializeOptions,
    ) -> Result<MaterializeResult, StoreError> {
        let encoding = self.resolve(model_id, opts.strict_model_resolution)?;
        let mat_path = self.layout.mat_path(hash, encoding.as_str());

        if let Some(bytes) = storage::read(&mat_path)? {
            let (tokenizer_version, tokens) = decode_tok_file(&bytes)?;
            if tokenizer_version == TOKENIZER_VERSION {
                check_context_window(&tokens, opts.max_tokens)?;
                return Ok(MaterializeResult {
                    tokens,
                    cache_hit: true,
                });
            }
            tracing::debug!(hash, found = tokenizer_version, expected = TOKENIZER_VERSION, "rebuilding stale materialization cache entry");
        }

        let ir = self.load(hash)?;
        let text = render_canonical_text(&ir.records);
        let tokens = tokenizers.tokenize(&text, encoding)?;
        check_context_window(&tokens, opts.max_tokens)?;

        let encoded = encode_tok_file(&tokens, TOKENIZER_VERSION);
        storage::write_overwrite(&mat_path, &encoded)?;

        Ok(MaterializeResult {
            tokens,
            cache_hit: false,
        })
    }

    fn resolve(&self, model_id: &str, strict: bool) -> Result<EncodingTag, StoreError> {
        if strict {
            Ok(resolve_encoding_strict(model_id)?)
        } else {
            Ok(resolve_encoding(model_id))
        }
    }
}

fn check_context_window(tokens: &[u32], max_tokens: Option<usize>) -> Result<(), StoreError> {
    if let Some(limit) = max_tokens {
        if tokens.len() > limit {
            return Err(StoreError::ContextWindowExceeded {
                needed: tokens.len(),
                limit,
            });
        }
    }
    Ok(())
}
