//! # TokenForm
//!
//! A token-efficient, canonical, content-addressable encoding system for
//! heterogeneous records, built for injecting structured data into LLM
//! prompts.
//!
//! ## Value proposition
//!
//! - **Structural deduplication** — repeated field names and string values
//!   are emitted once, via a shared dictionary.
//! - **Canonical form** — semantically equivalent inputs (same fields, any
//!   key order) yield byte-identical output and therefore identical content
//!   hashes, enabling content-addressable caching and prefix-cache reuse on
//!   inference servers.
//! - **Round-trip fidelity** — the canonicalized form decodes back to the
//!   original logical records, modulo documented normalizations (sorted
//!   keys, flattened nesting, shortest-round-trip numbers).
//!
//! ## Pipeline
//!
//! ```text
//! records ─► Validator ─► Canonicalizer ─► Encoder ─► IR bytes (+hash)
//!                                             │
//!                                             ├─► TokenMemory (dedup store)
//!                                             │
//!                                             ▼
//!                               Tokenizer Manager ─► Materializer ─► token IDs
//! ```
//!
//! [`TokenForm`] is the single entry point downstream code imports; it ties
//! together `tokenform-ir`, `tokenform-codec`, `tokenform-tokenizer`, and
//! `tokenform-store` into the pipeline above.

mod config;
mod error;

pub use config::{CanonicalizeConfig, GlobalConfig, StoreConfig, TokenFormConfig};
pub use error::TokenFormError;

pub use tokenform_codec::{DecodeErrorKind, DecodedIr, EncodeErrorKind, EncodedIr};
pub use tokenform_ir::{CanonicalizationKind, Record, Schema, StringTable, TypeTag, Value, ValidationKind};
pub use tokenform_store::{MaterializeOptions, MaterializeResult, StoreResult};
pub use tokenform_tokenizer::{resolve_encoding, EncodingTag, TokenizerCache};

use tokenform_ir::{canonicalize, validate, CanonicalizeOptions};
use tokenform_store::TokenMemory;

/// Result type for the facade.
pub type Result<T> = std::result::Result<T, TokenFormError>;

/// The unified TokenForm pipeline facade.
///
/// Owns a [`TokenMemory`] rooted at [`StoreConfig::root`] and a
/// process-isolated [`TokenizerCache`]. Construct one per store root; it is
/// cheap to hold for the lifetime of a process.
pub struct TokenForm {
    config: TokenFormConfig,
    store: TokenMemory,
    tokenizers: TokenizerCache,
}

impl TokenForm {
    /// Opens (creating if absent) the store rooted at `config.store.root`.
    pub fn new(config: TokenFormConfig) -> Result<Self> {
        let store = TokenMemory::open(&config.store.root)?;
        Ok(Self {
            config,
            store,
            tokenizers: TokenizerCache::new(),
        })
    }

    pub fn config(&self) -> &TokenFormConfig {
        &self.config
    }

    /// Validates, canonicalizes, and encodes `records`, without storing them.
    #[tracing::instrument(level = "debug", skip(self, records), fields(count = records.len()))]
    pub fn encode_records(&self, records: &[serde_json::Value]) -> Result<EncodedIr> {
        validate(records)?;
        let opts = CanonicalizeOptions {
            unify_schemas: self.config.canonicalize.unify_schemas,
        };
        let (schemas, rows) = canonicalize(records, opts)?;
        let ir = tokenform_codec::encode(schemas, rows)?;
        Ok(ir)
    }

    /// Encodes `records` and writes the result to the store, returning the
    /// content hash and whether this call created a new entry.
    pub fn encode_and_store(&self, records: &[serde_json::Value]) -> Result<StoreResult> {
        let ir = self.encode_records(records)?;
        Ok(self.store.store_ir(&ir.hash, &ir.bytes)?)
    }

    /// Loads and decodes the IR stored under `hash`.
    pub fn load(&self, hash: &str) -> Result<DecodedIr> {
        Ok(self.store.load(hash)?)
    }

    /// Resolves `model_id` to an encoding and returns its tokenized canonical
    /// text for the IR stored under `hash`, rendering and caching on miss.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn materialize(&self, hash: &str, model_id: &str) -> Result<MaterializeResult> {
        let opts = MaterializeOptions {
            max_tokens: self.config.store.default_max_tokens,
            strict_model_resolution: self.config.global.strict_model_resolution,
        };
        Ok(self.store.materialize_and_cache(hash, model_id, &self.tokenizers, opts)?)
    }
}

#[cfg(test)]
mod tests;
