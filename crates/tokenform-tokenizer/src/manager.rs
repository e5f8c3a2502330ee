//! Model-ID resolution and BPE tokenization (`spec.md` §4.7).

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use tiktoken_rs::CoreBPE;

use crate::error::TokenizerError;

/// Fences materialization-cache entries; bumped whenever the resolution
/// rules or underlying vocabularies change in a way that would move token
/// IDs for existing text (`spec.md` §4.7).
pub const TOKENIZER_VERSION: u8 = 1;

/// One of the BPE vocabularies this crate can load (`spec.md` §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingTag {
    Cl100kBase,
    O200kBase,
    P50kBase,
    R50kBase,
}

impl EncodingTag {
    /// The directory-safe name used for materialization-cache paths
    /// (`spec.md` §6.2 `mat/<encoding>/`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cl100kBase => "cl100k_base",
            Self::O200kBase => "o200k_base",
            Self::P50kBase => "p50k_base",
            Self::R50kBase => "r50k_base",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "cl100k_base" => Some(Self::Cl100kBase),
            "o200k_base" => Some(Self::O200kBase),
            "p50k_base" => Some(Self::P50kBase),
            "r50k_base" => Some(Self::R50kBase),
            _ => None,
        }
    }

    fn load(&self) -> anyhow::Result<CoreBPE> {
        match self {
            Self::Cl100kBase => tiktoken_rs::cl100k_base(),
            Self::O200kBase => tiktoken_rs::o200k_base(),
            Self::P50kBase => tiktoken_rs::p50k_base(),
            Self::R50kBase => tiktoken_rs::r50k_base(),
        }
    }
}

/// Maps a model identifier to the encoding the Tokenizer Manager should use
/// for it. Outside strict mode, an unrecognized model ID falls back to the
/// default encoding rather than erroring (`spec.md` §4.7).
///
/// Resolution order, first match wins:
/// 1. substring `gpt-4o` or `omni` → `o200k_base`
/// 2. substring `gpt-4`, `gpt-3.5`, or `turbo` → `cl100k_base`
/// 3. substring `gemini` → `o200k_base` (approximate)
/// 4. exact encoding name (e.g. `"cl100k_base"`) → that encoding
/// 5. otherwise → `o200k_base`
pub fn resolve_encoding(model_id: &str) -> EncodingTag {
    resolve_encoding_strict(model_id).unwrap_or(EncodingTag::O200kBase)
}

/// As [`resolve_encoding`], but returns [`TokenizerError::ModelNotFound`]
/// instead of defaulting when nothing matches.
pub fn resolve_encoding_strict(model_id: &str) -> Result<EncodingTag, TokenizerError> {
    let lower = model_id.to_ascii_lowercase();
    if lower.contains("gpt-4o") || lower.contains("omni") {
        return Ok(EncodingTag::O200kBase);
    }
    if lower.contains("gpt-4") || lower.contains("gpt-3.5") || lower.contains("turbo") {
        return Ok(EncodingTag::Cl100kBase);
    }
    if lower.contains("gemini") {
        return Ok(EncodingTag::O200kBase);
    }
    if let Some(tag) = EncodingTag::from_name(&lower) {
        return Ok(tag);
    }
    Err(TokenizerError::ModelNotFound(model_id.to_string()))
}

/// A process-wide, read-mostly cache of loaded `CoreBPE` instances keyed by
/// encoding. First-time load through an encoding is serialized; subsequent
/// lookups take a shared read lock (`spec.md` §5 "Shared state").
pub struct TokenizerCache {
    loaded: RwLock<HashMap<EncodingTag, CoreBPE>>,
}

impl TokenizerCache {
    pub fn new() -> Self {
        Self {
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the process-default cache, constructed lazily on first use.
    /// Tests that need isolation should construct their own [`TokenizerCache::new`]
    /// instead (`spec.md` §9).
    pub fn global() -> &'static TokenizerCache {
        static DEFAULT: OnceLock<TokenizerCache> = OnceLock::new();
        DEFAULT.get_or_init(TokenizerCache::new)
    }

    /// Tokenizes `text` under `encoding`, loading and caching the underlying
    /// BPE vocabulary on first use.
    pub fn tokenize(&self, text: &str, encoding: EncodingTag) -> Result<Vec<u32>, TokenizerError> {
        if let Some(bpe) = self.loaded.read().expect("lock poisoned").get(&encoding) {
            return Ok(encode(bpe, text));
        }

        let bpe = encoding.load().map_err(|source| TokenizerError::VocabLoad {
            encoding: encoding.as_str(),
            source,
        })?;
        let tokens = encode(&bpe, text);
        self.loaded.write().expect("lock poisoned").insert(encoding, bpe);
        tracing::debug!(encoding = encoding.as_str(), "loaded tokenizer vocabulary");
        Ok(tokens)
    }
}

impl Default for TokenizerCache {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(bpe: &CoreBPE, text: &str) -> Vec<u32> {
    bpe.encode_ordinary(text).into_iter().map(|id| id as u32).collect()
}

/// Tokenizes `text` under `encoding` using the process-default
/// [`TokenizerCache`]. Deterministic: repeated calls with the same
/// `(text, encoding)` return identical token sequences (`spec.md` §4.7).
pub fn tokenize(text: &str, encoding: EncodingTag) -> Result<Vec<u32>, TokenizerError> {
    TokenizerCache::global().tokenize(text, encoding)
}
