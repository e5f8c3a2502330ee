use thiserror::Error;

/// Errors raised while resolving or invoking a tokenizer (`spec.md` §4.7, §7).
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// `resolve_encoding` was called in strict mode against a model ID it
    /// does not recognize. Outside strict mode, unresolved models fall back
    /// to the default encoding instead of producing this error.
    #[error("unknown model id `{0}`")]
    ModelNotFound(String),

    /// The underlying BPE vocabulary failed to load.
    #[error("failed to load `{encoding}` tokenizer: {source}")]
    VocabLoad {
        encoding: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A materialization-cache file was written by an older tokenizer
    /// version and must be rebuilt (`spec.md` §4.7 `TOKENIZER_VERSION`).
    #[error("tokenizer cache is stale: found version {found}, expected {expected}")]
    VersionMismatch { found: u8, expected: u8 },
}
