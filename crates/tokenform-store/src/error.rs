use thiserror::Error;

/// Errors raised by [`crate::TokenMemory`] (`spec.md` §4.6, §7).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No IR is stored under the requested hash.
    #[error("no IR stored under hash `{0}`")]
    IrNotFound(String),

    /// An on-disk IR file failed to decode or its self-seal did not verify.
    #[error("stored IR under `{0}` is corrupted")]
    Corruption(String),

    /// Underlying filesystem I/O failed.
    #[error("storage I/O error at {path}: {source}")]
    StorageIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A decode error surfaced while reading back a stored IR file.
    #[error(transparent)]
    Codec(#[from] tokenform_codec::CodecError),

    /// A tokenizer failure surfaced while materializing.
    #[error(transparent)]
    Tokenizer(#[from] tokenform_tokenizer::TokenizerError),

    /// Token count produced during materialization exceeded the caller's
    /// declared context-window limit.
    #[error("materialized text needs {needed} tokens, limit is {limit}")]
    ContextWindowExceeded { needed: usize, limit: usize },
}
