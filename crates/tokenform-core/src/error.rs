//! Aggregate error type for the TokenForm facade.

use thiserror::Error;

/// Facade error type wrapping every lower-level error in the pipeline.
#[derive(Debug, Error)]
pub enum TokenFormError {
    /// Configuration could not be parsed or was internally inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation or canonicalization failed.
    #[error(transparent)]
    Ir(#[from] tokenform_ir::IrError),

    /// Encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] tokenform_codec::CodecError),

    /// Tokenizer resolution or tokenization failed.
    #[error(transparent)]
    Tokenizer(#[from] tokenform_tokenizer::TokenizerError),

    /// The content-addressed store or materialization cache failed.
    #[error(transparent)]
    Store(#[from] tokenform_store::StoreError),
}
