use thiserror::Error;

/// Why the encoder refused a value (`spec.md` §4.4, §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// A float value was NaN or infinite; the encoder never lossy-coerces.
    NonFiniteFloat,
    /// The string dictionary would exceed 2^31 entries.
    DictionaryOverflow,
    /// A row block would exceed [`crate::control::BLOCK_SIZE`].
    BlockOverflow,
    /// A value kind has no wire encoding at this position.
    UnsupportedValue(&'static str),
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteFloat => write!(f, "non-finite float"),
            Self::DictionaryOverflow => write!(f, "dictionary exceeds 2^31 entries"),
            Self::BlockOverflow => write!(f, "row block exceeds BLOCK_SIZE"),
            Self::UnsupportedValue(kind) => write!(f, "unsupported value kind `{kind}`"),
        }
    }
}

/// Why the decoder rejected a byte stream (`spec.md` §4.5, §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    BadMagic,
    BadVersion { found: u8 },
    Truncated,
    BadTrailer,
    DictionaryOutOfRange { id: u32, len: u32 },
    SchemaOutOfRange { id: u32, len: u32 },
    UnknownControlCode { byte: u8 },
    UnexpectedToken { expected: u8, found: u8 },
    InvalidUtf8,
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadMagic => write!(f, "bad magic bytes"),
            Self::BadVersion { found } => write!(f, "unsupported version byte 0x{found:02x}"),
            Self::Truncated => write!(f, "unexpected end of stream"),
            Self::BadTrailer => write!(f, "trailer self-seal mismatch"),
            Self::DictionaryOutOfRange { id, len } => {
                write!(f, "dictionary reference {id} out of range (len {len})")
            }
            Self::SchemaOutOfRange { id, len } => {
                write!(f, "schema reference {id} out of range (len {len})")
            }
            Self::UnknownControlCode { byte } => {
                write!(f, "unknown control code 0x{byte:02x} outside compatibility range")
            }
            Self::UnexpectedToken { expected, found } => write!(
                f,
                "expected control token 0x{expected:02x}, found 0x{found:02x}"
            ),
            Self::InvalidUtf8 => write!(f, "dictionary entry is not valid UTF-8"),
        }
    }
}

/// Error type for the encode/decode stages.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Ir(#[from] tokenform_ir::IrError),

    #[error("encode failed at {path}: {kind}")]
    Encode {
        path: String,
        kind: EncodeErrorKind,
    },

    #[error("decode failed at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },
}

impl CodecError {
    pub fn encode(path: impl Into<String>, kind: EncodeErrorKind) -> Self {
        Self::Encode {
            path: path.into(),
            kind,
        }
    }

    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }
}
