use thiserror::Error;

/// Why a record failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationKind {
    /// A number could not be represented as a finite `f64`.
    NonFiniteNumber,
    /// Nesting exceeded [`crate::MAX_DEPTH`].
    DepthExceeded { depth: usize },
    /// A field name aliases a reserved identifier.
    ReservedFieldName(String),
    /// A field name was empty.
    EmptyFieldName,
    /// A top-level record was not a JSON object.
    NotARecord,
}

impl std::fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteNumber => write!(f, "non-finite number"),
            Self::DepthExceeded { depth } => write!(f, "depth {depth} exceeds maximum"),
            Self::ReservedFieldName(name) => write!(f, "reserved field name `{name}`"),
            Self::EmptyFieldName => write!(f, "empty field name"),
            Self::NotARecord => write!(f, "top-level value is not an object"),
        }
    }
}

/// Why canonicalization failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationKind {
    /// A field name contains a literal `.`, which would be ambiguous once
    /// flattened against its sibling paths.
    DotInFieldName(String),
    /// Flattening produced two fields with the same dotted path.
    FieldCollision(String),
}

impl std::fmt::Display for CanonicalizationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DotInFieldName(name) => write!(f, "field name `{name}` contains `.`"),
            Self::FieldCollision(path) => write!(f, "field collision at `{path}`"),
        }
    }
}

/// Error type for the validation and canonicalization stages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("validation failed at {path}: {kind}")]
    Validation { path: String, kind: ValidationKind },

    #[error("canonicalization failed at {path}: {kind}")]
    Canonicalization {
        path: String,
        kind: CanonicalizationKind,
    },
}

impl IrError {
    pub fn validation(path: impl Into<String>, kind: ValidationKind) -> Self {
        Self::Validation {
            path: path.into(),
            kind,
        }
    }

    pub fn canonicalization(path: impl Into<String>, kind: CanonicalizationKind) -> Self {
        Self::Canonicalization {
            path: path.into(),
            kind,
        }
    }
}
