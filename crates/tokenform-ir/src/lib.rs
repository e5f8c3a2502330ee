//! # TokenForm IR — record validation and canonicalization
//!
//! This crate owns the logical half of the TokenForm pipeline: turning
//! heterogeneous JSON-shaped records into the canonical, schema-tagged form
//! that the binary encoder (`tokenform-codec`) turns into bytes.
//!
//! ## Pipeline position
//!
//! ```text
//! serde_json::Value records ─► validate() ─► canonicalize() ─► (schemas, rows)
//! ```
//!
//! Nothing in this crate touches bytes, hashes, or storage; those are the
//! concern of `tokenform-codec` and `tokenform-store` respectively. Keeping
//! the boundary here means `canonicalize()` can be fuzzed and reasoned about
//! without ever constructing a binary reader.
//!
//! ## Why no cycle detection
//!
//! The source specification this crate reimplements asks the validator to
//! detect cyclic references. `serde_json::Value` is an owned tree — there is
//! no way to construct a cycle in safe Rust, so that check is structurally
//! unreachable here and is not implemented (see `DESIGN.md`).

pub mod canonicalize;
pub mod error;
pub mod schema;
pub mod strings;
pub mod validate;
pub mod value;

pub use canonicalize::{canonicalize, CanonicalizeOptions};
pub use error::{CanonicalizationKind, IrError, ValidationKind};
pub use schema::{Schema, TypeTag};
pub use strings::StringTable;
pub use validate::validate;
pub use value::{Record, Value};

/// Maximum nesting depth accepted by the validator (`spec.md` §3).
pub const MAX_DEPTH: usize = 50;

/// Version of the canonicalization rules implemented by this crate. Bumped
/// whenever flattening, schema-unification, or number-formatting behavior
/// changes in a way that would move the canonical form (`spec.md` §3 IR
/// Object `version`).
pub const CANONICALIZATION_VERSION: u8 = 1;

/// Field names that would alias prototype-chain internals in the source
/// runtime this format was designed for. Rejected regardless of target
/// language so that IR produced here round-trips through that runtime too.
pub const RESERVED_FIELD_NAMES: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Result type shared by validation and canonicalization.
pub type Result<T> = std::result::Result<T, IrError>;
