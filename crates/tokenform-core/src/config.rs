//! Configuration types for the TokenForm facade.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TokenFormError;

/// Top-level configuration for [`crate::TokenForm`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenFormConfig {
    pub store: StoreConfig,
    pub canonicalize: CanonicalizeConfig,
    pub global: GlobalConfig,
}

impl Default for TokenFormConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            canonicalize: CanonicalizeConfig::default(),
            global: GlobalConfig::default(),
        }
    }
}

impl TokenFormConfig {
    /// Parses a configuration document in TOML form.
    pub fn from_toml_str(s: &str) -> Result<Self, TokenFormError> {
        toml::from_str(s).map_err(|e| TokenFormError::Config(e.to_string()))
    }
}

/// [`tokenform_store::TokenMemory`] settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory for the content-addressed IR store and materialization
    /// cache (`spec.md` §6.2).
    pub root: PathBuf,

    /// Default per-call token-budget ceiling passed to
    /// `materialize_and_cache` when the caller doesn't override it.
    pub default_max_tokens: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./tokenform_store"),
            default_max_tokens: None,
        }
    }
}

/// [`tokenform_ir::canonicalize`] settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CanonicalizeConfig {
    /// Whether sparse rows sharing a schema family unify into one schema
    /// with null-filled absent fields (`spec.md` §4.2).
    pub unify_schemas: bool,
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self { unify_schemas: true }
    }
}

/// Settings that don't belong to a single subsystem.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// When `true`, `resolve_encoding` rejects unrecognized model IDs with
    /// `ModelNotFound` instead of defaulting to `o200k_base`.
    pub strict_model_resolution: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            strict_model_resolution: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_store_root() {
        let config = TokenFormConfig::default();
        assert_eq!(config.store.root, PathBuf::from("./tokenform_store"));
        assert!(config.canonicalize.unify_schemas);
        assert!(!config.global.strict_model_resolution);
    }

    #[test]
    fn from_toml_str_round_trips_overrides() {
        let toml = r#"
            [store]
            root = "/tmp/tf"
            default_max_tokens = 4096

            [canonicalize]
            unify_schemas = false

            [global]
            strict_model_resolution = true
        "#;
        let config = TokenFormConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.store.root, PathBuf::from("/tmp/tf"));
        assert_eq!(config.store.default_max_tokens, Some(4096));
        assert!(!config.canonicalize.unify_schemas);
        assert!(config.global.strict_model_resolution);
    }
}
