//! Unit tests for tokenform-core.

use crate::{TokenForm, TokenFormConfig};

#[test]
fn test_crate_structure() {
    // Smoke test - verifies the module structure compiles.
    use crate::{EncodingTag, TokenFormError};

    let _config = TokenFormConfig::default();
    let _encoding = EncodingTag::Cl100kBase;
    let _err = TokenFormError::Config("unreachable".to_string());
}

#[test]
fn encode_and_store_round_trips_through_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = TokenFormConfig::default();
    config.store.root = dir.path().to_path_buf();
    let tokenform = TokenForm::new(config).unwrap();

    let records = vec![
        serde_json::json!({"id": 1, "name": "Alice"}),
        serde_json::json!({"name": "Bob", "id": 2}),
    ];

    let result = tokenform.encode_and_store(&records).unwrap();
    assert!(result.is_new);

    let decoded = tokenform.load(&result.hash).unwrap();
    assert_eq!(decoded.records.len(), 2);
}

#[test]
fn materialize_produces_nonempty_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = TokenFormConfig::default();
    config.store.root = dir.path().to_path_buf();
    let tokenform = TokenForm::new(config).unwrap();

    let records = vec![serde_json::json!({"id": 1, "status": "open"})];
    let stored = tokenform.encode_and_store(&records).unwrap();

    let materialized = tokenform.materialize(&stored.hash, "gpt-4o-mini").unwrap();
    assert!(!materialized.tokens.is_empty());
    assert!(!materialized.cache_hit);

    let cached = tokenform.materialize(&stored.hash, "gpt-4o-mini").unwrap();
    assert!(cached.cache_hit);
}
