use adex_core::Environment;

use crate::error::StateError;
use crate::key::{KeyKind, StateKey};
use crate::store::StateStore;

fn test_key(kind: KeyKind, id: &str) -> StateKey {
    StateKey::new("test-ns", kind, id)
}

/// Run the full state store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn StateStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_set_and_get(store).await?;
    test_overwrite(store).await?;
    test_delete(store).await?;
    test_kind_isolation(store).await?;
    test_namespace_isolation(store).await?;
    test_large_value(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Rules, "missing");
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_set_and_get(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Rules, "set-get");
    store.set(&key, r#"{"rules":[],"script":""}"#).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some(r#"{"rules":[],"script":""}"#));
    Ok(())
}

async fn test_overwrite(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::AuditLog, "overwrite");
    store.set(&key, "v1").await?;
    store.set(&key, "v2").await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v2"), "set should overwrite");
    Ok(())
}

async fn test_delete(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Snapshot, "to-delete");
    store.set(&key, "bye").await?;
    let existed = store.delete(&key).await?;
    assert!(existed, "delete should return true for existing key");
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get after delete should return None");

    let existed = store.delete(&key).await?;
    assert!(!existed, "delete on missing key should return false");
    Ok(())
}

async fn test_kind_isolation(store: &dyn StateStore) -> Result<(), StateError> {
    let rules = test_key(KeyKind::Rules, "shared-id");
    let audit = test_key(KeyKind::AuditLog, "shared-id");
    store.set(&rules, "rules").await?;
    store.set(&audit, "audit").await?;
    assert_eq!(store.get(&rules).await?.as_deref(), Some("rules"));
    assert_eq!(store.get(&audit).await?.as_deref(), Some("audit"));
    Ok(())
}

async fn test_namespace_isolation(store: &dyn StateStore) -> Result<(), StateError> {
    let a = StateKey::rules("ns-a", Environment::Prod);
    let b = StateKey::rules("ns-b", Environment::Prod);
    let dev = StateKey::rules("ns-a", Environment::Dev);
    store.set(&a, "a").await?;
    assert!(store.get(&b).await?.is_none(), "namespaces must not share keys");
    assert!(store.get(&dev).await?.is_none(), "environments must not share keys");
    Ok(())
}

async fn test_large_value(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Snapshot, "large");
    let value = "x".repeat(256 * 1024);
    store.set(&key, &value).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.map(|v| v.len()), Some(value.len()));
    Ok(())
}
