//! End-to-end resolution scenarios
//!
//! Each scenario wires a real filesystem store and a selector metadata
//! registry to a recording remote fake, then drives the public reconciler
//! operations.

use decl_content::{DiffEntry, DiffOperation};
use decl_core::{ErrorKind, Reconciler, ResourceMetadata};
use decl_meta::MetadataRegistry;
use decl_test_utils::{FakeRemote, TestRepository, listed};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

fn identity(id: &str, alias: &str) -> ResourceMetadata {
    ResourceMetadata {
        id_from_attribute: id.into(),
        alias_from_attribute: alias.into(),
        ..Default::default()
    }
}

fn registry(entries: &[(&str, ResourceMetadata)]) -> Arc<MetadataRegistry> {
    let mut registry = MetadataRegistry::new();
    for (selector, metadata) in entries {
        registry.insert(selector, metadata.clone()).unwrap();
    }
    Arc::new(registry)
}

/// Local fallback by remote id: the store only knows the client by alias.
#[tokio::test]
async fn test_scenario_a_local_fallback_matches_by_id() {
    let client_id = "f88c68f3-3253-49f9-94a9-fe7553d33b5c";
    let repo = TestRepository::new();
    repo.write_resource(
        "/admin/realms/master/clients/account",
        &json!({"id": client_id, "clientId": "account"}),
    );
    let reconciler = Reconciler::new()
        .with_store(Arc::new(repo.store()))
        .with_metadata(registry(&[("/admin/realms/_/clients", identity("id", "clientId"))]));

    let value = reconciler
        .get_local(&format!("/admin/realms/master/clients/{client_id}"))
        .await
        .unwrap();

    assert_eq!(value, json!({"id": client_id, "clientId": "account"}));
}

/// Ancestor identities are rewritten one level at a time until the direct
/// lookup succeeds.
#[tokio::test]
async fn test_scenario_b_remote_rewrites_ancestor_identities() {
    let alias_path = "/admin/realms/publico-br/organizations/teste";
    let realm_path = "/admin/realms/realm-1/organizations/teste";
    let resource_path = "/admin/realms/realm-1/organizations/org-1";
    let remote = Arc::new(
        FakeRemote::new()
            .with_get(resource_path, json!({"id": "org-1", "alias": "teste"}))
            .with_list_error("/admin/realms/publico-br/organizations", ErrorKind::NotFound)
            .with_list(
                "/admin/realms",
                vec![listed(
                    "/admin/realms/publico-br",
                    "publico-br",
                    "realm-1",
                    json!({"id": "realm-1", "alias": "publico-br"}),
                )],
            )
            .with_list(
                "/admin/realms/realm-1/organizations",
                vec![listed(realm_path, "teste", "org-1", json!({"id": "org-1", "alias": "teste"}))],
            ),
    );
    let reconciler = Reconciler::new()
        .with_remote(remote.clone())
        .with_metadata(registry(&[("/admin/realms/_", identity("id", "alias"))]));

    let value = reconciler.get_remote(alias_path).await.unwrap();

    assert_eq!(value, json!({"id": "org-1", "alias": "teste"}));
    assert_eq!(remote.get_paths(), vec![alias_path, realm_path, resource_path]);
}

/// A resource missing remotely shows up as one whole-value replace.
#[tokio::test]
async fn test_scenario_c_missing_remote_is_whole_value_drift() {
    let repo = TestRepository::new();
    repo.write_resource("/customers/acme", &json!({"id": "42"}));
    let reconciler = Reconciler::new()
        .with_store(Arc::new(repo.store()))
        .with_remote(Arc::new(FakeRemote::new()));

    let entries = reconciler.diff("/customers/acme").await.unwrap();

    assert_eq!(
        entries,
        vec![DiffEntry {
            resource_path: "/customers/acme".into(),
            pointer: String::new(),
            operation: DiffOperation::Replace,
            local: json!({"id": "42"}),
            remote: Value::Null,
        }]
    );
}

/// Two remote entries claiming the same alias are reported, never merged.
#[tokio::test]
async fn test_scenario_d_duplicate_alias_is_conflict_for_diff_and_get() {
    let repo = TestRepository::new();
    repo.write_resource("/customers/acme", &json!({"id": "42", "alias": "acme"}));
    let remote = Arc::new(FakeRemote::new().with_list(
        "/customers",
        vec![
            listed("/customers/acme-1", "acme", "42", json!({"id": "42"})),
            listed("/customers/acme-2", "acme", "43", json!({"id": "43"})),
        ],
    ));
    let metadata = registry(&[("/customers", identity("id", "alias"))]);
    let with_local = Reconciler::new()
        .with_store(Arc::new(repo.store()))
        .with_remote(remote.clone())
        .with_metadata(metadata.clone());
    let remote_only = Reconciler::new()
        .with_store(Arc::new(TestRepository::new().store()))
        .with_remote(remote)
        .with_metadata(metadata);

    let diff_err = with_local.diff("/customers/acme").await.unwrap_err();
    let get_err = remote_only.get("/customers/acme").await.unwrap_err();

    assert_eq!(diff_err.kind(), ErrorKind::Conflict);
    assert_eq!(get_err.kind(), ErrorKind::Conflict);
}
