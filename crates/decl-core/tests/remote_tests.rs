//! Remote resolution tests.
//!
//! Covers the direct lookup, ancestor identity rewriting, collection
//! detection and the parent collection fallback against recording fakes.

use decl_core::{ErrorKind, Operation, OperationSpec, Reconciler, ResourceMetadata};
use decl_test_utils::{FakeMetadata, FakeRemote, FakeStore, listed};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

const LDAP_ID: &str = "13de4420-7c8d-4db7-b8f7-2d2a26f2053e";

fn identity(id: &str, alias: &str) -> ResourceMetadata {
    ResourceMetadata {
        id_from_attribute: id.into(),
        alias_from_attribute: alias.into(),
        ..Default::default()
    }
}

fn components_metadata(list_jq: &str) -> ResourceMetadata {
    let mut md = ResourceMetadata {
        collection_path: "/admin/realms/{{.realm}}/components".into(),
        ..identity("id", "name")
    };
    if !list_jq.is_empty() {
        md.operations.insert(
            Operation::List,
            OperationSpec {
                jq: list_jq.into(),
                ..Default::default()
            },
        );
    }
    md
}

fn ldap_listing() -> Vec<decl_core::ResourceDescriptor> {
    vec![listed(
        "/admin/realms/publico-br/ldap-1",
        "ldap-1",
        LDAP_ID,
        json!({"id": LDAP_ID, "name": "ldap-1", "providerId": "ldap"}),
    )]
}

fn organizations_openapi(with_realm_item: bool) -> Value {
    let mut paths = json!({
        "/admin/realms/{realm}/organizations": {"get": {}, "post": {}},
        "/admin/realms/{realm}/organizations/{organization}": {"get": {}, "put": {}, "delete": {}}
    });
    if with_realm_item {
        paths["/admin/realms/{realm}"] = json!({"get": {}, "put": {}, "delete": {}});
    }
    json!({ "paths": paths })
}

fn remote_only(remote: &Arc<FakeRemote>) -> Reconciler {
    Reconciler::new().with_remote(remote.clone())
}

fn with_metadata(remote: &Arc<FakeRemote>, metadata: FakeMetadata) -> Reconciler {
    remote_only(remote).with_metadata(Arc::new(metadata))
}

// ==========================================================================
// Direct lookup
// ==========================================================================

#[tokio::test]
async fn test_direct_hit_returns_payload() {
    let remote = Arc::new(FakeRemote::new().with_get("/admin/realms/acme", json!({"realm": "acme"})));

    let value = remote_only(&remote).get_remote("/admin/realms/acme/").await.unwrap();

    assert_eq!(value, json!({"realm": "acme"}));
    assert_eq!(remote.get_paths(), vec!["/admin/realms/acme"]);
    assert!(remote.list_paths().is_empty(), "No identity attributes, no ambiguity listing");
}

#[tokio::test]
async fn test_read_descriptor_is_seeded_from_identity_attributes() {
    let remote = Arc::new(FakeRemote::new().with_get("/admin/realms/platform", json!({"realm": "platform"})));
    let reconciler = with_metadata(&remote, FakeMetadata::new().with_default(identity("realm", "realm")));

    reconciler.get_remote("/admin/realms/platform").await.unwrap();

    let gets = remote.gets();
    assert_eq!(gets.len(), 1);
    assert_eq!(gets[0].remote_id, "platform");
    assert_eq!(gets[0].collection_path, "/admin/realms");
    assert_eq!(gets[0].payload["realm"], json!("platform"));
}

#[tokio::test]
async fn test_read_descriptor_carries_path_template_bindings() {
    let remote = Arc::new(FakeRemote::new().with_get("/admin/realms/acme/clients/web", json!({})));
    let md = ResourceMetadata {
        collection_path: "/admin/realms/{{.realm}}/clients".into(),
        ..identity("id", "clientId")
    };
    let reconciler = with_metadata(&remote, FakeMetadata::new().with_default(md));

    reconciler.get_remote("/admin/realms/acme/clients/web").await.unwrap();

    let payload = &remote.gets()[0].payload;
    assert_eq!(payload, &json!({"id": "web", "clientId": "web", "realm": "acme"}));
}

#[tokio::test]
async fn test_non_not_found_error_is_returned_unchanged() {
    let remote = Arc::new(FakeRemote::new().with_get_error("/admin/realms/acme", ErrorKind::Other));

    let err = remote_only(&remote).get_remote("/admin/realms/acme").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Other);
    assert!(remote.list_paths().is_empty(), "No fallback after a hard failure");
}

#[tokio::test]
async fn test_invalid_path_is_rejected_before_any_call() {
    let remote = Arc::new(FakeRemote::new());

    let err = remote_only(&remote).get_remote("/admin/../realms").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(remote.get_paths().is_empty());
}

#[tokio::test]
async fn test_direct_hit_with_ambiguous_identity_is_conflict() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_get("/customers/remote-one", json!({"id": "remote-two", "alias": "remote-two"}))
            .with_list(
                "/customers",
                vec![
                    listed("/customers/remote-one", "remote-one", "remote-one", json!({"id": "remote-one"})),
                    listed("/customers/remote-two", "remote-two", "remote-two", json!({"id": "remote-two"})),
                ],
            ),
    );
    let reconciler = remote_only(&remote)
        .with_store(Arc::new(
            FakeStore::new().with_resource("/customers/remote-one", json!({"id": "remote-two", "alias": "remote-one"})),
        ))
        .with_metadata(Arc::new(FakeMetadata::new().with_default(identity("id", "alias"))));

    // Alias "remote-one" and id "remote-two" each name a different listed item.
    let err = reconciler.diff("/customers/remote-one").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

// ==========================================================================
// Ancestor identity rewriting
// ==========================================================================

#[tokio::test]
async fn test_falls_back_to_collection_list_by_alias() {
    let client_id = "f88c68f3-3253-49f9-94a9-fe7553d33b5c";
    let remote = Arc::new(FakeRemote::new().with_list(
        "/admin/realms/master/clients",
        vec![listed(
            "/admin/realms/master/clients/account",
            "account",
            client_id,
            json!({"id": client_id, "clientId": "account"}),
        )],
    ));
    let reconciler = with_metadata(&remote, FakeMetadata::new().with_default(identity("id", "clientId")));

    let value = reconciler
        .get_remote("/admin/realms/master/clients/account")
        .await
        .unwrap();

    assert_eq!(value["clientId"], json!("account"));
    assert_eq!(remote.get_paths()[0], "/admin/realms/master/clients/account");
}

#[tokio::test]
async fn test_single_filtered_candidate_stands_in_for_selector_segment() {
    let request = "/admin/realms/publico-br/user-registry";
    let resolved = format!("/admin/realms/publico-br/{}", LDAP_ID);
    let remote = Arc::new(
        FakeRemote::new()
            .with_get(&resolved, json!({"id": LDAP_ID, "name": "ldap-1", "providerId": "ldap"}))
            .with_list("/admin/realms/publico-br", ldap_listing()),
    );
    let metadata = FakeMetadata::new().with_default(components_metadata(r#"[ .[] | select(.providerId == "ldap") ]"#));

    let value = with_metadata(&remote, metadata).get_remote(request).await.unwrap();

    assert_eq!(value["id"], json!(LDAP_ID));
    assert_eq!(remote.get_paths(), vec![request.to_string(), resolved]);
    assert!(remote.list_paths().contains(&"/admin/realms/publico-br".to_string()));
}

#[tokio::test]
async fn test_explicit_child_is_not_collapsed_to_singleton_candidate() {
    let request = "/admin/realms/publico-br/user-registry/xxx";
    let singleton_path = "/admin/realms/publico-br/user-registry/AD PRD";
    let remote = Arc::new(
        FakeRemote::new()
            .with_get(singleton_path, json!({"id": "ad-prd", "name": "AD PRD"}))
            .with_list(
                "/admin/realms/publico-br/user-registry",
                vec![listed(singleton_path, "AD PRD", "ad-prd", json!({"id": "ad-prd", "name": "AD PRD"}))],
            ),
    );
    let metadata = FakeMetadata::new().with_default(components_metadata(r#"[ .[] | select(.providerId == "ldap") ]"#));

    let err = with_metadata(&remote, metadata).get_remote(request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(
        !remote.get_paths().iter().any(|p| p == singleton_path),
        "Explicit child must not resolve to the singleton, got: {:?}",
        remote.get_paths()
    );
}

#[tokio::test]
async fn test_single_candidate_without_filter_expression_is_not_used() {
    let remote = Arc::new(FakeRemote::new().with_list("/admin/realms/publico-br", ldap_listing()));
    let metadata = FakeMetadata::new().with_default(components_metadata(""));

    let err = with_metadata(&remote, metadata)
        .get_remote("/admin/realms/publico-br/user-registry")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_alias_path_resolves_to_metadata_id() {
    let alias_path = "/admin/realms/publico-br/organizations/teste";
    let id_path = "/admin/realms/publico-br/organizations/org-1";
    let remote = Arc::new(
        FakeRemote::new()
            .with_get(id_path, json!({"id": "org-1", "alias": "teste"}))
            .with_list(
                "/admin/realms/publico-br/organizations",
                vec![listed(alias_path, "teste", "org-1", json!({"id": "org-1", "alias": "teste"}))],
            ),
    );
    let metadata = FakeMetadata::new().with_path(alias_path, identity("id", "alias"));

    let value = with_metadata(&remote, metadata).get_remote(alias_path).await.unwrap();

    assert_eq!(value["id"], json!("org-1"));
    assert_eq!(remote.get_paths(), vec![alias_path, id_path]);
    assert!(
        !remote.list_paths().iter().any(|p| p == alias_path),
        "Alias path must not be listed as a collection"
    );
}

#[tokio::test]
async fn test_parent_identity_is_resolved_recursively() {
    let alias_path = "/admin/realms/publico-br/organizations/teste";
    let realm_path = "/admin/realms/realm-1/organizations/teste";
    let resource_path = "/admin/realms/realm-1/organizations/org-1";
    let md = identity("id", "alias");
    let remote = Arc::new(
        FakeRemote::new()
            .with_get(resource_path, json!({"id": "org-1", "alias": "teste"}))
            .with_list_error("/admin/realms/publico-br/organizations", ErrorKind::NotFound)
            .with_list(
                "/admin/realms",
                vec![listed("/admin/realms/publico-br", "publico-br", "realm-1", json!({"id": "realm-1"}))],
            )
            .with_list(
                "/admin/realms/realm-1/organizations",
                vec![listed(realm_path, "teste", "org-1", json!({"id": "org-1", "alias": "teste"}))],
            ),
    );
    let metadata = [alias_path, realm_path, resource_path, "/admin/realms/publico-br", "/admin/realms/realm-1"]
        .into_iter()
        .fold(FakeMetadata::new(), |fake, path| fake.with_path(path, md.clone()));

    let value = with_metadata(&remote, metadata).get_remote(alias_path).await.unwrap();

    assert_eq!(value["id"], json!("org-1"));
    assert_eq!(remote.get_paths(), vec![alias_path, realm_path, resource_path]);
}

#[tokio::test]
async fn test_invalid_probe_response_keeps_original_not_found() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_list_error("/admin/realms/xxxxx", ErrorKind::NotFound)
            .with_list_error("/admin/realms", ErrorKind::NotFound)
            .with_list_error("/admin", ErrorKind::Validation),
    );
    let metadata = FakeMetadata::new().with_default(identity("id", "alias"));

    let err = with_metadata(&remote, metadata)
        .get_remote("/admin/realms/xxxxx/organizations")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(remote.list_paths().contains(&"/admin".to_string()));
}

#[tokio::test]
async fn test_ambiguous_ancestor_match_is_conflict() {
    let remote = Arc::new(FakeRemote::new().with_list(
        "/customers",
        vec![
            listed("/customers/acme-1", "acme", "42", json!({"id": "42"})),
            listed("/customers/acme-2", "acme", "43", json!({"id": "43"})),
        ],
    ));
    let metadata = FakeMetadata::new().with_default(identity("id", "alias"));

    let err = with_metadata(&remote, metadata).get_remote("/customers/acme").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_ancestor_rewrites_stop_at_already_visited_path() {
    let requested = "/r/a/s/x";
    let renamed_leaf = "/r/a/s/y";
    let renamed_parent = "/r/b/s/y";
    let remote = Arc::new(
        FakeRemote::new()
            .with_list(
                "/r/a/s",
                vec![listed("/r/a/s/ex", "ex", "y", json!({"id": "y", "alias": "x"}))],
            )
            .with_list("/r", vec![listed("/r/a", "a", "b", json!({"id": "b", "alias": "a"}))])
            .with_list(
                "/r/b/s",
                vec![listed("/r/b/s/y", "y", "y/", json!({"id": "y/", "alias": "y"}))],
            ),
    );
    let metadata = FakeMetadata::new().with_default(identity("id", "alias"));

    let err = with_metadata(&remote, metadata).get_remote(requested).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(remote.get_paths(), vec![requested, renamed_leaf, renamed_parent]);
}

#[tokio::test]
async fn test_unusable_remote_id_does_not_abort_lookup() {
    let payload = json!({"id": "_", "alias": "acme"});
    let remote = Arc::new(FakeRemote::new().with_list(
        "/customers",
        vec![listed("/customers/acme", "acme", "_", payload.clone())],
    ));
    let metadata = FakeMetadata::new().with_default(identity("id", "alias"));

    let value = with_metadata(&remote, metadata).get_remote("/customers/acme").await.unwrap();

    assert_eq!(value, payload);
    assert_eq!(remote.get_paths(), vec!["/customers/acme"]);
}

#[tokio::test]
async fn test_ancestor_metadata_failure_skips_segment() {
    let remote = Arc::new(FakeRemote::new());
    let metadata = FakeMetadata::new()
        .with_default(identity("id", "alias"))
        .with_path_error("/customers", ErrorKind::Validation);

    let err = with_metadata(&remote, metadata)
        .get_remote("/customers/acme")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(remote.list_paths(), vec!["/customers", "/customers"]);
}

// ==========================================================================
// Collection detection
// ==========================================================================

#[tokio::test]
async fn test_openapi_hint_turns_collection_not_found_into_empty_list() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_get("/admin/realms/master", json!({"realm": "master"}))
            .with_default_list_error(ErrorKind::NotFound)
            .with_openapi(organizations_openapi(false)),
    );

    let value = remote_only(&remote)
        .get_remote("/admin/realms/master/organizations")
        .await
        .unwrap();

    assert_eq!(value, json!([]));
    assert_eq!(remote.list_paths(), vec!["/admin/realms/master/organizations"]);
}

#[tokio::test]
async fn test_store_hint_turns_collection_not_found_into_empty_list() {
    let path = "/admin/realms/master/organizations";
    let store = Arc::new(FakeStore::new().with_exists(path, true));
    let remote = Arc::new(
        FakeRemote::new()
            .with_get("/admin/realms/master", json!({"realm": "master"}))
            .with_default_list_error(ErrorKind::NotFound),
    );

    let value = remote_only(&remote)
        .with_store(store.clone())
        .get_remote(path)
        .await
        .unwrap();

    assert_eq!(value, json!([]));
    assert_eq!(store.exists_calls(), vec![path]);
    assert_eq!(remote.list_paths(), vec![path]);
}

#[tokio::test]
async fn test_collection_listing_is_sorted_payload_array() {
    let path = "/admin/realms/master/organizations";
    let remote = Arc::new(
        FakeRemote::new()
            .with_openapi(organizations_openapi(false))
            .with_list(
                path,
                vec![
                    listed(&format!("{path}/zeta"), "zeta", "2", json!({"name": "zeta"})),
                    listed(&format!("{path}/acme"), "acme", "1", json!({"name": "acme"})),
                ],
            ),
    );

    let value = remote_only(&remote).get_remote(path).await.unwrap();

    assert_eq!(value, json!([{"name": "acme"}, {"name": "zeta"}]));
}

#[tokio::test]
async fn test_without_hints_not_found_is_kept() {
    let remote = Arc::new(FakeRemote::new().with_default_list_error(ErrorKind::NotFound));
    let mut md = ResourceMetadata::default();
    md.operations.insert(
        Operation::List,
        OperationSpec {
            method: "GET".into(),
            path: "/admin/realms/{{.realm}}/organizations".into(),
            ..Default::default()
        },
    );

    let err = with_metadata(&remote, FakeMetadata::new().with_default(md))
        .get_remote("/admin/realms/master/organizations")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(remote.list_paths(), vec!["/admin/realms/master"]);
}

#[tokio::test]
async fn test_concrete_resource_path_is_not_treated_as_collection() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_default_list_error(ErrorKind::NotFound)
            .with_openapi(organizations_openapi(true)),
    );

    let err = remote_only(&remote).get_remote("/admin/realms/acme").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(remote.list_paths(), vec!["/admin/realms"]);
}

#[tokio::test]
async fn test_collection_of_missing_parent_stays_not_found() {
    let path = "/admin/realms/acme/organizations";
    let remote = Arc::new(
        FakeRemote::new()
            .with_default_list_error(ErrorKind::NotFound)
            .with_openapi(organizations_openapi(true)),
    );

    let err = remote_only(&remote).get_remote(path).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(remote.list_paths(), vec![path]);
    assert_eq!(remote.get_paths(), vec![path, "/admin/realms/acme"]);
}

#[tokio::test]
async fn test_invalid_parent_list_payload_keeps_not_found() {
    let remote = Arc::new(FakeRemote::new().with_default_list_error(ErrorKind::PayloadShape));

    let err = remote_only(&remote)
        .get_remote("/admin/realms/publico/organizatio")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(remote.list_paths(), vec!["/admin/realms/publico"]);
}

#[tokio::test]
async fn test_parent_list_conflict_is_propagated() {
    let remote = Arc::new(FakeRemote::new().with_default_list_error(ErrorKind::Conflict));

    let err = remote_only(&remote).get_remote("/customers/acme").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

// ==========================================================================
// List filter resource lookups
// ==========================================================================

#[tokio::test]
async fn test_list_filter_lookup_resolves_through_remote_reader() {
    let tenant = json!({"id": "t1", "region": "eu"});
    let remote = Arc::new(
        FakeRemote::new()
            .with_get("/tenants/t1", tenant.clone())
            .with_list_lookup("/tenants/t1/users", "/tenants/t1/")
            .with_list(
                "/tenants/t1/users",
                vec![listed("/tenants/t1/users/bob", "bob", "u-1", json!({"id": "u-1"}))],
            ),
    );

    let value = remote_only(&remote).get_remote("/tenants/t1/users/bob").await.unwrap();

    assert_eq!(value, json!({"id": "u-1"}));
    assert_eq!(remote.lookups(), vec![("/tenants/t1".to_string(), Ok(tenant))]);
    assert_eq!(remote.get_paths(), vec!["/tenants/t1/users/bob", "/tenants/t1"]);
}

#[tokio::test]
async fn test_failed_list_filter_lookup_keeps_not_found() {
    let remote = Arc::new(FakeRemote::new().with_list_lookup("/tenants/t1/users", "/tenants/t1"));

    let err = remote_only(&remote)
        .get_remote("/tenants/t1/users/bob")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        remote.lookups(),
        vec![("/tenants/t1".to_string(), Err(ErrorKind::NotFound))]
    );
}

#[tokio::test]
async fn test_cyclic_list_filter_lookup_terminates() {
    let remote = Arc::new(FakeRemote::new().with_list_lookup("/loop", "/loop/a"));

    let err = remote_only(&remote).get_remote("/loop/a").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        remote.lookups(),
        vec![
            ("/loop/a".to_string(), Err(ErrorKind::Validation)),
            ("/loop/a".to_string(), Err(ErrorKind::NotFound)),
        ]
    );
    assert_eq!(remote.get_paths(), vec!["/loop/a", "/loop/a"]);
}
