//! Full sync workflows across every crate in the workspace
//!
//! save -> apply -> diff -> delete against a filesystem repository, a
//! metadata file on disk and recording remote and secret fakes.

use decl_core::{ListPolicy, Operation, Reconciler, ReconcilerConfig, logging};
use decl_fs::{DocumentFormat, NormalizedPath};
use decl_test_utils::{FakeRemote, FakeSecrets, TestRepository};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::sync::Arc;

const METADATA: &str = r#"
resources:
  /customers:
    idFromAttribute: id
    aliasFromAttribute: alias
    collectionPath: /api/customers
    operations:
      compare:
        suppress:
          - /updatedAt
"#;

fn configured(repo: &TestRepository, format: DocumentFormat) -> Reconciler {
    let metadata_file = repo.root().join("metadata.yaml");
    fs::write(&metadata_file, METADATA).unwrap();
    let mut config = ReconcilerConfig::new(repo.root());
    config.resource_format = format;
    config.metadata_file = Some(metadata_file);

    let config_path = NormalizedPath::new(repo.root().join("reconciler.toml"));
    config.save(&config_path).unwrap();
    Reconciler::from_config(&ReconcilerConfig::load(&config_path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_save_apply_diff_cycle() {
    let repo = TestRepository::with_format(DocumentFormat::Yaml);
    let remote_state = json!({
        "id": "42",
        "alias": "acme",
        "apiToken": "super-secret",
        "updatedAt": "2026-02-11T10:00:00Z"
    });
    let remote = Arc::new(
        FakeRemote::new()
            .with_exists(false)
            .with_create_response(remote_state.clone())
            .with_get("/customers/acme", remote_state),
    );
    let secrets = Arc::new(FakeSecrets::new().with_secret("apiToken", "super-secret"));
    let reconciler = configured(&repo, DocumentFormat::Yaml)
        .with_remote(remote.clone())
        .with_secrets(secrets);

    reconciler
        .save(
            "/customers/acme",
            json!({
                "id": "42",
                "alias": "acme",
                "apiToken": "super-secret",
                "updatedAt": "2026-02-10T10:00:00Z"
            }),
        )
        .await
        .unwrap();

    let stored = fs::read_to_string(repo.dir_for("/customers/acme").join("resource.yaml")).unwrap();
    assert!(!stored.contains("super-secret"), "Secret leaked to disk: {}", stored);

    let created = reconciler.apply("/customers/acme").await.unwrap();
    assert_eq!(created.remote_id, "42");
    assert_eq!(remote.created()[0].payload["apiToken"], json!("super-secret"));

    let drift = reconciler.diff("/customers/acme").await.unwrap();
    assert!(drift.is_empty(), "Expected no drift, got: {:?}", drift);
}

#[tokio::test]
async fn test_rendered_operations_follow_metadata_file() {
    let repo = TestRepository::new();
    let reconciler = configured(&repo, DocumentFormat::Json);
    let payload = json!({"id": "42", "alias": "acme"});

    let get = reconciler
        .render_operation("/customers/acme", payload.clone(), Operation::Get)
        .await
        .unwrap();
    let create = reconciler
        .render_operation("/customers/acme", payload, Operation::Create)
        .await
        .unwrap();

    assert_eq!(get.path, "/api/customers/42");
    assert_eq!(create.path, "/api/customers");
}

#[tokio::test]
async fn test_list_local_reads_every_resource() {
    let repo = TestRepository::new();
    repo.write_resource("/customers/acme", &json!({"id": "1", "alias": "acme"}));
    repo.write_resource("/customers/zeta", &json!({"id": "2", "alias": "zeta"}));
    repo.write_resource("/customers/zeta/users/u1", &json!({"id": "u1"}));
    let reconciler = configured(&repo, DocumentFormat::Json);

    let direct = reconciler.list_local("/customers", ListPolicy::default()).await.unwrap();
    let all = reconciler.list_local("/customers", ListPolicy::recursive()).await.unwrap();

    let payload_ids: Vec<_> = direct.iter().map(|item| item.payload["id"].clone()).collect();
    assert_eq!(payload_ids, vec![json!("1"), json!("2")]);
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_delete_reaches_remote_by_alias_path() {
    let repo = TestRepository::new();
    let remote = Arc::new(FakeRemote::new());
    let reconciler = configured(&repo, DocumentFormat::Json).with_remote(remote.clone());

    reconciler.delete("/customers/acme").await.unwrap();

    let deleted = remote.deleted();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].logical_path, "/customers/acme");
    assert_eq!(deleted[0].metadata.collection_path, "/api/customers");
}

#[test]
fn test_logging_initializes_once() {
    assert!(logging::init().is_ok());
    assert!(logging::init().is_err(), "Second init must fail, not panic");
}
