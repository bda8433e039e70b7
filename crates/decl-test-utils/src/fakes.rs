//! Recording fakes for every reconciler collaborator.
//!
//! Each fake is configured with consuming builder methods, shared with the
//! reconciler through an `Arc`, and inspected afterwards through its
//! recorded calls.

use async_trait::async_trait;
use decl_core::traits::{
    ListPolicy, LocalStore, MetadataService, RemoteService, ResourceResolver, SecretProvider,
};
use decl_core::{Error, ErrorKind, Result};
use decl_meta::{ResourceDescriptor, ResourceMetadata};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

fn not_found(what: &str, path: &str) -> Error {
    Error::not_found(format!("{what} {path:?} not found"))
}

// ---------------------------------------------------------------------------
// Local store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    values: HashMap<String, Value>,
    exists: HashMap<String, bool>,
    listings: HashMap<String, Vec<ResourceDescriptor>>,
    get_calls: Vec<String>,
    list_calls: Vec<(String, ListPolicy)>,
    exists_calls: Vec<String>,
    saved: Vec<(String, Value)>,
    deleted: Vec<String>,
}

/// In-memory [`LocalStore`].
#[derive(Debug, Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(self, logical_path: &str, value: Value) -> Self {
        self.state.lock().unwrap().values.insert(logical_path.to_string(), value);
        self
    }

    /// Items returned when `collection_path` is listed. Unlisted
    /// collections are empty.
    pub fn with_listing(self, collection_path: &str, items: Vec<ResourceDescriptor>) -> Self {
        self.state
            .lock()
            .unwrap()
            .listings
            .insert(collection_path.to_string(), items);
        self
    }

    /// Override `exists` for a path. Otherwise a path exists when it holds
    /// a resource.
    pub fn with_exists(self, logical_path: &str, exists: bool) -> Self {
        self.state
            .lock()
            .unwrap()
            .exists
            .insert(logical_path.to_string(), exists);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().get_calls.clone()
    }

    pub fn list_calls(&self) -> Vec<(String, ListPolicy)> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn exists_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().exists_calls.clone()
    }

    pub fn saved(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().saved.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }
}

#[async_trait]
impl LocalStore for FakeStore {
    async fn get(&self, logical_path: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.get_calls.push(logical_path.to_string());
        state
            .values
            .get(logical_path)
            .cloned()
            .ok_or_else(|| not_found("local resource", logical_path))
    }

    async fn list(
        &self,
        collection_path: &str,
        policy: ListPolicy,
    ) -> Result<Vec<ResourceDescriptor>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push((collection_path.to_string(), policy));
        Ok(state.listings.get(collection_path).cloned().unwrap_or_default())
    }

    async fn exists(&self, logical_path: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.exists_calls.push(logical_path.to_string());
        Ok(state
            .exists
            .get(logical_path)
            .copied()
            .unwrap_or_else(|| state.values.contains_key(logical_path)))
    }

    async fn save(&self, logical_path: &str, value: &Value) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.saved.push((logical_path.to_string(), value.clone()));
        state.values.insert(logical_path.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, logical_path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deleted.push(logical_path.to_string());
        state.values.remove(logical_path);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Remote service
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RemoteState {
    get_values: HashMap<String, Value>,
    get_errors: HashMap<String, ErrorKind>,
    list_values: HashMap<String, Vec<ResourceDescriptor>>,
    list_errors: HashMap<String, ErrorKind>,
    default_list_error: Option<ErrorKind>,
    create_value: Value,
    update_value: Value,
    exists_value: bool,
    delete_errors: VecDeque<ErrorKind>,
    openapi: Option<Value>,
    list_lookups: HashMap<String, String>,

    gets: Vec<ResourceDescriptor>,
    lookups: Vec<(String, std::result::Result<Value, ErrorKind>)>,
    list_paths: Vec<String>,
    created: Vec<ResourceDescriptor>,
    updated: Vec<ResourceDescriptor>,
    deleted: Vec<ResourceDescriptor>,
}

/// In-memory [`RemoteService`] keyed by logical path.
///
/// Unknown resources are `NotFound`; unknown collections list empty unless
/// a default list error is set.
#[derive(Debug, Default)]
pub struct FakeRemote {
    state: Mutex<RemoteState>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(self, logical_path: &str, value: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .get_values
            .insert(logical_path.to_string(), value);
        self
    }

    pub fn with_get_error(self, logical_path: &str, kind: ErrorKind) -> Self {
        self.state
            .lock()
            .unwrap()
            .get_errors
            .insert(logical_path.to_string(), kind);
        self
    }

    pub fn with_list(self, collection_path: &str, items: Vec<ResourceDescriptor>) -> Self {
        self.state
            .lock()
            .unwrap()
            .list_values
            .insert(collection_path.to_string(), items);
        self
    }

    pub fn with_list_error(self, collection_path: &str, kind: ErrorKind) -> Self {
        self.state
            .lock()
            .unwrap()
            .list_errors
            .insert(collection_path.to_string(), kind);
        self
    }

    /// Error for every collection without an explicit listing.
    pub fn with_default_list_error(self, kind: ErrorKind) -> Self {
        self.state.lock().unwrap().default_list_error = Some(kind);
        self
    }

    pub fn with_create_response(self, value: Value) -> Self {
        self.state.lock().unwrap().create_value = value;
        self
    }

    pub fn with_update_response(self, value: Value) -> Self {
        self.state.lock().unwrap().update_value = value;
        self
    }

    pub fn with_exists(self, exists: bool) -> Self {
        self.state.lock().unwrap().exists_value = exists;
        self
    }

    /// Errors returned by successive delete calls before they start
    /// succeeding.
    pub fn with_delete_errors(self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.state.lock().unwrap().delete_errors.extend(kinds);
        self
    }

    /// Listing `collection_path` first looks up `logical_path` through the
    /// resolver, the way a `resource("...")` filter expression does. A
    /// failed lookup fails the listing.
    pub fn with_list_lookup(self, collection_path: &str, logical_path: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .list_lookups
            .insert(collection_path.to_string(), logical_path.to_string());
        self
    }

    pub fn with_openapi(self, document: Value) -> Self {
        self.state.lock().unwrap().openapi = Some(document);
        self
    }

    /// Logical paths of every get, in call order.
    pub fn get_paths(&self) -> Vec<String> {
        self.gets().into_iter().map(|r| r.logical_path).collect()
    }

    pub fn gets(&self) -> Vec<ResourceDescriptor> {
        self.state.lock().unwrap().gets.clone()
    }

    /// Resolver lookups made by listings, with their outcomes.
    pub fn lookups(&self) -> Vec<(String, std::result::Result<Value, ErrorKind>)> {
        self.state.lock().unwrap().lookups.clone()
    }

    pub fn list_paths(&self) -> Vec<String> {
        self.state.lock().unwrap().list_paths.clone()
    }

    pub fn created(&self) -> Vec<ResourceDescriptor> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn updated(&self) -> Vec<ResourceDescriptor> {
        self.state.lock().unwrap().updated.clone()
    }

    pub fn deleted(&self) -> Vec<ResourceDescriptor> {
        self.state.lock().unwrap().deleted.clone()
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn get(&self, resource: &ResourceDescriptor) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        let path = resource.logical_path.clone();
        state.gets.push(resource.clone());
        if let Some(value) = state.get_values.get(&path) {
            return Ok(value.clone());
        }
        match state.get_errors.get(&path) {
            Some(kind) => Err(Error::of_kind(*kind, format!("remote get {path:?} failed"))),
            None => Err(not_found("remote resource", &path)),
        }
    }

    async fn create(&self, resource: &ResourceDescriptor) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.created.push(resource.clone());
        Ok(state.create_value.clone())
    }

    async fn update(&self, resource: &ResourceDescriptor) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.updated.push(resource.clone());
        Ok(state.update_value.clone())
    }

    async fn delete(&self, resource: &ResourceDescriptor) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deleted.push(resource.clone());
        match state.delete_errors.pop_front() {
            Some(kind) => Err(Error::of_kind(
                kind,
                format!("remote delete {:?} failed", resource.logical_path),
            )),
            None => Ok(()),
        }
    }

    async fn list(
        &self,
        collection_path: &str,
        _metadata: &ResourceMetadata,
        resolver: &dyn ResourceResolver,
    ) -> Result<Vec<ResourceDescriptor>> {
        let lookup = {
            let mut state = self.state.lock().unwrap();
            state.list_paths.push(collection_path.to_string());
            state.list_lookups.get(collection_path).cloned()
        };
        if let Some(logical_path) = lookup {
            let resolved = resolver.resolve_resource(&logical_path).await;
            self.state
                .lock()
                .unwrap()
                .lookups
                .push((logical_path, resolved.as_ref().map(Value::clone).map_err(Error::kind)));
            resolved?;
        }

        let state = self.state.lock().unwrap();
        let failure = |kind: ErrorKind| {
            Error::of_kind(kind, format!("remote list {collection_path:?} failed"))
        };
        if let Some(kind) = state.list_errors.get(collection_path) {
            return Err(failure(*kind));
        }
        if let Some(items) = state.list_values.get(collection_path) {
            return Ok(items.clone());
        }
        match state.default_list_error {
            Some(kind) => Err(failure(kind)),
            None => Ok(Vec::new()),
        }
    }

    async fn exists(&self, _resource: &ResourceDescriptor) -> Result<bool> {
        Ok(self.state.lock().unwrap().exists_value)
    }

    async fn openapi_spec(&self) -> Result<Option<Value>> {
        Ok(self.state.lock().unwrap().openapi.clone())
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MetadataState {
    values: HashMap<String, ResourceMetadata>,
    default: ResourceMetadata,
    error: Option<ErrorKind>,
    path_errors: HashMap<String, ErrorKind>,
    resolve_calls: Vec<String>,
}

/// [`MetadataService`] answering from a per-path table with a default.
#[derive(Debug, Default)]
pub struct FakeMetadata {
    state: Mutex<MetadataState>,
}

impl FakeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata returned for every path without an explicit entry.
    pub fn with_default(self, metadata: ResourceMetadata) -> Self {
        self.state.lock().unwrap().default = metadata;
        self
    }

    pub fn with_path(self, logical_path: &str, metadata: ResourceMetadata) -> Self {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(logical_path.to_string(), metadata);
        self
    }

    /// Fail every resolution with the given kind.
    pub fn with_error(self, kind: ErrorKind) -> Self {
        self.state.lock().unwrap().error = Some(kind);
        self
    }

    /// Fail resolution for one path only.
    pub fn with_path_error(self, logical_path: &str, kind: ErrorKind) -> Self {
        self.state
            .lock()
            .unwrap()
            .path_errors
            .insert(logical_path.to_string(), kind);
        self
    }

    pub fn resolve_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().resolve_calls.clone()
    }
}

#[async_trait]
impl MetadataService for FakeMetadata {
    async fn resolve_for_path(&self, logical_path: &str) -> Result<ResourceMetadata> {
        let mut state = self.state.lock().unwrap();
        state.resolve_calls.push(logical_path.to_string());
        if let Some(kind) = state.error.or_else(|| state.path_errors.get(logical_path).copied()) {
            return Err(Error::of_kind(kind, format!("metadata for {logical_path:?}")));
        }
        Ok(state
            .values
            .get(logical_path)
            .cloned()
            .unwrap_or_else(|| state.default.clone()))
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SecretsState {
    secrets: HashMap<String, String>,
    resolved_paths: Vec<String>,
    mask_calls: usize,
}

/// [`SecretProvider`] swapping `{{secret "<key>"}}` placeholders for
/// stored values and back.
#[derive(Debug, Default)]
pub struct FakeSecrets {
    state: Mutex<SecretsState>,
}

impl FakeSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, key: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .secrets
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn placeholder(key: &str) -> String {
        format!("{{{{secret \"{key}\"}}}}")
    }

    pub fn resolved_paths(&self) -> Vec<String> {
        self.state.lock().unwrap().resolved_paths.clone()
    }

    pub fn mask_calls(&self) -> usize {
        self.state.lock().unwrap().mask_calls
    }
}

fn map_strings(value: Value, f: &dyn Fn(&str) -> Option<String>) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s).unwrap_or(s)),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| map_strings(v, f)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, map_strings(v, f)))
                .collect(),
        ),
        other => other,
    }
}

#[async_trait]
impl SecretProvider for FakeSecrets {
    async fn resolve_payload(&self, logical_path: &str, value: Value) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.resolved_paths.push(logical_path.to_string());
        let secrets = state.secrets.clone();
        Ok(map_strings(value, &|s| {
            secrets
                .iter()
                .find(|(key, _)| Self::placeholder(key) == s)
                .map(|(_, secret)| secret.clone())
        }))
    }

    async fn mask_payload(&self, value: Value) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.mask_calls += 1;
        let secrets = state.secrets.clone();
        Ok(map_strings(value, &|s| {
            secrets
                .iter()
                .find(|(_, secret)| secret.as_str() == s)
                .map(|(key, _)| Self::placeholder(key))
        }))
    }
}
