//! Reconciliation operations

use crate::identity::resolve_resource_identity;
use crate::traits::ListPolicy;
use crate::{Error, Reconciler, Result};
use decl_content::{DiffEntry, apply_compare_transforms, build_diff_entries, sort_diff_entries};
use decl_meta::path::{child_segment, normalize_logical_path};
use decl_meta::{Operation, OperationSpec, ResourceDescriptor};
use serde_json::Value;

impl Reconciler {
    /// Local state, falling back to the remote only when the resource is
    /// missing locally and a remote service is configured.
    pub async fn get(&self, logical_path: &str) -> Result<Value> {
        match self.get_local(logical_path).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_not_found() && self.has_remote() => {
                tracing::debug!(path = logical_path, "Local miss, reading remote");
                self.get_remote(logical_path).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_local(&self, logical_path: &str) -> Result<Value> {
        match self.resolve_local_for_read(logical_path).await {
            Ok(resource) => {
                tracing::debug!(path = logical_path, "Local hit");
                Ok(resource.payload)
            }
            Err(e) => {
                tracing::debug!(path = logical_path, error = %e, "Local read failed");
                Err(e)
            }
        }
    }

    pub async fn get_remote(&self, logical_path: &str) -> Result<Value> {
        let descriptor = self.describe_for_remote_read(logical_path).await?;
        match self.fetch_remote_value(&descriptor).await {
            Ok(value) => {
                tracing::debug!(path = %descriptor.logical_path, "Remote hit");
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(path = %descriptor.logical_path, error = %e, "Remote read failed");
                Err(e)
            }
        }
    }

    /// Store a payload locally, masking secrets first.
    pub async fn save(&self, logical_path: &str, value: Value) -> Result<()> {
        let store = self.require_store()?;
        let logical_path = normalize_logical_path(logical_path)?;
        let masked = self.mask_payload_for_local(value).await?;
        store.save(&logical_path, &masked).await
    }

    /// Push local desired state to the remote, creating or updating.
    pub async fn apply(&self, logical_path: &str) -> Result<ResourceDescriptor> {
        let local = self.resolve_local_for_read(logical_path).await?;
        let mut descriptor = self.describe(&local.logical_path, local.payload).await?;
        descriptor.payload = self
            .resolve_payload_for_remote(&descriptor.logical_path, descriptor.payload)
            .await?;

        let remote = self.require_remote()?;
        let operation = if remote.exists(&descriptor).await? {
            Operation::Update
        } else {
            Operation::Create
        };
        tracing::info!(path = %descriptor.logical_path, %operation, "Applying resource");
        self.execute_mutation(descriptor, operation).await
    }

    pub async fn create(&self, logical_path: &str, value: Value) -> Result<ResourceDescriptor> {
        let descriptor = self.describe_for_mutation(logical_path, value).await?;
        self.execute_mutation(descriptor, Operation::Create).await
    }

    pub async fn update(&self, logical_path: &str, value: Value) -> Result<ResourceDescriptor> {
        let descriptor = self.describe_for_mutation(logical_path, value).await?;
        self.execute_mutation(descriptor, Operation::Update).await
    }

    /// Delete the remote resource. A direct miss is retried once with the
    /// identity of the resource the remote resolver finds, unless that
    /// identity is the one that just missed.
    pub async fn delete(&self, logical_path: &str) -> Result<()> {
        let remote = self.require_remote()?;
        let mut descriptor = self.describe_for_remote_read(logical_path).await?;

        let original_err = match remote.delete(&descriptor).await {
            Err(e) if e.is_not_found() => e,
            other => return other,
        };

        let payload = self.fetch_remote_value(&descriptor).await?;
        let (local_alias, remote_id) =
            resolve_resource_identity(&descriptor.logical_path, &descriptor.metadata, &payload);
        if local_alias == descriptor.local_alias && remote_id == descriptor.remote_id {
            tracing::debug!(
                path = %descriptor.logical_path,
                remote_id = %remote_id,
                "Resolved identity unchanged, not retrying delete"
            );
            return Err(original_err);
        }
        tracing::debug!(
            path = %descriptor.logical_path,
            remote_id = %remote_id,
            "Retrying delete with resolved identity"
        );
        descriptor.payload = payload;
        descriptor.local_alias = local_alias;
        descriptor.remote_id = remote_id;
        remote.delete(&descriptor).await
    }

    /// Drift between local desired state and remote actual state.
    ///
    /// A missing remote resource is compared as `null`.
    pub async fn diff(&self, logical_path: &str) -> Result<Vec<DiffEntry>> {
        let local = self.resolve_local_for_read(logical_path).await?;
        let mut descriptor = self.describe(&local.logical_path, local.payload).await?;
        let local_value = self
            .resolve_payload_for_remote(&descriptor.logical_path, descriptor.payload)
            .await?;
        descriptor.payload = local_value.clone();

        let remote_value = match self.fetch_remote_value(&descriptor).await {
            Ok(value) => value,
            Err(e) if e.is_not_found() => Value::Null,
            Err(e) => return Err(e),
        };

        let compare = self.render_operation_spec(&descriptor, Operation::Compare, &local_value)?;
        let local_view = apply_compare_transforms(
            &local_value,
            compare.filter_pointers(),
            compare.suppress_pointers(),
        )?;
        let remote_view = apply_compare_transforms(
            &remote_value,
            compare.filter_pointers(),
            compare.suppress_pointers(),
        )?;

        let mut entries = build_diff_entries(&descriptor.logical_path, &local_view, &remote_view);
        sort_diff_entries(&mut entries);
        tracing::debug!(path = %descriptor.logical_path, entries = entries.len(), "Computed diff");
        Ok(entries)
    }

    /// Local resources under a path with their payloads loaded.
    pub async fn list_local(
        &self,
        logical_path: &str,
        policy: ListPolicy,
    ) -> Result<Vec<ResourceDescriptor>> {
        let store = self.require_store()?;
        let logical_path = normalize_logical_path(logical_path)?;
        let mut items = store.list(&logical_path, policy).await?;
        for item in items.iter_mut().filter(|item| item.payload.is_null()) {
            item.payload = store.get(&item.logical_path).await?;
        }
        Ok(items)
    }

    /// Remote resources under a path, sorted by logical path.
    pub async fn list_remote(
        &self,
        logical_path: &str,
        policy: ListPolicy,
    ) -> Result<Vec<ResourceDescriptor>> {
        let logical_path = normalize_logical_path(logical_path)?;
        let remote = self.require_remote()?;
        let metadata = self.resolve_metadata(&logical_path).await?;

        let mut items = self
            .list_remote_resources(remote, &logical_path, &metadata)
            .await?;
        items.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));
        if !policy.recursive {
            items.retain(|item| child_segment(&logical_path, &item.logical_path).is_some());
        }
        Ok(items)
    }

    /// The fully rendered request spec `operation` would use for a payload.
    pub async fn render_operation(
        &self,
        logical_path: &str,
        value: Value,
        operation: Operation,
    ) -> Result<OperationSpec> {
        let descriptor = self.describe(logical_path, value).await?;
        self.render_operation_spec(&descriptor, operation, &descriptor.payload)
    }

    /// The remote service's OpenAPI document, if it publishes one.
    pub async fn openapi_spec(&self) -> Result<Option<Value>> {
        self.require_remote()?.openapi_spec().await
    }

    async fn describe_for_mutation(
        &self,
        logical_path: &str,
        value: Value,
    ) -> Result<ResourceDescriptor> {
        let mut descriptor = self.describe(logical_path, value).await?;
        descriptor.payload = self
            .resolve_payload_for_remote(&descriptor.logical_path, descriptor.payload)
            .await?;
        Ok(descriptor)
    }

    async fn execute_mutation(
        &self,
        mut descriptor: ResourceDescriptor,
        operation: Operation,
    ) -> Result<ResourceDescriptor> {
        let remote = self.require_remote()?;
        let response = match operation {
            Operation::Create => remote.create(&descriptor).await?,
            Operation::Update => remote.update(&descriptor).await?,
            other => {
                return Err(Error::validation(format!(
                    "unsupported remote mutation operation {other}"
                )));
            }
        };
        if !response.is_null() {
            descriptor.payload = response;
        }
        Ok(descriptor)
    }

    async fn resolve_payload_for_remote(&self, logical_path: &str, value: Value) -> Result<Value> {
        match self.secrets.as_deref() {
            Some(secrets) if !value.is_null() => secrets.resolve_payload(logical_path, value).await,
            _ => Ok(value),
        }
    }

    async fn mask_payload_for_local(&self, value: Value) -> Result<Value> {
        match self.secrets.as_deref() {
            Some(secrets) if !value.is_null() => secrets.mask_payload(value).await,
            _ => Ok(value),
        }
    }
}
