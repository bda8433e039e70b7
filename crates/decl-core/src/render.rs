//! Operation spec rendering for descriptors

use crate::{Reconciler, Result};
use decl_meta::path::normalize_logical_path;
use decl_meta::{Operation, OperationSpec, ResourceDescriptor, build_resource_scope, resolve_operation_spec};
use serde_json::Value;

impl Reconciler {
    /// Render `operation` for `descriptor` with `payload` as the template
    /// payload.
    pub(crate) fn render_operation_spec(
        &self,
        descriptor: &ResourceDescriptor,
        operation: Operation,
        payload: &Value,
    ) -> Result<OperationSpec> {
        let mut template_resource = descriptor.clone();
        template_resource.payload = payload.clone();

        let mut scope = build_resource_scope(&template_resource);
        scope.insert("resourceFormat", self.resource_format.to_string());

        Ok(resolve_operation_spec(
            &template_resource.metadata,
            operation,
            &scope,
        )?)
    }

    /// Rendered path of `operation`, or `None` when rendering fails or the
    /// result is not a valid logical path.
    pub(crate) fn rendered_operation_path(
        &self,
        descriptor: &ResourceDescriptor,
        operation: Operation,
    ) -> Option<String> {
        let spec = self
            .render_operation_spec(descriptor, operation, &descriptor.payload)
            .ok()?;
        normalize_logical_path(&spec.path).ok()
    }
}
