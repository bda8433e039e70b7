//! Resource metadata model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// An operation the remote service exposes for a resource.
///
/// Variants are declared in name order so iteration over an operation map
/// visits operations alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Compare,
    Create,
    Delete,
    Get,
    List,
    Update,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Compare,
        Operation::Create,
        Operation::Delete,
        Operation::Get,
        Operation::List,
        Operation::Update,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compare => "compare",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Get => "get",
            Self::List => "list",
            Self::Update => "update",
        }
    }

    /// Path template used when metadata does not configure one.
    pub fn default_path_template(self) -> &'static str {
        match self {
            Self::Create | Self::List => ".",
            _ => "./{{.id}}",
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s.trim())
            .ok_or_else(|| Error::UnsupportedOperation(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request validation rules for an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema_ref: String,
}

impl ValidationSpec {
    fn merge(&self, overlay: &Self) -> Self {
        let mut merged = self.clone();
        if overlay.required_attributes.is_some() {
            merged.required_attributes = overlay.required_attributes.clone();
        }
        if !overlay.schema_ref.is_empty() {
            merged.schema_ref = overlay.schema_ref.clone();
        }
        merged
    }
}

/// How to perform one operation against the remote service.
///
/// String fields are templates rendered against a [`crate::TemplateScope`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub accept: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jq: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<ValidationSpec>,
}

impl OperationSpec {
    /// Overlay `overlay` onto `self`.
    ///
    /// Non-empty scalars win. Maps merge key by key, and an explicitly
    /// empty overlay map clears the base. Present lists replace.
    pub fn merge(&self, overlay: &Self) -> Self {
        let mut merged = self.clone();
        if !overlay.method.is_empty() {
            merged.method = overlay.method.clone();
        }
        if !overlay.path.is_empty() {
            merged.path = overlay.path.clone();
        }
        merge_string_map(&mut merged.query, overlay.query.as_ref());
        merge_string_map(&mut merged.headers, overlay.headers.as_ref());
        if !overlay.accept.is_empty() {
            merged.accept = overlay.accept.clone();
        }
        if !overlay.content_type.is_empty() {
            merged.content_type = overlay.content_type.clone();
        }
        if overlay.body.is_some() {
            merged.body = overlay.body.clone();
        }
        if overlay.filter.is_some() {
            merged.filter = overlay.filter.clone();
        }
        if overlay.suppress.is_some() {
            merged.suppress = overlay.suppress.clone();
        }
        if !overlay.jq.is_empty() {
            merged.jq = overlay.jq.clone();
        }
        merged.validate = match (&merged.validate, &overlay.validate) {
            (_, None) => merged.validate.clone(),
            (None, Some(overlay)) => Some(ValidationSpec::default().merge(overlay)),
            (Some(base), Some(overlay)) => Some(base.merge(overlay)),
        };
        merged
    }

    pub fn filter_pointers(&self) -> &[String] {
        self.filter.as_deref().unwrap_or_default()
    }

    pub fn suppress_pointers(&self) -> &[String] {
        self.suppress.as_deref().unwrap_or_default()
    }
}

fn merge_string_map(
    base: &mut Option<BTreeMap<String, String>>,
    overlay: Option<&BTreeMap<String, String>>,
) {
    let Some(overlay) = overlay else { return };
    if overlay.is_empty() {
        *base = Some(BTreeMap::new());
        return;
    }
    let target = base.get_or_insert_with(BTreeMap::new);
    for (key, value) in overlay {
        target.insert(key.clone(), value.clone());
    }
}

/// Per-path configuration describing how a resource maps onto the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    /// Payload attribute (dotted) holding the remote identifier
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id_from_attribute: String,
    /// Payload attribute (dotted) holding the local alias
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias_from_attribute: String,
    /// Template for the remote collection path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_from_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub operations: BTreeMap<Operation, OperationSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress: Option<Vec<String>>,
    /// Response filter expression evaluated by the remote collaborator
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jq: String,
}

impl ResourceMetadata {
    /// Overlay `overlay` onto `self` using the [`OperationSpec::merge`] rules.
    pub fn merge(&self, overlay: &Self) -> Self {
        let mut merged = self.clone();
        if !overlay.id_from_attribute.is_empty() {
            merged.id_from_attribute = overlay.id_from_attribute.clone();
        }
        if !overlay.alias_from_attribute.is_empty() {
            merged.alias_from_attribute = overlay.alias_from_attribute.clone();
        }
        if !overlay.collection_path.is_empty() {
            merged.collection_path = overlay.collection_path.clone();
        }
        if overlay.secrets_from_attributes.is_some() {
            merged.secrets_from_attributes = overlay.secrets_from_attributes.clone();
        }
        for (op, spec) in &overlay.operations {
            let base = merged.operations.remove(op).unwrap_or_default();
            merged.operations.insert(*op, base.merge(spec));
        }
        if overlay.filter.is_some() {
            merged.filter = overlay.filter.clone();
        }
        if overlay.suppress.is_some() {
            merged.suppress = overlay.suppress.clone();
        }
        if !overlay.jq.is_empty() {
            merged.jq = overlay.jq.clone();
        }
        merged
    }

    pub fn id_attribute(&self) -> Option<&str> {
        non_blank(&self.id_from_attribute)
    }

    pub fn alias_attribute(&self) -> Option<&str> {
        non_blank(&self.alias_from_attribute)
    }

    /// True when either identity attribute is configured.
    pub fn has_identity_attribute(&self) -> bool {
        self.id_attribute().is_some() || self.alias_attribute().is_some()
    }

    pub fn operation(&self, op: Operation) -> Option<&OperationSpec> {
        self.operations.get(&op)
    }

    /// True when a response filter expression is configured at the resource
    /// level or on its list operation.
    pub fn has_list_filter_expression(&self) -> bool {
        !self.jq.trim().is_empty()
            || self
                .operation(Operation::List)
                .is_some_and(|spec| !spec.jq.trim().is_empty())
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
