//! # Descriptors
//!
//! A [`Descriptor`] is the read-only, server-supplied schema of one resource type: its names,
//! field rules, relationships and operation limits. Everything the library does with a resource
//! (validation, serialization, linking, query augmentation) is driven by it.
//!
//! Descriptors are fetched by the session layer, optionally kept in a [`DescriptorCache`], and
//! shared immutably between a [`Collection`](crate::Collection) and its resources.
pub mod cache;

pub use cache::{CacheError, DescriptorCache};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Batch size used when the descriptor does not declare `operations.storeBatch.limit`.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Suffix marking a foreign-key field that holds a list of refs (`assetRefs` vs `assetRef`).
const PLURAL_SUFFIX: char = 's';

/// Errors raised when a relationship cannot be resolved from a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelationshipError {
    #[error("Relationship '{0}' not found")]
    NotFound(String),
    #[error("No relationship found for resource type '{0}'")]
    NoneForResourceType(String),
    #[error("Relationship '{0}' does not declare a fieldNamePath")]
    MissingFieldPath(String),
    #[error("Cannot infer a relationship for a resource without a collection")]
    UnknownTargetType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub plural_name: String,
    pub singular_name: String,
    /// URL segment of the collection. Falls back to `plural_name` when absent.
    #[serde(default)]
    pub hyphenated_plural_name: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDescriptor>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
    #[serde(default)]
    pub operations: Operations,
}

impl Descriptor {
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn url_segment(&self) -> &str {
        self.hyphenated_plural_name
            .as_deref()
            .unwrap_or(&self.plural_name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn batch_size(&self) -> usize {
        self.operations
            .store_batch
            .as_ref()
            .and_then(|op| op.limit)
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Looks up a relationship by its key.
    pub fn relationship(&self, name: &str) -> Result<&Relationship, RelationshipError> {
        self.relationships
            .get(name)
            .ok_or_else(|| RelationshipError::NotFound(name.to_string()))
    }

    /// Finds the relationship pointing at the given resource type (plural name).
    pub fn relationship_for(
        &self,
        resource_type: &str,
    ) -> Result<(&str, &Relationship), RelationshipError> {
        self.relationships
            .iter()
            .find(|(_, relationship)| relationship.resource_type == resource_type)
            .map(|(name, relationship)| (name.as_str(), relationship))
            .ok_or_else(|| RelationshipError::NoneForResourceType(resource_type.to_string()))
    }

    /// The name of the foreign-key field other resources use to point back at this type.
    pub fn back_reference_field(&self) -> String {
        format!("{}Ref", self.singular_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Allowed values, keyed by label.
    #[serde(default)]
    pub allowed: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub pattern: Option<String>,
    /// Rules for the keys of a map-typed field.
    #[serde(default)]
    pub keys: Option<KeyRules>,
    /// Rules for the values of a map-typed field.
    #[serde(default)]
    pub values: Option<ValueRules>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyRules {
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRules {
    #[serde(default)]
    pub allowed: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    /// This resource holds the foreign key.
    Direct,
    /// The related resource holds the foreign key back to this one.
    Indirect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub resource_type: String,
    #[serde(default)]
    pub field_name_path: Option<String>,
    /// Field of the related resources used to correlate them with the foreign keys held in
    /// `field_name_path`, when this relationship is gone through by another one.
    #[serde(default)]
    pub filter_name: Option<String>,
    /// Name of the relationship this one is resolved through.
    #[serde(default)]
    pub through: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

impl Relationship {
    pub fn is_direct(&self) -> bool {
        self.kind == RelationshipKind::Direct
    }

    pub fn is_through(&self) -> bool {
        self.through.is_some()
    }

    /// The foreign-key field, failing when the descriptor omits it.
    pub fn field_path(&self, name: &str) -> Result<&str, RelationshipError> {
        self.field_name_path
            .as_deref()
            .ok_or_else(|| RelationshipError::MissingFieldPath(name.to_string()))
    }
}

/// Whether a foreign-key field holds a list of refs rather than a single one.
pub fn is_plural_field(field: &str) -> bool {
    field.ends_with(PLURAL_SUFFIX)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operations {
    #[serde(default)]
    pub store_batch: Option<BatchOperation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOperation {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Reads the value at a dotted path (`meta.owner`) inside a JSON value.
pub(crate) fn value_at_path<'a>(
    value: &'a serde_json::Value,
    path: &str,
) -> Option<&'a serde_json::Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_for_optional_sections() {
        let descriptor = Descriptor::from_json(json!({
            "pluralName": "assets",
            "singularName": "asset"
        }))
        .unwrap();

        assert_eq!(descriptor.url_segment(), "assets");
        assert_eq!(descriptor.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(descriptor.back_reference_field(), "assetRef");
        assert!(descriptor.field_names().is_empty());
    }

    #[test]
    fn test_relationship_lookups() {
        let descriptor = Descriptor::from_json(json!({
            "pluralName": "contents",
            "singularName": "content",
            "hyphenatedPluralName": "content-items",
            "relationships": {
                "assets": { "type": "indirect", "resourceType": "assets" }
            },
            "operations": { "storeBatch": { "limit": 25 } }
        }))
        .unwrap();

        assert_eq!(descriptor.url_segment(), "content-items");
        assert_eq!(descriptor.batch_size(), 25);

        let (name, relationship) = descriptor.relationship_for("assets").unwrap();
        assert_eq!(name, "assets");
        assert!(!relationship.is_direct());
        assert_eq!(
            relationship.field_path(name),
            Err(RelationshipError::MissingFieldPath("assets".to_string()))
        );
        assert_eq!(
            descriptor.relationship("variants"),
            Err(RelationshipError::NotFound("variants".to_string()))
        );
    }

    #[test]
    fn test_plural_fields_and_paths() {
        assert!(is_plural_field("variantRefs"));
        assert!(!is_plural_field("authorRef"));

        let value = json!({ "meta": { "owner": "acme" } });
        assert_eq!(value_at_path(&value, "meta.owner"), Some(&json!("acme")));
        assert_eq!(value_at_path(&value, "meta.missing"), None);
    }
}
