//! # Resources
//!
//! A [`Resource`] is one remote record. It is split in two parts:
//!
//! * the resource's own fields, an open JSON map whose shape is given by the descriptor;
//! * local bookkeeping kept out of that map: the `is_new` marker, side-loaded `linked`
//!   resources, pending indirect links and the last validation errors.
//!
//! A resource bound to a [`Collection`] can validate, serialize to the wire envelope, link to
//! other resources and persist itself. An unbound resource is a plain value object: those
//! operations fail with [`ResourceError::NoEndpoint`].
mod link;
mod validation;

pub use link::LinkTarget;
pub use validation::{FieldValidation, ValidationCode, validate_value};

use crate::collection::{Collection, CollectionError};
use crate::descriptor::{Descriptor, RelationshipError};
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const REF: &str = "ref";
const OWNER: &str = "owner";
const NAME: &str = "name";

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("The resource is not bound to a collection")]
    NoEndpoint,
    #[error("The resource has no ref")]
    MissingRef,
    #[error("Validation failed for {} field(s)", .0.len())]
    Invalid(Vec<FieldValidation>),
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

#[derive(Debug, Clone)]
pub struct Resource {
    data: Map<String, Value>,
    is_new: bool,
    linked: BTreeMap<String, Vec<Value>>,
    indirectly_linked: Vec<Resource>,
    errors: Vec<FieldValidation>,
    collection: Option<Collection>,
}

impl Resource {
    /// A bare value object, not bound to any collection.
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            is_new: false,
            linked: BTreeMap::new(),
            indirectly_linked: Vec::new(),
            errors: Vec::new(),
            collection: None,
        }
    }

    /// A bare value object built from any JSON value. Non-object values yield an empty resource.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(data) => Self::new(data),
            _ => Self::new(Map::new()),
        }
    }

    pub(crate) fn bound(data: Map<String, Value>, collection: Collection) -> Self {
        Self {
            collection: Some(collection),
            ..Self::new(data)
        }
    }

    pub(crate) fn mark_new(mut self) -> Self {
        self.is_new = true;
        self
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    /// Binds the resource to a collection, replacing the previous one if any.
    pub fn bind(&mut self, collection: Collection) {
        self.collection = Some(collection);
    }

    /// The plural name of the resource type, known only when bound.
    pub fn resource_type(&self) -> Option<&str> {
        self.collection
            .as_ref()
            .map(|collection| collection.descriptor().plural_name.as_str())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.data.remove(field)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_data(self) -> Map<String, Value> {
        self.data
    }

    pub fn reference(&self) -> Option<&str> {
        self.data.get(REF).and_then(Value::as_str)
    }

    pub fn owner(&self) -> Option<&str> {
        self.data.get(OWNER).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.data.get(NAME).and_then(Value::as_str)
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn linked(&self, relationship: &str) -> &[Value] {
        self.linked
            .get(relationship)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn linked_all(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.linked
    }

    pub fn set_linked(&mut self, relationship: impl Into<String>, items: Vec<Value>) {
        self.linked.insert(relationship.into(), items);
    }

    pub fn has_linked(&self, relationship: &str) -> bool {
        self.linked
            .get(relationship)
            .is_some_and(|items| !items.is_empty())
    }

    /// Resources linked indirectly and not persisted yet.
    pub fn pending_links(&self) -> &[Resource] {
        &self.indirectly_linked
    }

    /// Errors from the last call to [`Resource::validate`].
    pub fn errors(&self) -> &[FieldValidation] {
        &self.errors
    }

    /// The wire representation of the resource.
    ///
    /// When bound, exactly the descriptor's fields are emitted, using the declared default for
    /// unset ones. When unbound, the raw data is returned as is.
    pub fn to_json(&self) -> Value {
        match &self.collection {
            Some(collection) => self.to_json_with(collection.descriptor()),
            None => Value::Object(self.data.clone()),
        }
    }

    pub(crate) fn to_json_with(&self, descriptor: &Descriptor) -> Value {
        let json = descriptor
            .fields
            .iter()
            .map(|(name, field)| {
                let value = self
                    .data
                    .get(name)
                    .filter(|value| !value.is_null())
                    .or(field.default.as_ref())
                    .cloned()
                    .unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect();

        Value::Object(json)
    }

    /// Wraps [`Resource::to_json`] in the `{ "<pluralName>": [ ... ] }` envelope.
    pub fn serialise(&self) -> Result<Value, ResourceError> {
        let collection = self.collection.as_ref().ok_or(ResourceError::NoEndpoint)?;
        let mut envelope = Map::new();
        envelope.insert(
            collection.descriptor().plural_name.clone(),
            Value::Array(vec![self.to_json()]),
        );
        Ok(Value::Object(envelope))
    }

    pub fn validate_field(&self, field: &str) -> Result<FieldValidation, ResourceError> {
        let collection = self.collection.as_ref().ok_or(ResourceError::NoEndpoint)?;
        Ok(validate_value(
            field,
            self.data.get(field),
            collection.descriptor().field(field),
        ))
    }

    /// Validates every declared field, keeping the failures in [`Resource::errors`].
    pub fn validate(&mut self) -> Result<(), ResourceError> {
        let collection = self.collection.as_ref().ok_or(ResourceError::NoEndpoint)?;

        let errors: Vec<FieldValidation> = collection
            .descriptor()
            .fields
            .iter()
            .map(|(name, field)| validate_value(name, self.data.get(name), Some(field)))
            .filter(|result| !result.valid)
            .collect();

        self.errors = errors;

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ResourceError::Invalid(self.errors.clone()))
        }
    }

    /// Persists pending indirect links, then the resource itself (created when new, updated
    /// otherwise), and returns the resource as stored by the service.
    ///
    /// Links are saved before the resource, so a new resource may not exist remotely yet when
    /// its links are written. Nothing is rolled back if a later step fails.
    pub fn save(&mut self) -> BoxFuture<'_, Result<Resource, ResourceError>> {
        Box::pin(async move {
            let collection = self.collection.clone().ok_or(ResourceError::NoEndpoint)?;

            for linked in self.indirectly_linked.iter_mut() {
                linked.save().await?;
            }

            let saved = if self.is_new {
                collection.store(self).await?
            } else {
                collection.update(self).await?
            };

            self.indirectly_linked.clear();

            Ok(saved)
        })
    }

    pub async fn destroy(&self) -> Result<Value, ResourceError> {
        let collection = self.collection.as_ref().ok_or(ResourceError::NoEndpoint)?;
        Ok(collection.destroy(self).await?)
    }
}

impl From<Map<String, Value>> for Resource {
    fn from(data: Map<String, Value>) -> Self {
        Resource::new(data)
    }
}
