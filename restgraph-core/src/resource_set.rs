//! # Resource sets
//!
//! A [`ResourceSet`] is a page of resources of one type, or several pages once accumulated by
//! [`Collection::all`](crate::Collection::all). It keeps the raw payload it was built from, which
//! stays the source of truth for pagination metadata.
//!
//! ## Linked resources
//!
//! The service side-loads related resources in a single `linked` bucket per relationship, shared
//! by the whole page. [`ResourceSet::set_data`] splits each bucket per resource:
//!
//! 1. Items carrying a `<singularName>Ref` field are kept only by the resource with that ref.
//! 2. Otherwise, when the relationship is not resolved through another one, every resource keeps
//!    every item (e.g. shared lookup tables).
//! 3. Otherwise the items are correlated through the other relationship: a resource keeps the
//!    items whose filter field holds one of the foreign keys the resource stores for it.
mod batch;
pub(crate) mod pagination;

pub use batch::BatchError;

use crate::collection::{Collection, CollectionError};
use crate::descriptor::{Descriptor, value_at_path};
use crate::query::Criteria;
use crate::resource::Resource;
use crate::transport::RequestOptions;
use serde_json::{Map, Value};

const LINKED: &str = "linked";
const META: &str = "meta";
const REF: &str = "ref";

#[derive(Debug, thiserror::Error)]
pub enum ResourceSetError {
    #[error("The resource set is not bound to a collection")]
    NoEndpoint,
    #[error("There is no next page")]
    NoNextPage,
    #[error("There is no previous page")]
    NoPreviousPage,
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

#[derive(Debug, Clone)]
pub struct ResourceSet {
    raw_data: Value,
    resources: Vec<Resource>,
    initial_criteria: Criteria,
    options: RequestOptions,
    collection: Option<Collection>,
}

impl ResourceSet {
    /// Builds a set from a raw payload. Resources are only extracted when bound.
    pub fn new(raw_data: Value, collection: Option<Collection>) -> Self {
        let mut set = Self {
            raw_data: Value::Null,
            resources: Vec::new(),
            initial_criteria: Criteria::default(),
            options: RequestOptions::default(),
            collection,
        };
        set.set_data(raw_data);
        set
    }

    /// A set holding the given resources, without any server payload behind it.
    pub fn from_resources(resources: Vec<Resource>, collection: Option<Collection>) -> Self {
        Self {
            raw_data: Value::Object(Map::new()),
            resources,
            initial_criteria: Criteria::default(),
            options: RequestOptions::default(),
            collection,
        }
    }

    pub(crate) fn with_request(mut self, criteria: Criteria, options: RequestOptions) -> Self {
        self.initial_criteria = criteria;
        self.options = options;
        self
    }

    /// Re-binds the set to a fresh payload, rebuilding every resource and its linked buckets.
    pub fn set_data(&mut self, raw_data: Value) {
        self.raw_data = raw_data;
        self.resources = match &self.collection {
            Some(collection) => build_resources(&self.raw_data, collection),
            None => Vec::new(),
        };
    }

    pub fn raw_data(&self) -> &Value {
        &self.raw_data
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    pub fn initial_criteria(&self) -> &Criteria {
        &self.initial_criteria
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut [Resource] {
        &mut self.resources
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn meta(&self) -> Option<&Map<String, Value>> {
        self.raw_data.get(META).and_then(Value::as_object)
    }

    fn meta_number(&self, key: &str) -> Option<usize> {
        self.meta()
            .and_then(|meta| meta.get(key))
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    }

    /// The total number of matching resources, or the local count when the server omits it.
    pub fn total_count(&self) -> usize {
        self.meta_number("totalCount").unwrap_or(self.resources.len())
    }

    pub fn page(&self) -> Option<usize> {
        self.meta_number("page")
    }

    pub fn per_page(&self) -> Option<usize> {
        self.meta_number("perPage")
    }

    /// Appends a resource.
    pub fn add(&mut self, resource: Resource) -> &mut Resource {
        self.resources.push(resource);
        let last = self.resources.len() - 1;
        &mut self.resources[last]
    }

    /// Wraps plain data into a new resource through the collection's factory and appends it.
    pub fn add_data(&mut self, data: Value) -> Result<&mut Resource, ResourceSetError> {
        let collection = self.collection.as_ref().ok_or(ResourceSetError::NoEndpoint)?;
        let resource = collection.new_resource(data);
        Ok(self.add(resource))
    }

    /// Removes the resource with the given ref.
    pub fn remove(&mut self, reference: &str) -> Option<Resource> {
        let index = self
            .resources
            .iter()
            .position(|resource| resource.reference() == Some(reference))?;
        Some(self.resources.remove(index))
    }

    pub fn find(&self, reference: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|resource| resource.reference() == Some(reference))
    }

    pub fn find_mut(&mut self, reference: &str) -> Option<&mut Resource> {
        self.resources
            .iter_mut()
            .find(|resource| resource.reference() == Some(reference))
    }

    /// Every resource matching `criteria`.
    pub fn where_matching<'a>(&self, criteria: impl Into<Matcher<'a>>) -> Vec<&Resource> {
        let matcher = criteria.into();
        self.resources
            .iter()
            .filter(|resource| matcher.matches(resource))
            .collect()
    }

    /// The first resource matching `criteria`.
    pub fn find_where<'a>(&self, criteria: impl Into<Matcher<'a>>) -> Option<&Resource> {
        let matcher = criteria.into();
        self.resources
            .iter()
            .find(|resource| matcher.matches(resource))
    }

    /// Returns the resource matching the candidate's wire shape, appending the candidate when
    /// there is none. Fields the candidate leaves unset are not compared.
    pub fn find_or_create(&mut self, candidate: Resource) -> &mut Resource {
        let fields: Map<String, Value> = match candidate.to_json() {
            Value::Object(fields) => fields
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect(),
            _ => Map::new(),
        };
        let matcher = Matcher::from(fields);
        match self
            .resources
            .iter()
            .position(|resource| matcher.matches(resource))
        {
            Some(index) => &mut self.resources[index],
            None => self.add(candidate),
        }
    }
}

impl IntoIterator for ResourceSet {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

/// Criteria for [`ResourceSet::where_matching`]: a predicate, or fields to compare.
pub enum Matcher<'a> {
    Predicate(Box<dyn Fn(&Resource) -> bool + 'a>),
    /// Each field must be strictly equal to the resource's value. When a `ref` is present, only
    /// the ref is compared. Arrays and objects never compare equal.
    Fields(Map<String, Value>),
}

impl<'a> Matcher<'a> {
    pub fn predicate(f: impl Fn(&Resource) -> bool + 'a) -> Self {
        Matcher::Predicate(Box::new(f))
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Matcher::Predicate(f) => f(resource),
            Matcher::Fields(fields) => match fields.get(REF) {
                Some(reference) => strictly_equal(resource.get(REF), reference),
                None => fields
                    .iter()
                    .all(|(key, expected)| strictly_equal(resource.get(key), expected)),
            },
        }
    }
}

impl From<Map<String, Value>> for Matcher<'_> {
    fn from(fields: Map<String, Value>) -> Self {
        Matcher::Fields(fields)
    }
}

impl From<Value> for Matcher<'_> {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Matcher::Fields(fields),
            _ => Matcher::Fields(Map::new()),
        }
    }
}

fn strictly_equal(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (_, Value::Array(_) | Value::Object(_)) => false,
        (Some(actual), expected) => actual == expected,
        (None, _) => false,
    }
}

fn build_resources(raw_data: &Value, collection: &Collection) -> Vec<Resource> {
    let descriptor = collection.descriptor();

    let Some(items) = raw_data
        .get(&descriptor.plural_name)
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let linked = raw_data.get(LINKED).and_then(Value::as_object);

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|data| {
            let mut resource = Resource::bound(data.clone(), collection.clone());
            if let Some(linked) = linked {
                for (relationship, bucket) in linked {
                    let Some(bucket) = bucket.as_array() else {
                        continue;
                    };
                    let items = relevant_items(descriptor, &resource, relationship, bucket);
                    resource.set_linked(relationship.clone(), items);
                }
            }
            resource
        })
        .collect()
}

fn relevant_items(
    descriptor: &Descriptor,
    resource: &Resource,
    relationship: &str,
    bucket: &[Value],
) -> Vec<Value> {
    let back_reference = descriptor.back_reference_field();

    let through = descriptor
        .relationships
        .get(relationship)
        .and_then(|rel| rel.through.as_deref())
        .map(|through| descriptor.relationships.get(through));

    bucket
        .iter()
        .filter(|item| {
            if let Some(owner_ref) = item
                .get(&back_reference)
                .and_then(Value::as_str)
                .filter(|owner_ref| !owner_ref.is_empty())
            {
                return Some(owner_ref) == resource.reference();
            }

            match through {
                None => true,
                // The descriptor names a relationship it does not declare: nothing to correlate.
                Some(None) => true,
                Some(Some(through)) => {
                    let (Some(own_path), Some(filter_path)) = (
                        through.field_name_path.as_deref(),
                        through.filter_name.as_deref(),
                    ) else {
                        return true;
                    };
                    let Some(candidate) = value_at_path(item, filter_path) else {
                        return false;
                    };
                    foreign_keys(resource, own_path).any(|key| key == candidate)
                }
            }
        })
        .cloned()
        .collect()
}

/// The foreign keys a resource holds at `path`, whether stored as a list or a single value.
fn foreign_keys<'a>(resource: &'a Resource, path: &str) -> impl Iterator<Item = &'a Value> {
    let value = resource
        .data()
        .get(path.split('.').next().unwrap_or(path))
        .and_then(|root| match path.split_once('.') {
            Some((_, rest)) => value_at_path(root, rest),
            None => Some(root),
        });

    let keys: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    };
    keys.into_iter()
}
