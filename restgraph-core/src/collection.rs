//! # Collection endpoint
//!
//! A [`Collection`] binds a [`Descriptor`] to a service location, a tenant and a [`Transport`].
//! It performs the remote reads and writes of one resource type and builds [`Resource`]s and
//! [`ResourceSet`]s out of the responses, bound to itself.
//!
//! Requests are addressed as `<location>/<hyphenatedPluralName>[/<refs>]?owner=<tenant>[&criteria]`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use restgraph_core::{Collection, Descriptor, HttpTransport, Query, field};
//!
//! # async fn run(descriptor: Descriptor) -> Result<(), Box<dyn std::error::Error>> {
//! let contents = Collection::new(
//!     descriptor,
//!     "https://api.example.com/content",
//!     "acme",
//!     HttpTransport::new(),
//! );
//!
//! let query = Query::new()
//!     .and(field("name").starts_with("intro"))
//!     .include(["assets"]);
//!
//! let everything = contents.all(query, Default::default()).await?;
//! println!("{} contents", everything.len());
//! # Ok(())
//! # }
//! ```
mod read;
mod write;

use crate::descriptor::{Descriptor, Relationship, RelationshipError};
use crate::query::{Criteria, encode};
use crate::resource::Resource;
use crate::resource_set::ResourceSet;
use crate::transport::{Transport, TransportError};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

const LINKED: &str = "linked";

/// Errors that can occur while talking to a collection.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
    #[error("Invalid service description: '{0}'")]
    InvalidDescriptor(#[source] serde_json::Error),
    #[error("Service description is missing '{0}'")]
    MissingServiceField(&'static str),
    #[error("The resource has no ref")]
    MissingRef,
    #[error("Response contains no '{0}'")]
    NotFound(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// A descriptor-bound endpoint for one resource type.
///
/// Cloning is cheap: clones share the descriptor and the transport.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<Inner>,
}

struct Inner {
    descriptor: Descriptor,
    location: String,
    tenant: String,
    transport: Arc<dyn Transport>,
}

impl Collection {
    pub fn new(
        descriptor: Descriptor,
        location: impl Into<String>,
        tenant: impl Into<String>,
        transport: impl Transport,
    ) -> Self {
        Self::with_shared_transport(descriptor, location, tenant, Arc::new(transport))
    }

    /// Same as [`Collection::new`], for a transport shared with other collections.
    pub fn with_shared_transport(
        descriptor: Descriptor,
        location: impl Into<String>,
        tenant: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                descriptor,
                location: location.into(),
                tenant: tenant.into(),
                transport,
            }),
        }
    }

    /// Builds a collection from a fetched service description: the descriptor fields plus
    /// `location` and `tenant`.
    pub fn from_service(
        service: Value,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, CollectionError> {
        let location = service
            .get("location")
            .and_then(Value::as_str)
            .ok_or(CollectionError::MissingServiceField("location"))?
            .to_string();
        let tenant = service
            .get("tenant")
            .and_then(Value::as_str)
            .ok_or(CollectionError::MissingServiceField("tenant"))?
            .to_string();
        let descriptor =
            Descriptor::from_json(service).map_err(CollectionError::InvalidDescriptor)?;

        Ok(Self::with_shared_transport(
            descriptor, location, tenant, transport,
        ))
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.inner.descriptor
    }

    pub fn location(&self) -> &str {
        &self.inner.location
    }

    pub fn tenant(&self) -> &str {
        &self.inner.tenant
    }

    pub fn plural_name(&self) -> &str {
        &self.inner.descriptor.plural_name
    }

    pub fn batch_size(&self) -> usize {
        self.inner.descriptor.batch_size()
    }

    /// Finds the relationship pointing at `resource_type`.
    pub fn relationship_for(
        &self,
        resource_type: &str,
    ) -> Result<(&str, &Relationship), RelationshipError> {
        self.inner.descriptor.relationship_for(resource_type)
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    /// Creates a new, unsaved resource.
    ///
    /// The owner defaults to the tenant, and the ref to `<owner>:<name>` when absent.
    pub fn new_resource(&self, data: Value) -> Resource {
        let mut data = match data {
            Value::Object(data) => data,
            _ => Map::new(),
        };

        let owner_missing = data.get("owner").is_none_or(Value::is_null);
        if owner_missing {
            data.insert("owner".to_string(), Value::String(self.tenant().to_string()));
        }

        let ref_missing = data.get("ref").is_none_or(Value::is_null);
        if ref_missing
            && let (Some(owner), Some(name)) = (
                data.get("owner").and_then(Value::as_str),
                data.get("name").and_then(Value::as_str),
            )
        {
            let reference = format!("{owner}:{name}");
            data.insert("ref".to_string(), Value::String(reference));
        }

        Resource::bound(data, self.clone()).mark_new()
    }

    /// Wraps existing data into a resource bound to this collection.
    pub fn resource(&self, data: Value) -> Resource {
        match data {
            Value::Object(data) => Resource::bound(data, self.clone()),
            _ => Resource::bound(Map::new(), self.clone()),
        }
    }

    /// Wraps a raw payload into a set bound to this collection.
    pub fn resource_set(&self, raw_data: Value) -> ResourceSet {
        ResourceSet::new(raw_data, Some(self.clone()))
    }

    /// Builds a set of new resources from plain data, e.g. before a batched store.
    pub fn new_resource_set(&self, items: Vec<Value>) -> ResourceSet {
        let resources = items
            .into_iter()
            .map(|item| self.new_resource(item))
            .collect();
        ResourceSet::from_resources(resources, Some(self.clone()))
    }

    fn url(&self, refs: Option<&str>, criteria: &Criteria) -> String {
        let mut url = format!(
            "{}/{}",
            self.location().trim_end_matches('/'),
            self.descriptor().url_segment()
        );
        if let Some(refs) = refs {
            url.push('/');
            url.push_str(refs);
        }
        url.push_str("?owner=");
        url.push_str(&encode(self.tenant()));
        if !criteria.is_empty() {
            url.push('&');
            url.push_str(criteria.as_str());
        }
        url
    }

    /// Turns a single-resource response into a resource, attaching the whole `linked` bucket.
    fn unwrap_one(&self, response: Value, reference: &str) -> Result<Resource, CollectionError> {
        let data = response
            .get(self.plural_name())
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| CollectionError::NotFound(reference.to_string()))?;

        let mut resource = Resource::bound(data, self.clone());

        if let Some(linked) = response.get(LINKED).and_then(Value::as_object) {
            for (relationship, items) in linked {
                if let Some(items) = items.as_array() {
                    resource.set_linked(relationship.clone(), items.clone());
                }
            }
        }

        Ok(resource)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("resource_type", &self.plural_name())
            .field("location", &self.location())
            .field("tenant", &self.tenant())
            .finish()
    }
}
