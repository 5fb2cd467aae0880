//! # Restgraph Core
//!
//! `restgraph-core` is the foundational library powering the Restgraph CLI. It turns a generic,
//! descriptor-driven REST protocol into a typed, navigable object graph without compile-time
//! knowledge of the resources' shape.
//!
//! ## Key Components
//!
//! * **[`Collection`]:** The main entry point. A descriptor-bound endpoint that performs remote
//!   CRUD, builds resources from responses and accumulates pages.
//! * **[`Resource`]:** A single record. Supports descriptor-driven validation, relationship linking,
//!   serialization and persistence through its owning collection.
//! * **[`ResourceSet`]:** A page (or an accumulation of pages) of resources. Re-partitions the
//!   shared `linked` payload per resource, walks pagination links and splits itself into batches.
//! * **[`Query`] & [`field`]:** Builders producing the query strings understood by the service.
//!
//! ## Transport
//!
//! All I/O goes through the [`Transport`] trait. [`HttpTransport`] is the `reqwest` backed
//! implementation used by default; tests and embedders can plug in their own.
//!
//! ## Re-exports
//!
//! This crate re-exports `serde_json` and `reqwest` to ensure that consumers use compatible
//! versions of these underlying dependencies.
pub mod collection;
pub mod config;
pub mod descriptor;
pub mod query;
pub mod resource;
pub mod resource_set;
pub mod transport;

pub use collection::{Collection, CollectionError};
pub use descriptor::{Descriptor, DescriptorCache, Relationship, RelationshipError};
pub use query::{Criteria, Predicate, Query, field};
pub use resource::{FieldValidation, LinkTarget, Resource, ResourceError, ValidationCode};
pub use resource_set::{BatchError, Matcher, ResourceSet, ResourceSetError};
pub use transport::{HttpTransport, RequestOptions, Transport, TransportError};

// Re-exports
pub use reqwest;
pub use serde_json;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
