//! # Query builder
//!
//! [`Query`] accumulates `&`-joined fragments in call order. The sort directive is kept apart and
//! rendered last, so `order_by`, `asc` and `desc` may be called at any point of the chain.
//!
//! ```
//! use restgraph_core::{Query, field};
//!
//! let query = Query::new()
//!     .order_by("name")
//!     .desc()
//!     .and(field("status").equal_to("live"))
//!     .per_page(50)
//!     .include(["assets"]);
//!
//! assert_eq!(
//!     query.to_query_string(),
//!     "withStatus=live&perPage=50&include=assets&sort=-name"
//! );
//! ```
use super::{Criteria, encode, through};
use crate::descriptor::Relationship;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    fragments: Vec<String>,
    sort: Option<String>,
    direction: Direction,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw fragment, usually produced by a [`Predicate`](super::Predicate).
    pub fn and(mut self, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        if !fragment.is_empty() {
            self.fragments.push(fragment);
        }
        self
    }

    /// Asks the service to include the total count in the response metadata.
    pub fn count(self) -> Self {
        self.and("count=true")
    }

    /// Asks the service for continuation-style pagination.
    pub fn continue_(self) -> Self {
        self.and("continue=true")
    }

    /// Requests the given relationships to be side-loaded into `linked`.
    pub fn include<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.and(format!("include={}", join_names(names)))
    }

    /// Restricts the returned fields.
    pub fn fields<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.and(format!("fields={}", join_names(names)))
    }

    pub fn per_page(self, per_page: usize) -> Self {
        self.and(format!("perPage={per_page}"))
    }

    pub fn page(self, page: usize) -> Self {
        self.and(format!("page={page}"))
    }

    pub fn lang(self, code: &str) -> Self {
        self.and(format!("lang={}", encode(code)))
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(field.into());
        self
    }

    pub fn asc(mut self) -> Self {
        self.direction = Direction::Asc;
        self
    }

    pub fn desc(mut self) -> Self {
        self.direction = Direction::Desc;
        self
    }

    pub fn order_by_owner(self) -> Self {
        self.order_by("owner")
    }

    pub fn order_by_name(self) -> Self {
        self.order_by("name")
    }

    pub fn order_by_created_at(self) -> Self {
        self.order_by("createdAt")
    }

    pub fn order_by_created_by(self) -> Self {
        self.order_by("createdBy")
    }

    pub fn order_by_updated_at(self) -> Self {
        self.order_by("updatedAt")
    }

    pub fn order_by_updated_by(self) -> Self {
        self.order_by("updatedBy")
    }

    /// Renders the fragments in call order, with the sort directive last.
    pub fn to_query_string(&self) -> String {
        let sort = self.sort.as_ref().map(|field| match self.direction {
            Direction::Asc => format!("sort={}", encode(field)),
            Direction::Desc => format!("sort=-{}", encode(field)),
        });

        self.fragments
            .iter()
            .cloned()
            .chain(sort)
            .collect::<Vec<_>>()
            .join("&")
    }

    /// See [`through::add_related_through_fields`].
    pub fn add_related_through_fields(
        &self,
        relationships: &BTreeMap<String, Relationship>,
        all_fields: &[String],
    ) -> Criteria {
        Criteria::new(through::add_related_through_fields(
            &self.to_query_string(),
            relationships,
            all_fields,
        ))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn join_names<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| encode(name.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}
