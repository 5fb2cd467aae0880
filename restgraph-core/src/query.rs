//! # Query strings
//!
//! This module contains the string-producing builders used to express criteria for remote reads.
//!
//! * [`predicate`]: single-field comparison fragments (`withName=foo*`).
//! * [`builder`]: the [`Query`] accumulator for predicates, pagination, sorting, includes and
//!   field lists.
//! * [`through`]: the rewrite injecting the extra fields that through-relationships need.
//!
//! Anywhere the library accepts "criteria" it takes `impl Into<Criteria>`, so a [`Query`] and a
//! plain string fragment can be used interchangeably.
pub mod builder;
pub mod predicate;
pub mod through;

pub use builder::Query;
pub use predicate::{Predicate, field};
pub use through::add_related_through_fields;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::fmt;

/// Characters left untouched when encoding a query component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn encode(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

pub(crate) fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// A rendered query string fragment, without the leading `?`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Criteria(String);

impl Criteria {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let trimmed = query.trim_start_matches(['?', '&']);
        Self(trimmed.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Criteria {
    fn from(value: &str) -> Self {
        Criteria::new(value)
    }
}

impl From<String> for Criteria {
    fn from(value: String) -> Self {
        Criteria::new(value)
    }
}

impl From<&String> for Criteria {
    fn from(value: &String) -> Self {
        Criteria::new(value.as_str())
    }
}

impl From<Query> for Criteria {
    fn from(value: Query) -> Self {
        Criteria::new(value.to_query_string())
    }
}

impl From<&Query> for Criteria {
    fn from(value: &Query) -> Self {
        Criteria::new(value.to_query_string())
    }
}

impl From<Option<Criteria>> for Criteria {
    fn from(value: Option<Criteria>) -> Self {
        value.unwrap_or_default()
    }
}

/// Splits a query string into `(key, raw_value)` pairs, keeping the order and the encoding.
pub(crate) fn split_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (decode(key), value.to_string()),
            None => (decode(segment), String::new()),
        })
        .collect()
}
