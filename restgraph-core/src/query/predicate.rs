//! # Field predicates
//!
//! A [`Predicate`] renders comparison expressions for a single field as query fragments of the
//! form `<param>=<expression>`. Field names are turned into the service's parameter convention
//! (`createdAt` becomes `withCreatedAt`); [`Predicate::raw`] keeps the name as is, for
//! parameters that are not resource fields.
//!
//! | Method                          | Expression |
//! |---------------------------------|------------|
//! | `equal_to(v)`                   | `v`        |
//! | `not_equal_to(v)`               | `!v`       |
//! | `one_or_more_of([v1, v2])`      | `v1\|\|v2` |
//! | `starts_with(v)`                | `v*`       |
//! | `exists()`                      | `*`        |
//! | `not_exists()`                  | `!*`       |
//! | `between(a, b)`                 | `a/b`      |
//! | `not_between(a, b)`             | `!a/b`     |
//! | `less_than(v)`                  | `!v/`      |
//! | `less_than_or_equal_to(v)`      | `/v`       |
//! | `greater_than(v)`               | `!/v`      |
//! | `greater_than_or_equal_to(v)`   | `v/`       |
//!
//! Values are percent-encoded; the operators are not.
use super::encode;
use convert_case::{Case, Casing};
use std::fmt::Display;

const FIELD_PREFIX: &str = "with";

/// Starts a predicate over a resource field.
///
/// ```
/// use restgraph_core::field;
///
/// assert_eq!(field("x").between(1, 5), "withX=1/5");
/// ```
pub fn field(name: &str) -> Predicate {
    Predicate::new(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    param: String,
}

impl Predicate {
    /// A predicate over a resource field, using the `with<Field>` parameter convention.
    pub fn new(field: &str) -> Self {
        Self {
            param: format!("{FIELD_PREFIX}{}", field.to_case(Case::Pascal)),
        }
    }

    /// A predicate over a parameter name used verbatim.
    pub fn raw(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    fn fragment(&self, expression: impl Display) -> String {
        format!("{}={}", self.param, expression)
    }

    pub fn equal_to(&self, value: impl Display) -> String {
        self.fragment(encode(&value.to_string()))
    }

    pub fn not_equal_to(&self, value: impl Display) -> String {
        self.fragment(format_args!("!{}", encode(&value.to_string())))
    }

    pub fn one_or_more_of<I>(&self, values: I) -> String
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let joined = values
            .into_iter()
            .map(|v| encode(&v.to_string()))
            .collect::<Vec<_>>()
            .join("||");
        self.fragment(joined)
    }

    pub fn starts_with(&self, value: impl Display) -> String {
        self.fragment(format_args!("{}*", encode(&value.to_string())))
    }

    pub fn exists(&self) -> String {
        self.fragment("*")
    }

    pub fn not_exists(&self) -> String {
        self.fragment("!*")
    }

    pub fn between(&self, from: impl Display, to: impl Display) -> String {
        self.fragment(format_args!(
            "{}/{}",
            encode(&from.to_string()),
            encode(&to.to_string())
        ))
    }

    pub fn not_between(&self, from: impl Display, to: impl Display) -> String {
        self.fragment(format_args!(
            "!{}/{}",
            encode(&from.to_string()),
            encode(&to.to_string())
        ))
    }

    pub fn less_than(&self, value: impl Display) -> String {
        self.fragment(format_args!("!{}/", encode(&value.to_string())))
    }

    pub fn less_than_or_equal_to(&self, value: impl Display) -> String {
        self.fragment(format_args!("/{}", encode(&value.to_string())))
    }

    pub fn greater_than(&self, value: impl Display) -> String {
        self.fragment(format_args!("!/{}", encode(&value.to_string())))
    }

    pub fn greater_than_or_equal_to(&self, value: impl Display) -> String {
        self.fragment(format_args!("{}/", encode(&value.to_string())))
    }
}
