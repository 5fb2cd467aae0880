//! # Field validation
//!
//! Validation is a pure function of a field's descriptor and value. The checks run in a fixed
//! priority order and the first failing one wins:
//!
//! 1. The field is not declared: [`ValidationCode::NoField`].
//! 2. The value is unset: [`ValidationCode::RequiredField`] when required, valid otherwise.
//! 3. The field is read-only: always valid.
//! 4. An allowed-value mapping is declared and the value is not one of its values:
//!    [`ValidationCode::NotAllowed`].
//! 5. A pattern is declared and the value does not match it: [`ValidationCode::InvalidValue`].
//! 6. Map key/value rules are declared and any entry breaks them: [`ValidationCode::InvalidMap`],
//!    reporting every offending key.
use crate::descriptor::FieldDescriptor;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    None,
    NoField,
    RequiredField,
    NotAllowed,
    InvalidValue,
    InvalidMap,
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ValidationCode::None => "NONE",
            ValidationCode::NoField => "NO_FIELD",
            ValidationCode::RequiredField => "REQUIRED_FIELD",
            ValidationCode::NotAllowed => "NOT_ALLOWED",
            ValidationCode::InvalidValue => "INVALID_VALUE",
            ValidationCode::InvalidMap => "INVALID_MAP",
        };
        f.write_str(code)
    }
}

/// The outcome of validating one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    pub code: ValidationCode,
    pub field: String,
    pub message: String,
    pub type_info: Option<FieldDescriptor>,
    pub valid: bool,
}

impl FieldValidation {
    fn valid(field: &str, type_info: Option<&FieldDescriptor>) -> Self {
        Self {
            code: ValidationCode::None,
            field: field.to_string(),
            message: String::new(),
            type_info: type_info.cloned(),
            valid: true,
        }
    }

    fn invalid(
        code: ValidationCode,
        field: &str,
        message: String,
        type_info: Option<&FieldDescriptor>,
    ) -> Self {
        Self {
            code,
            field: field.to_string(),
            message,
            type_info: type_info.cloned(),
            valid: false,
        }
    }
}

impl fmt::Display for FieldValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "{}: valid", self.field)
        } else {
            write!(f, "{} [{}]: {}", self.field, self.code, self.message)
        }
    }
}

/// Validates `value` against the descriptor of field `name`.
pub fn validate_value(
    name: &str,
    value: Option<&Value>,
    descriptor: Option<&FieldDescriptor>,
) -> FieldValidation {
    let Some(rules) = descriptor else {
        return FieldValidation::invalid(
            ValidationCode::NoField,
            name,
            format!("Field '{name}' is not declared"),
            None,
        );
    };

    let value = match value {
        Some(value) if !value.is_null() => value,
        _ if rules.required => {
            return FieldValidation::invalid(
                ValidationCode::RequiredField,
                name,
                format!("Field '{name}' is required"),
                descriptor,
            );
        }
        _ => return FieldValidation::valid(name, descriptor),
    };

    if rules.read_only {
        return FieldValidation::valid(name, descriptor);
    }

    if let Some(allowed) = &rules.allowed
        && !allowed.values().any(|candidate| candidate == value)
    {
        let options: Vec<String> = allowed.values().map(Value::to_string).collect();
        return FieldValidation::invalid(
            ValidationCode::NotAllowed,
            name,
            format!(
                "Value {value} is not allowed for '{name}', expected one of: {}",
                options.join(", ")
            ),
            descriptor,
        );
    }

    if let Some(pattern) = &rules.pattern
        && let Some(regex) = compile(name, pattern)
        && !regex.is_match(&as_text(value))
    {
        return FieldValidation::invalid(
            ValidationCode::InvalidValue,
            name,
            format!("Value {value} of '{name}' does not match pattern '{pattern}'"),
            descriptor,
        );
    }

    if rules.keys.is_some() || rules.values.is_some() {
        let problems = map_problems(name, value, rules);
        if !problems.is_empty() {
            return FieldValidation::invalid(
                ValidationCode::InvalidMap,
                name,
                problems.join("; "),
                descriptor,
            );
        }
    }

    FieldValidation::valid(name, descriptor)
}

fn map_problems(name: &str, value: &Value, rules: &FieldDescriptor) -> Vec<String> {
    let Some(entries) = value.as_object() else {
        return vec![format!("Field '{name}' must be a map")];
    };

    let key_regex = rules
        .keys
        .as_ref()
        .and_then(|keys| keys.pattern.as_deref())
        .and_then(|pattern| compile(name, pattern).map(|regex| (pattern, regex)));

    let allowed = rules.values.as_ref().and_then(|values| values.allowed.as_ref());

    let mut problems = Vec::new();

    for (key, entry) in entries {
        if let Some((pattern, regex)) = &key_regex
            && !regex.is_match(key)
        {
            problems.push(format!("Key '{key}' does not match pattern '{pattern}'"));
        }

        if let Some(allowed) = allowed
            && !allowed.values().any(|candidate| candidate == entry)
        {
            problems.push(format!("Value {entry} of key '{key}' is not allowed"));
        }
    }

    problems
}

fn compile(field: &str, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(field, pattern, %err, "ignoring invalid pattern in descriptor");
            None
        }
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
