use colored::*;
use restgraph_core::config::ClientConfig;
use restgraph_core::descriptor::RelationshipKind;
use restgraph_core::{
    BatchError, CollectionError, Descriptor, FieldValidation, Resource, ResourceError, ResourceSet,
    ResourceSetError,
};
use serde_json::Value;
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

/// A page (or accumulation of pages) with a one-line summary.
pub struct Page(pub ResourceSet);

pub struct ValidationReport(pub Vec<FieldValidation>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<Value> for FormattedString {
    fn from(value: Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<Resource> for FormattedString {
    fn from(resource: Resource) -> Self {
        let mut data = resource.data().clone();
        if !resource.linked_all().is_empty() {
            let linked = resource
                .linked_all()
                .iter()
                .map(|(name, items)| (name.clone(), Value::Array(items.clone())))
                .collect();
            data.insert("linked".to_string(), Value::Object(linked));
        }
        FormattedString::from(Value::Object(data))
    }
}

impl From<Page> for FormattedString {
    fn from(Page(set): Page) -> Self {
        let items: Vec<Value> = set.iter().map(|r| Value::Object(r.data().clone())).collect();
        let body = FormattedString::from(Value::Array(items)).0;

        let mut summary = format!("{} of {} resource(s)", set.len(), set.total_count());
        if let Some(page) = set.page() {
            summary.push_str(&format!(", page {page}"));
        }
        if set.has_next_page() {
            summary.push_str(", more available");
        }

        FormattedString(format!("{body}\n\n{}", summary.dimmed()))
    }
}

impl From<ValidationReport> for FormattedString {
    fn from(ValidationReport(errors): ValidationReport) -> Self {
        if errors.is_empty() {
            return FormattedString("Valid.".green().to_string());
        }

        let mut out = format!("{}\n", "Validation Failed:".red().bold());
        for error in errors {
            out.push_str(&format!(
                "  - {} [{}] {}\n",
                error.field.yellow(),
                error.code.to_string().red(),
                error.message
            ));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<&Descriptor> for FormattedString {
    fn from(descriptor: &Descriptor) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} ({}) {{\n",
            "resource".cyan(),
            descriptor.plural_name.green(),
            descriptor.singular_name
        ));

        for (name, field) in &descriptor.fields {
            let mut flags = Vec::new();
            if field.required {
                flags.push("required");
            }
            if field.read_only {
                flags.push("read-only");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            out.push_str(&format!(
                "  {}: {}{}\n",
                name,
                field.kind.as_deref().unwrap_or("any").yellow(),
                flags.purple()
            ));
        }

        if !descriptor.relationships.is_empty() {
            out.push('\n');
        }
        for (name, relationship) in &descriptor.relationships {
            let kind = match relationship.kind {
                RelationshipKind::Direct => "direct",
                RelationshipKind::Indirect => "indirect",
            };
            let through = relationship
                .through
                .as_deref()
                .map(|through| format!(" through {through}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {} {} -> {}{}\n",
                kind.cyan(),
                name.green(),
                relationship.resource_type.yellow(),
                through
            ));
        }

        out.push_str(&format!(
            "\n  {} {}\n}}",
            "batch size".cyan(),
            descriptor.batch_size()
        ));
        FormattedString(out)
    }
}

impl From<ClientConfig> for FormattedString {
    fn from(config: ClientConfig) -> Self {
        let headers: Vec<String> = config.headers.iter().map(|(k, _)| k.clone()).collect();
        FormattedString(format!(
            "{} {}\n{} {}\n{} {}\n{} {}",
            "location:".cyan(),
            config.location.as_deref().unwrap_or("-"),
            "tenant:".cyan(),
            config.tenant.as_deref().unwrap_or("-"),
            "headers:".cyan(),
            if headers.is_empty() {
                "-".to_string()
            } else {
                headers.join(", ")
            },
            "timeout:".cyan(),
            config
                .timeout_secs
                .map(|secs| format!("{secs}s"))
                .unwrap_or_else(|| "-".to_string()),
        ))
    }
}

impl From<CollectionError> for FormattedString {
    fn from(err: CollectionError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Request Failed:".red().bold(), err))
    }
}

impl From<ResourceError> for FormattedString {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Invalid(errors) => FormattedString::from(ValidationReport(errors)),
            err => FormattedString(format!("{}\n\n'{}'", "Resource Error:".red().bold(), err)),
        }
    }
}

impl From<ResourceSetError> for FormattedString {
    fn from(err: ResourceSetError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Request Failed:".red().bold(), err))
    }
}

impl From<BatchError> for FormattedString {
    fn from(err: BatchError) -> Self {
        let refs: Vec<&str> = err.batch().iter().filter_map(Resource::reference).collect();
        FormattedString(format!(
            "{}\n\n'{}'\n\nrefs: {}",
            "Batch Failed:".red().bold(),
            err,
            refs.join(", ")
        ))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        FormattedString(format!("{}\n\n'{:#}'", "Error:".red().bold(), err))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}
