//! # Through-field augmentation
//!
//! A through-relationship can only be resolved when the parent resources carry the foreign keys
//! of the relationship they go through. When such a relationship is included, the query must
//! therefore also request that foreign-key field.
//!
//! Omitting `fields` means "all fields", so when no explicit list is present the full field set
//! is spelled out before the foreign key is added.
//!
//! Lists are re-rendered as comma-joined values (`fields=a,b`). Indexed array keys such as
//! `include[0]=a` are folded into the same form, since the service does not understand them.
use super::{decode, encode, split_params};
use crate::descriptor::Relationship;
use std::collections::BTreeMap;

const INCLUDE: &str = "include";
const FIELDS: &str = "fields";
const SORT: &str = "sort";

/// Rewrites `query` so that every included through-relationship gets its foreign-key field
/// requested. Returns the query untouched when no included relationship goes through another.
pub fn add_related_through_fields(
    query: &str,
    relationships: &BTreeMap<String, Relationship>,
    all_fields: &[String],
) -> String {
    let params = split_params(query);

    let includes = collect_list(&params, INCLUDE);

    let through_fields: Vec<&str> = includes
        .iter()
        .filter_map(|name| relationships.get(name))
        .filter_map(|relationship| relationship.through.as_deref())
        .filter_map(|through| relationships.get(through))
        .filter_map(|target| target.field_name_path.as_deref())
        .collect();

    if through_fields.is_empty() {
        return query.to_string();
    }

    let mut fields = collect_list(&params, FIELDS);
    if fields.is_empty() {
        fields = all_fields.to_vec();
    }
    for field in through_fields {
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }

    let mut rendered = Vec::with_capacity(params.len() + 1);
    let mut include_written = false;
    let mut fields_written = false;

    for (key, value) in &params {
        match base_key(key) {
            INCLUDE => {
                if !include_written {
                    rendered.push(render_list(INCLUDE, &includes));
                    include_written = true;
                }
            }
            FIELDS => {
                if !fields_written {
                    rendered.push(render_list(FIELDS, &fields));
                    fields_written = true;
                }
            }
            _ => rendered.push(format!("{key}={value}")),
        }
    }

    if !fields_written {
        let fields_param = render_list(FIELDS, &fields);
        match rendered.iter().position(|p| p.starts_with("sort=")) {
            Some(index) => rendered.insert(index, fields_param),
            None => rendered.push(fields_param),
        }
    }

    rendered.join("&")
}

/// `include[]` and `include[3]` both name the `include` list.
fn base_key(key: &str) -> &str {
    match key.find('[') {
        Some(index) => &key[..index],
        None => key,
    }
}

fn collect_list(params: &[(String, String)], name: &str) -> Vec<String> {
    params
        .iter()
        .filter(|(key, _)| base_key(key) == name)
        .flat_map(|(_, value)| {
            decode(value)
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn render_list(name: &str, items: &[String]) -> String {
    let joined = items
        .iter()
        .map(|item| encode(item))
        .collect::<Vec<_>>()
        .join(",");
    format!("{name}={joined}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::RelationshipKind;

    fn relationships() -> BTreeMap<String, Relationship> {
        let mut map = BTreeMap::new();
        map.insert(
            "variants".to_string(),
            Relationship {
                kind: RelationshipKind::Direct,
                resource_type: "variants".to_string(),
                field_name_path: Some("variantRefs".to_string()),
                filter_name: Some("variantRef".to_string()),
                through: None,
                fields: None,
            },
        );
        map.insert(
            "assets".to_string(),
            Relationship {
                kind: RelationshipKind::Indirect,
                resource_type: "assets".to_string(),
                field_name_path: Some("contentRef".to_string()),
                filter_name: None,
                through: Some("variants".to_string()),
                fields: None,
            },
        );
        map
    }

    fn all_fields() -> Vec<String> {
        vec!["ref".to_string(), "name".to_string()]
    }

    #[test]
    fn test_defaults_fields_to_all_fields() {
        let query = add_related_through_fields("include=assets", &relationships(), &all_fields());
        assert_eq!(query, "include=assets&fields=ref,name,variantRefs");
    }

    #[test]
    fn test_appends_to_existing_fields() {
        let query = add_related_through_fields(
            "fields=name&include=assets&sort=name",
            &relationships(),
            &all_fields(),
        );
        assert_eq!(query, "fields=name,variantRefs&include=assets&sort=name");
    }

    #[test]
    fn test_inserts_fields_before_sort() {
        let query = add_related_through_fields(
            "include=assets&sort=-name",
            &relationships(),
            &all_fields(),
        );
        assert_eq!(query, "include=assets&fields=ref,name,variantRefs&sort=-name");
    }

    #[test]
    fn test_unchanged_without_through() {
        let query = "include[0]=variants&withName=foo*";
        assert_eq!(
            add_related_through_fields(query, &relationships(), &all_fields()),
            query
        );
    }

    #[test]
    fn test_folds_indexed_arrays() {
        let query = add_related_through_fields(
            "include[0]=variants&include[1]=assets&fields[0]=name",
            &relationships(),
            &all_fields(),
        );
        assert_eq!(query, "include=variants,assets&fields=name,variantRefs");
    }
}
