//! Remote reads: browsing, page accumulation and lookups by ref.
use super::{Collection, CollectionError, LINKED};
use crate::query::{Criteria, add_related_through_fields};
use crate::resource::Resource;
use crate::resource_set::ResourceSet;
use crate::resource_set::pagination::{continuation_criteria, page_key};
use crate::transport::RequestOptions;
use serde_json::{Map, Value};
use std::collections::HashSet;

const META: &str = "meta";

impl Collection {
    /// Adds the foreign-key fields needed by included through-relationships.
    fn augment(&self, criteria: &Criteria) -> Criteria {
        let descriptor = self.descriptor();
        Criteria::new(add_related_through_fields(
            criteria.as_str(),
            &descriptor.relationships,
            &descriptor.field_names(),
        ))
    }

    /// Fetches one page of resources matching `criteria`.
    pub async fn browse(
        &self,
        criteria: impl Into<Criteria>,
        options: RequestOptions,
    ) -> Result<ResourceSet, CollectionError> {
        let criteria = criteria.into();
        let url = self.url(None, &self.augment(&criteria));

        let response = self.transport().get(&url, &options).await?;

        Ok(ResourceSet::new(response, Some(self.clone())).with_request(criteria, options))
    }

    /// Fetches every page matching `criteria` and returns them as a single set.
    ///
    /// Pages are fetched one after the other following the `next` links. Their resources and
    /// `linked` buckets are concatenated before the set is built, so linked items are matched
    /// against the resources of every page, not only the page they arrived with.
    pub async fn all(
        &self,
        criteria: impl Into<Criteria>,
        options: RequestOptions,
    ) -> Result<ResourceSet, CollectionError> {
        let criteria = criteria.into();

        let mut current = self.browse(criteria.clone(), options.clone()).await?;
        let mut accumulated = current.raw_data().clone();
        let mut visited = HashSet::from([page_key(&criteria)]);
        let mut pages = 1;

        while let Some(link) = current.next_link().map(str::to_string) {
            let next = continuation_criteria(&link);
            if !visited.insert(page_key(&next)) {
                tracing::warn!(link = %link, "pagination loops back to a visited page, stopping");
                break;
            }

            current = self.browse(next, options.clone()).await?;
            merge_page(&mut accumulated, current.raw_data(), self.plural_name());

            pages += 1;
            tracing::debug!(
                resource_type = self.plural_name(),
                pages,
                "accumulated page"
            );
        }

        Ok(ResourceSet::new(accumulated, Some(self.clone())).with_request(criteria, options))
    }

    /// Fetches a single resource by ref.
    ///
    /// The response's `linked` buckets are attached to the resource as they are.
    pub async fn read_one(
        &self,
        reference: &str,
        criteria: impl Into<Criteria>,
        options: RequestOptions,
    ) -> Result<Resource, CollectionError> {
        let criteria = criteria.into();
        let url = self.url(Some(reference), &self.augment(&criteria));

        let response = self.transport().get(&url, &options).await?;

        self.unwrap_one(response, reference)
    }

    /// Fetches several resources by ref, in a single request.
    pub async fn read_many(
        &self,
        references: &[&str],
        criteria: impl Into<Criteria>,
        options: RequestOptions,
    ) -> Result<ResourceSet, CollectionError> {
        let criteria = criteria.into();
        let refs = references.join(",");
        let url = self.url(Some(&refs), &self.augment(&criteria));

        let response = self.transport().get(&url, &options).await?;

        Ok(ResourceSet::new(response, Some(self.clone())).with_request(criteria, options))
    }
}

/// Appends the resources and linked buckets of `page` to `accumulated`, and takes its metadata.
fn merge_page(accumulated: &mut Value, page: &Value, plural_name: &str) {
    let Some(accumulated) = accumulated.as_object_mut() else {
        return;
    };

    if let Some(items) = page.get(plural_name).and_then(Value::as_array) {
        append(accumulated, plural_name, items);
    }

    if let Some(linked) = page.get(LINKED).and_then(Value::as_object) {
        let target = accumulated
            .entry(LINKED)
            .or_insert_with(|| Value::Object(Map::new()));
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Some(target) = target.as_object_mut() {
            for (relationship, items) in linked {
                if let Some(items) = items.as_array() {
                    append(target, relationship, items);
                }
            }
        }
    }

    if let Some(meta) = page.get(META) {
        accumulated.insert(META.to_string(), meta.clone());
    }
}

fn append(target: &mut Map<String, Value>, key: &str, items: &[Value]) {
    let entry = target
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()));
    match entry {
        Value::Array(existing) => existing.extend(items.iter().cloned()),
        other => *other = Value::Array(items.to_vec()),
    }
}
