//! Page traversal.
//!
//! Every move goes through [`ResourceSet::fetch`], which turns a continuation link from the
//! response metadata into criteria for [`Collection::browse`](crate::Collection::browse). The
//! running out of `next`/`prev` links is reported as [`ResourceSetError::NoNextPage`] and
//! [`ResourceSetError::NoPreviousPage`].
use super::{ResourceSet, ResourceSetError};
use crate::query::{Criteria, split_params};

const OWNER: &str = "owner";
const PAGE: &str = "page";

impl ResourceSet {
    fn link(&self, name: &str) -> Option<&str> {
        self.meta()
            .and_then(|meta| meta.get(name))
            .and_then(serde_json::Value::as_str)
            .filter(|link| !link.is_empty())
    }

    pub fn next_link(&self) -> Option<&str> {
        self.link("next")
    }

    pub fn previous_link(&self) -> Option<&str> {
        self.link("prev")
    }

    pub fn has_next_page(&self) -> bool {
        self.next_link().is_some()
    }

    pub fn has_previous_page(&self) -> bool {
        self.previous_link().is_some()
    }

    pub async fn next_page(&self) -> Result<ResourceSet, ResourceSetError> {
        let link = self.next_link().ok_or(ResourceSetError::NoNextPage)?;
        self.fetch(link).await
    }

    pub async fn previous_page(&self) -> Result<ResourceSet, ResourceSetError> {
        let link = self
            .previous_link()
            .ok_or(ResourceSetError::NoPreviousPage)?;
        self.fetch(link).await
    }

    pub async fn first_page(&self) -> Result<ResourceSet, ResourceSetError> {
        match self.link("first") {
            Some(link) => self.fetch(link).await,
            None => self.get_page(1).await,
        }
    }

    pub async fn last_page(&self) -> Result<ResourceSet, ResourceSetError> {
        if let Some(link) = self.link("last") {
            return self.fetch(link).await;
        }
        let per_page = self.per_page().filter(|n| *n > 0).unwrap_or(self.len().max(1));
        let last = self.total_count().div_ceil(per_page).max(1);
        self.get_page(last).await
    }

    /// Fetches page `page` of the query this set was fetched with.
    pub async fn get_page(&self, page: usize) -> Result<ResourceSet, ResourceSetError> {
        let mut fragments: Vec<String> = split_params(self.initial_criteria.as_str())
            .into_iter()
            .filter(|(key, _)| key != PAGE)
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        fragments.push(format!("{PAGE}={page}"));
        self.fetch(&fragments.join("&")).await
    }

    /// Browses the collection again with the given continuation link or query.
    pub async fn fetch(&self, criteria: &str) -> Result<ResourceSet, ResourceSetError> {
        let collection = self.collection.as_ref().ok_or(ResourceSetError::NoEndpoint)?;
        Ok(collection
            .browse(continuation_criteria(criteria), self.options.clone())
            .await?)
    }
}

/// Strips the path and the `owner` parameter from a continuation link; the collection adds the
/// owner back itself.
pub(crate) fn continuation_criteria(link: &str) -> Criteria {
    let query = match link.split_once('?') {
        Some((_, query)) => query,
        None if link.contains('=') => link,
        None => "",
    };

    let kept: Vec<String> = split_params(query)
        .into_iter()
        .filter(|(key, _)| key != OWNER)
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    Criteria::new(kept.join("&"))
}

/// Identifies the page a query asks for, whatever the parameter order. A query without `page`
/// asks for the first one.
pub(crate) fn page_key(criteria: &Criteria) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = split_params(criteria.as_str())
        .into_iter()
        .filter(|(key, _)| key != OWNER)
        .collect();
    if !params.iter().any(|(key, _)| key == PAGE) {
        params.push((PAGE.to_string(), "1".to_string()));
    }
    params.sort();
    params
}
