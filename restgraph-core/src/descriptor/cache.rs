//! # Descriptor cache
//!
//! A flat map of descriptors keyed by service and tenant. Entries are never patched: a tenancy
//! switch or an explicit invalidation drops them wholesale so the next fetch supersedes them.
use super::Descriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to access descriptor cache '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to (de)serialize descriptor cache: {0}")]
    Json(#[from] serde_json::Error),
}

/// Descriptors by tenant, then by service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorCache {
    tenants: BTreeMap<String, BTreeMap<String, Descriptor>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service: &str, tenant: &str) -> Option<&Descriptor> {
        self.tenants.get(tenant)?.get(service)
    }

    pub fn insert(&mut self, service: &str, tenant: &str, descriptor: Descriptor) {
        self.tenants
            .entry(tenant.to_string())
            .or_default()
            .insert(service.to_string(), descriptor);
    }

    /// Drops every descriptor cached for `tenant`.
    pub fn invalidate_tenant(&mut self, tenant: &str) {
        self.tenants.remove(tenant);
    }

    pub fn clear(&mut self) {
        self.tenants.clear();
    }

    pub fn len(&self) -> usize {
        self.tenants.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads a cache file, returning an empty cache when it does not exist yet.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| CacheError::Io(path.to_path_buf(), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let content = serde_json::to_string(self)?;
        fs::write(path, content).map_err(|e| CacheError::Io(path.to_path_buf(), e))
    }
}
