//! # Session
//!
//! Resolves the collection a command runs against: stored configuration overlaid with the CLI
//! flags, and a descriptor read from a file or from the descriptor cache.
use crate::cli::Target;
use anyhow::{Context, bail};
use restgraph_core::config::{ClientConfig, ConfigManager};
use restgraph_core::{Collection, Descriptor, DescriptorCache, HttpTransport};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// The stored configuration with the CLI overrides applied.
pub fn config(manager: &ConfigManager, target: &Target) -> anyhow::Result<ClientConfig> {
    Ok(manager.load()?.merge(target.overrides()))
}

pub fn open(target: &Target) -> anyhow::Result<Collection> {
    let manager = ConfigManager::new()?;
    let mut config = config(&manager, target)?;

    let descriptor = match &target.descriptor {
        Some(path) => {
            let raw = read_json(path)?;
            // A service description also tells where the service lives.
            if config.location.is_none() {
                config.location = string_field(&raw, "location");
            }
            if config.tenant.is_none() {
                config.tenant = string_field(&raw, "tenant");
            }
            Descriptor::from_json(raw)
                .with_context(|| format!("Invalid descriptor in '{}'", path.display()))?
        }
        None => cached_descriptor(&manager, target, &config)?,
    };

    let Some(location) = config.location.clone() else {
        bail!("No service location: pass --location or run `restgraph config set --location <url>`");
    };
    let Some(tenant) = config.tenant.clone() else {
        bail!("No tenant: pass --tenant or run `restgraph config set --tenant <tenant>`");
    };

    if target.descriptor.is_some()
        && let Some(service) = &target.service
    {
        let path = manager.descriptor_cache_path();
        let mut cache = DescriptorCache::load(&path)?;
        cache.insert(service, &tenant, descriptor.clone());
        cache.save(&path)?;
        tracing::debug!(%service, %tenant, "cached descriptor");
    }

    let transport = HttpTransport::from_config(&config);

    Ok(Collection::new(descriptor, location, tenant, transport))
}

fn cached_descriptor(
    manager: &ConfigManager,
    target: &Target,
    config: &ClientConfig,
) -> anyhow::Result<Descriptor> {
    let Some(service) = &target.service else {
        bail!("No descriptor: pass --descriptor <file> or --service <name> for a cached one");
    };
    let Some(tenant) = &config.tenant else {
        bail!("Cached descriptors are per tenant: pass --tenant");
    };

    let cache = DescriptorCache::load(&manager.descriptor_cache_path())?;
    cache
        .get(service, tenant)
        .cloned()
        .with_context(|| format!("No cached descriptor for service '{service}' of tenant '{tenant}'"))
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("'{}' is not valid JSON", path.display()))
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}
