//! # Restgraph CLI Entry Point
//!
//! The main executable for the Restgraph tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the log
//!    subscriber (`RUST_LOG`, `warn` by default).
//! 2. **Resolution**: Builds the target collection from the stored configuration, the CLI flags
//!    and a descriptor file or cached descriptor.
//! 3. **Execution**: Delegates the request to `restgraph_core`.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.

mod cli;
mod formatter;
mod session;

use clap::Parser;
use cli::{Cli, Commands, ConfigCommands, Target};
use formatter::{FormattedString, GenericError, Page, ValidationReport};
use restgraph_core::config::ConfigManager;
use restgraph_core::{Collection, DescriptorCache, Query, RequestOptions, ResourceError};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Browse { query, page, all } => browse(&args.target, query, page, all).await,
        Commands::Read { refs, query } => read(&args.target, refs, query).await,
        Commands::Store { body, batch_size } => store(&args.target, body, batch_size).await,
        Commands::Update { body } => update(&args.target, body).await,
        Commands::Destroy { refs } => destroy(&args.target, refs).await,
        Commands::Validate { body } => validate(&args.target, body),
        Commands::Describe => {
            let collection = open_or_exit(&args.target);
            println!("{}", FormattedString::from(collection.descriptor()));
        }
        Commands::Config { sub } => match sub {
            ConfigCommands::Show => show_config(&args.target),
            ConfigCommands::Set => set_config(&args.target),
            ConfigCommands::ClearCache => clear_cache(&args.target),
        },
    }
}

fn exit_with(message: impl Into<FormattedString>) -> ! {
    eprintln!("{}", message.into());
    process::exit(1);
}

fn open_or_exit(target: &Target) -> Collection {
    match session::open(target) {
        Ok(collection) => collection,
        Err(err) => exit_with(err),
    }
}

fn config_manager_or_exit() -> ConfigManager {
    match ConfigManager::new() {
        Ok(manager) => manager,
        Err(err) => exit_with(GenericError("Failed to open configuration", err)),
    }
}

async fn browse(target: &Target, query: String, page: Option<usize>, all: bool) {
    let collection = open_or_exit(target);

    let mut criteria = Query::new().and(query);
    if let Some(page) = page {
        criteria = criteria.page(page);
    }

    let result = if all {
        collection.all(criteria, RequestOptions::default()).await
    } else {
        collection.browse(criteria, RequestOptions::default()).await
    };

    match result {
        Ok(set) => println!("{}", FormattedString::from(Page(set))),
        Err(err) => exit_with(err),
    }
}

async fn read(target: &Target, refs: Vec<String>, query: String) {
    let collection = open_or_exit(target);

    if let [reference] = refs.as_slice() {
        match collection
            .read_one(reference, query, RequestOptions::default())
            .await
        {
            Ok(resource) => println!("{}", FormattedString::from(resource)),
            Err(err) => exit_with(err),
        }
        return;
    }

    let refs: Vec<&str> = refs.iter().map(String::as_str).collect();
    match collection
        .read_many(&refs, query, RequestOptions::default())
        .await
    {
        Ok(set) => println!("{}", FormattedString::from(Page(set))),
        Err(err) => exit_with(err),
    }
}

async fn store(target: &Target, body: serde_json::Value, batch_size: Option<usize>) {
    let collection = open_or_exit(target);

    let items = match body {
        serde_json::Value::Array(items) => items,
        body => {
            let mut resource = collection.new_resource(body);
            match resource.save().await {
                Ok(saved) => println!("{}", FormattedString::from(saved)),
                Err(err) => exit_with(err),
            }
            return;
        }
    };

    let outcomes = match collection.new_resource_set(items).save(batch_size).await {
        Ok(outcomes) => outcomes,
        Err(err) => exit_with(err),
    };

    let mut failed = false;
    for outcome in outcomes {
        match outcome {
            Ok(stored) => println!("{}", FormattedString::from(Page(stored))),
            Err(err) => {
                failed = true;
                eprintln!("{}", FormattedString::from(err));
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

async fn update(target: &Target, body: serde_json::Value) {
    let collection = open_or_exit(target);

    let mut resource = collection.resource(body);
    match resource.save().await {
        Ok(saved) => println!("{}", FormattedString::from(saved)),
        Err(err) => exit_with(err),
    }
}

async fn destroy(target: &Target, refs: Vec<String>) {
    let collection = open_or_exit(target);

    let refs: Vec<&str> = refs.iter().map(String::as_str).collect();
    match collection.destroy_refs(&refs).await {
        Ok(response) => println!("{}", FormattedString::from(response)),
        Err(err) => exit_with(err),
    }
}

fn validate(target: &Target, body: serde_json::Value) {
    let collection = open_or_exit(target);

    let mut resource = collection.new_resource(body);
    match resource.validate() {
        Ok(()) => println!("{}", FormattedString::from(ValidationReport(vec![]))),
        Err(ResourceError::Invalid(errors)) => exit_with(ValidationReport(errors)),
        Err(err) => exit_with(err),
    }
}

fn show_config(target: &Target) {
    let manager = config_manager_or_exit();
    match session::config(&manager, target) {
        Ok(config) => println!("{}", FormattedString::from(config)),
        Err(err) => exit_with(err),
    }
}

fn set_config(target: &Target) {
    let manager = config_manager_or_exit();
    let config = match session::config(&manager, target) {
        Ok(config) => config,
        Err(err) => exit_with(err),
    };

    if let Err(err) = manager.save(&config) {
        exit_with(GenericError("Failed to save configuration", err));
    }
    println!(
        "{}",
        FormattedString(format!("Saved to {}", manager.path().display()))
    );
}

fn clear_cache(target: &Target) {
    let manager = config_manager_or_exit();
    let path = manager.descriptor_cache_path();

    let mut cache = match DescriptorCache::load(&path) {
        Ok(cache) => cache,
        Err(err) => exit_with(GenericError("Failed to read descriptor cache", err)),
    };

    match &target.tenant {
        Some(tenant) => cache.invalidate_tenant(tenant),
        None => cache.clear(),
    }

    if let Err(err) = cache.save(&path) {
        exit_with(GenericError("Failed to write descriptor cache", err));
    }
    println!("{}", FormattedString("Descriptor cache cleared.".to_string()));
}
