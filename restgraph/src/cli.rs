//! # CLI
//!
//! This module defines the command-line interface of `restgraph` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring headers are
//! `key:value` and bodies are valid JSON).
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use restgraph_core::config::ClientConfig;

#[derive(Parser)]
#[command(name = "restgraph", version, about = "Descriptor-driven REST resource CLI")]
pub struct Cli {
    #[command(flatten)]
    pub target: Target,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the resources live and how to reach them. Overrides the stored configuration.
#[derive(Args)]
pub struct Target {
    /// Path to a descriptor file, or to a service description carrying `location` and `tenant`
    #[arg(long, global = true)]
    pub descriptor: Option<PathBuf>,

    /// Name of the service in the descriptor cache.
    /// Used to look the descriptor up when `--descriptor` is omitted, and to cache it otherwise.
    #[arg(long, global = true)]
    pub service: Option<String>,

    /// Base URL of the service (e.g. https://api.example.com/content)
    #[arg(long, global = true)]
    pub location: Option<String>,

    /// Owner of the resources
    #[arg(long, global = true)]
    pub tenant: Option<String>,

    #[arg(short = 'H', long = "header", global = true, value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl Target {
    pub fn overrides(&self) -> ClientConfig {
        ClientConfig {
            location: self.location.clone(),
            tenant: self.tenant.clone(),
            headers: self.headers.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse a collection
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// restgraph --descriptor contents.json browse --query 'withStatus=live&perPage=20' --all
    /// ```
    Browse {
        /// Raw query string (e.g. 'withName=intro*&include=assets')
        #[arg(short, long, default_value = "")]
        query: String,

        /// Fetch a specific page
        #[arg(long, conflicts_with = "all")]
        page: Option<usize>,

        /// Follow the pagination links and return every page at once
        #[arg(long)]
        all: bool,
    },

    /// Read one or more resources by ref
    Read {
        #[arg(required = true)]
        refs: Vec<String>,

        /// Raw query string (e.g. 'include=assets')
        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// Create resources. An array body is stored in batches
    Store {
        /// JSON body (Object for one resource, Array for a batch)
        #[arg(long, value_parser = parse_body)]
        body: serde_json::Value,

        /// Resources per request, defaults to the descriptor's limit
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Replace an existing resource
    Update {
        /// JSON body of the resource, including its `ref`
        #[arg(long, value_parser = parse_body)]
        body: serde_json::Value,
    },

    /// Delete resources by ref
    Destroy {
        #[arg(required = true)]
        refs: Vec<String>,
    },

    /// Validate a resource against the descriptor without sending it
    Validate {
        #[arg(long, value_parser = parse_body)]
        body: serde_json::Value,
    },

    /// Describe the resource type (fields and relationships)
    Describe,

    /// Manage the stored configuration
    Config {
        #[command(subcommand)]
        sub: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the stored configuration
    Show,
    /// Persist the given --location, --tenant, --timeout and -H values
    Set,
    /// Drop cached descriptors, only those of --tenant when given
    ClearCache,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "Format must be 'key:value'".to_string())
}

fn parse_body(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))
}
