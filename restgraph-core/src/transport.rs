//! # Transport
//!
//! The I/O seam of the library. Every remote operation performed by a
//! [`Collection`](crate::Collection) goes through a [`Transport`], which knows nothing about
//! resources, descriptors or pagination: it exchanges JSON documents with URLs.
//!
//! ## Contract
//!
//! * Non-2xx responses are rejected with [`TransportError::Status`], carrying the original body.
//! * A `204 No Content` response resolves to an empty JSON object instead of being parsed.
//! * Timeouts and retries, if any, are the transport's business. The core never retries.
pub mod client;

pub use client::HttpTransport;

use crate::BoxError;
use async_trait::async_trait;

/// Errors surfaced by a [`Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request to '{url}' failed with status {status}: {body}")]
    Status {
        url: String,
        status: http::StatusCode,
        body: serde_json::Value,
    },
    #[error("Failed to send request to '{0}': {1}")]
    Request(String, #[source] reqwest::Error),
    #[error("Failed to decode response body from '{0}': {1}")]
    Decode(String, #[source] serde_json::Error),
    #[error("Invalid header '{0}': {1}")]
    InvalidHeader(String, String),
    #[error(transparent)]
    Custom(BoxError),
}

impl TransportError {
    /// The HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Per-request options forwarded to the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Extra headers to attach to the request.
    pub headers: Vec<(String, String)>,
    /// JSON body for `post` and `put`.
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A JSON over HTTP transport.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError>;

    async fn post(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError>;

    async fn put(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError>;

    async fn destroy(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError>;
}
