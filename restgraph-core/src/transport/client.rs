//! # HTTP Transport
//!
//! A [`Transport`] implementation backed by `reqwest`.
//!
//! ## Features
//!
//! * **Default headers**: Headers given at construction (e.g. an authorization token obtained by
//!   the session layer) are attached to every request, before the per-request ones.
//! * **Status translation**: Non-2xx responses become [`TransportError::Status`] with the body
//!   decoded as JSON when possible, or kept as a JSON string otherwise.
//! * **No Content**: `204` responses resolve to `{}`.
use super::{RequestOptions, Transport, TransportError};
use crate::config::ClientConfig;
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::{str::FromStr, time::Duration};

/// A JSON transport over `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    default_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            default_headers: vec![],
            timeout: None,
        }
    }

    /// Builds a transport carrying the headers and timeout of a [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            default_headers: config.headers.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Sends requests through a preconfigured client (proxies, TLS, pooling).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError> {
        tracing::debug!(%method, url, "sending request");

        let headers = build_headers(self.default_headers.iter().chain(options.headers.iter()))?;

        let mut request = self.client.request(method, url).headers(headers);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| TransportError::Request(url.to_string(), err))?;

        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }

        let text = response
            .text()
            .await
            .map_err(|err| TransportError::Request(url.to_string(), err))?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&text).map_err(|err| TransportError::Decode(url.to_string(), err))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.default_headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("HttpTransport")
            .field("default_headers", &header_names)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError> {
        self.send(Method::GET, url, options).await
    }

    async fn post(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError> {
        self.send(Method::POST, url, options).await
    }

    async fn put(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError> {
        self.send(Method::PUT, url, options).await
    }

    async fn destroy(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<serde_json::Value, TransportError> {
        self.send(Method::DELETE, url, options).await
    }
}

fn build_headers<'a>(
    headers: impl Iterator<Item = &'a (String, String)>,
) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (k, v) in headers {
        let key = HeaderName::from_str(k)
            .map_err(|err| TransportError::InvalidHeader(k.clone(), err.to_string()))?;
        let val = HeaderValue::from_str(v)
            .map_err(|err| TransportError::InvalidHeader(k.clone(), err.to_string()))?;
        map.insert(key, val);
    }
    Ok(map)
}
