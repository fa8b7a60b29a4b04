//! Remote API client.
//!
//! A thin JSON-over-HTTP wrapper: every request is resolved against the
//! configured base URL, tagged with a request ID, authenticated with the
//! stored bearer token when there is one, and bounded by a fixed timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::middleware::{bearer_header_value, RequestId};
use common::response::ErrorBody;

use crate::storage::{self, LocalStorage};

/// HTTP verbs used by the dashboard backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Sets the JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Remote API seam.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Sends a request and returns the parsed JSON body (`Null` when empty).
    ///
    /// # Errors
    /// Network failures, timeouts, non-2xx statuses and undecodable bodies.
    async fn send(&self, request: ApiRequest) -> AppResult<Value>;
}

/// Decodes a JSON value into a typed response.
pub fn decode<T: DeserializeOwned>(value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(AppError::from)
}

/// `reqwest`-backed [`RemoteApi`].
pub struct HttpApiClient {
    base_url: String,
    http_client: reqwest::Client,
    storage: Arc<dyn LocalStorage>,
    timeout: Duration,
}

impl HttpApiClient {
    /// Creates a client for the configured base URL.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &AppConfig, storage: Arc<dyn LocalStorage>) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=UTF-8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let timeout = config.request_timeout();
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            http_client,
            storage,
            timeout,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn transport_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout(self.timeout.as_millis() as u64)
        } else {
            AppError::from(err)
        }
    }
}

#[async_trait]
impl RemoteApi for HttpApiClient {
    async fn send(&self, request: ApiRequest) -> AppResult<Value> {
        let request_id = RequestId::generate();
        let url = self.url(&request.path);
        tracing::debug!(
            request_id = %request_id,
            method = ?request.method,
            path = %request.path,
            "Sending API request"
        );

        let mut builder = self.http_client.request(request.method.into(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder = request_id.apply(builder);
        if let Some(value) = storage::token(self.storage.as_ref()).and_then(|t| bearer_header_value(&t)) {
            builder = builder.header(AUTHORIZATION, value);
        }

        let response = builder.send().await.map_err(|e| {
            let err = self.transport_error(e);
            tracing::warn!(request_id = %request_id, path = %request.path, error = %err, "API request failed");
            err
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = ErrorBody::message_from(&bytes)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            tracing::warn!(
                request_id = %request_id,
                path = %request.path,
                status = status.as_u16(),
                error = %message,
                "API request rejected"
            );
            return Err(AppError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(AppError::from)
    }
}
