//! Single request/response exchange with the remote service, and the
//! retrying decorator wrapped around it.

mod reqwest_exchange;
mod retry;

pub use reqwest_exchange::ReqwestExchange;
pub use retry::RetryingExchange;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::TransportError;

/// One outbound call. Cloned once per attempt by [`RetryingExchange`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Overrides the configured attempt budget for this call only.
    pub max_attempts: Option<u32>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            max_attempts: None,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// A fully buffered reply. Non-2xx statuses are data here, not errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub url: Url,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, url: Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            url,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Best human-readable summary of an error body: the JSON `message`
    /// or `error` field when present, otherwise the (truncated) text.
    pub fn error_message(&self) -> String {
        if let Ok(Value::Object(map)) = self.json::<Value>() {
            for key in ["message", "error"] {
                if let Some(Value::String(text)) = map.get(key) {
                    return text.clone();
                }
            }
        }
        let text = self.text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return self
                .status
                .canonical_reason()
                .unwrap_or("no body")
                .to_string();
        }
        trimmed.chars().take(200).collect()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpExchange: Send + Sync {
    async fn send(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, TransportError>;
}
