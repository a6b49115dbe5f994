use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use super::{ApiRequest, ApiResponse, HttpExchange};
use crate::error::TransportError;

/// [`HttpExchange`] backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct ReqwestExchange {
    client: Client,
}

impl fmt::Debug for ReqwestExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestExchange").finish_non_exhaustive()
    }
}

impl ReqwestExchange {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("impact-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpExchange for ReqwestExchange {
    async fn send(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
            ..
        } = request;

        let mut builder = self.client.request(method.clone(), url.clone());
        builder = builder.headers(headers);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let final_url = response.url().clone();
        let bytes = response.bytes().await?;
        trace!(%method, url = %final_url, %status, len = bytes.len(), "exchange complete");

        Ok(ApiResponse::new(status, final_url, bytes.to_vec()))
    }
}
