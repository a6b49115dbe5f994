//! Typed clients for the remote scoring service.

mod asset;
mod group;
mod reference;

pub use asset::AssetApi;
pub use group::GroupApi;
pub use reference::{ReferenceApi, ReferenceSnapshot};

use std::fmt;
use std::sync::Arc;

use impact_config::{ImpactConfig, Secret};
use impact_model::{Activity, ResourceId};
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ImpactError, Result};
use crate::transport::{
    ApiRequest, ApiResponse, HttpExchange, ReqwestExchange, RetryingExchange,
};

/// Header carrying the scoring-service credential.
pub const API_KEY_HEADER: &str = "api-key";

/// Result of a create call that did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created {
        id: ResourceId,
        suggestions: Vec<Activity>,
    },
    /// The service reported a conflict instead of creating anything.
    AlreadyExists { message: String },
}

#[derive(Clone)]
struct Credential {
    header: HeaderName,
    value: Secret,
}

/// Thin JSON client: base URL, credential header and an exchange.
///
/// Path segments are appended through [`Url::path_segments_mut`], so names
/// and ids containing spaces or slashes are percent-encoded.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    credential: Option<Credential>,
    exchange: Arc<dyn HttpExchange>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field(
                "credential",
                &self.credential.as_ref().map(|c| c.header.as_str()),
            )
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: Url, exchange: Arc<dyn HttpExchange>) -> Self {
        Self {
            base_url,
            credential: None,
            exchange,
        }
    }

    /// Client for the scoring service described by `config`: reqwest
    /// exchange wrapped in the configured retry policy, `api-key` header.
    pub fn from_config(config: &ImpactConfig) -> Result<Self> {
        let key = config
            .api
            .api_key
            .as_ref()
            .filter(|key| !key.is_blank())
            .ok_or_else(|| {
                ImpactError::Configuration("API key not found".to_string())
            })?;

        let raw = ReqwestExchange::new(config.api.request_timeout)?;
        let exchange =
            RetryingExchange::new(Arc::new(raw), config.retry.clone());

        Self::new(config.api.base_url.clone(), Arc::new(exchange))
            .with_credential(API_KEY_HEADER, key.clone())
    }

    pub fn with_credential(
        mut self,
        header: &'static str,
        value: Secret,
    ) -> Result<Self> {
        HeaderValue::from_str(value.expose()).map_err(|_| {
            ImpactError::Configuration(format!(
                "credential for `{header}` is not a valid header value"
            ))
        })?;
        self.credential = Some(Credential {
            header: HeaderName::from_static(header),
            value,
        });
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint<S: AsRef<str>>(&self, segments: &[S]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ImpactError::Configuration(format!(
                    "base URL `{}` cannot carry a path",
                    self.base_url
                ))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }
        Ok(url)
    }

    pub fn request(&self, method: Method, url: Url) -> ApiRequest {
        let mut request = ApiRequest::new(method, url);
        if let Some(credential) = &self.credential
            && let Ok(mut value) = HeaderValue::from_str(credential.value.expose())
        {
            value.set_sensitive(true);
            request = request.header(credential.header.clone(), value);
        }
        request
    }

    /// Send without judging the status.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");
        Ok(self.exchange.send(request).await?)
    }

    /// Send and turn any non-2xx reply into [`ImpactError::HttpStatus`].
    pub async fn execute_ok(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = self.execute(request).await?;
        ensure_success(response)
    }

    pub async fn get_json<T, S>(&self, segments: &[S]) -> Result<T>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        let url = self.endpoint(segments)?;
        let response = self.execute_ok(self.request(Method::GET, url)).await?;
        decode(&response)
    }

    pub async fn send_json<B, S>(
        &self,
        method: Method,
        segments: &[S],
        body: &B,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
        S: AsRef<str>,
    {
        let url = self.endpoint(segments)?;
        let request = self
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(serde_json::to_value(body)?);
        self.execute(request).await
    }

    pub async fn put_json<B, S>(&self, segments: &[S], body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
        S: AsRef<str>,
    {
        let response = self.send_json(Method::PUT, segments, body).await?;
        ensure_success(response).map(|_| ())
    }

    /// POST with no body; the reply is not interpreted beyond its status.
    pub async fn post_empty<S: AsRef<str>>(&self, segments: &[S]) -> Result<()> {
        let url = self.endpoint(segments)?;
        self.execute_ok(self.request(Method::POST, url))
            .await
            .map(|_| ())
    }

    pub async fn delete<S: AsRef<str>>(&self, segments: &[S]) -> Result<()> {
        let url = self.endpoint(segments)?;
        self.execute_ok(self.request(Method::DELETE, url))
            .await
            .map(|_| ())
    }
}

pub(crate) fn ensure_success(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ImpactError::HttpStatus {
            status: response.status,
            message: response.error_message(),
            url: response.url,
        })
    }
}

pub(crate) fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    response
        .json()
        .map_err(|err| ImpactError::UnexpectedResponse {
            url: response.url.clone(),
            reason: err.to_string(),
        })
}

/// A 409, or a 2xx body whose `message` says the resource already exists.
pub(crate) fn conflict_message(response: &ApiResponse) -> Option<String> {
    if response.status == StatusCode::CONFLICT {
        return Some(response.error_message());
    }
    if !response.is_success() {
        return None;
    }
    let body: Value = response.json().ok()?;
    let message = body.get("message")?.as_str()?;
    message
        .to_ascii_lowercase()
        .contains("already exists")
        .then(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockHttpExchange;

    fn client_for(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), Arc::new(MockHttpExchange::new()))
    }

    #[test]
    fn endpoint_appends_and_encodes_segments() {
        let client = client_for("https://svc.local/v2");
        let url = client
            .endpoint(&["asset", "search", "name", "Acme & Sons/UK"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://svc.local/v2/asset/search/name/Acme%20&%20Sons%2FUK"
        );

        let trailing = client_for("https://svc.local/v2/");
        assert_eq!(
            trailing.endpoint(&["group"]).unwrap().as_str(),
            "https://svc.local/v2/group"
        );
    }

    #[test]
    fn credential_header_is_marked_sensitive() {
        let client = client_for("https://svc.local/v2")
            .with_credential(API_KEY_HEADER, Secret::new("k-1"))
            .unwrap();
        let request =
            client.request(Method::GET, client.endpoint(&["asset"]).unwrap());
        let value = request.headers.get(API_KEY_HEADER).expect("header set");
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "k-1");
        assert!(!format!("{client:?}").contains("k-1"));
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = ApiClient::from_config(&ImpactConfig::default()).unwrap_err();
        assert!(matches!(err, ImpactError::Configuration(_)));
    }

    #[test]
    fn conflict_detection() {
        let url = Url::parse("https://svc.local/v2/asset").unwrap();
        let conflict = ApiResponse::new(StatusCode::CONFLICT, url.clone(), Vec::new());
        assert!(conflict_message(&conflict).is_some());

        let soft = ApiResponse::new(
            StatusCode::OK,
            url.clone(),
            br#"{"success":false,"message":"Asset Already Exists"}"#.to_vec(),
        );
        assert_eq!(conflict_message(&soft).as_deref(), Some("Asset Already Exists"));

        let created = ApiResponse::new(
            StatusCode::CREATED,
            url,
            br#"{"asset":{"id":"a1","name":"Acme","industry":"Software"}}"#.to_vec(),
        );
        assert!(conflict_message(&created).is_none());
    }
}
