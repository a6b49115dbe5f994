use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use impact_config::RetryConfig;
use tracing::{debug, warn};

use super::{ApiRequest, ApiResponse, HttpExchange};
use crate::error::TransportError;

/// Retries an inner exchange on network failures and on any status in
/// the configured retry set, sleeping `attempt * base_delay` in between.
///
/// When the budget runs out the caller receives whatever the last attempt
/// produced: the final response (even if it is a 503) or the final error.
pub struct RetryingExchange<E: ?Sized> {
    inner: Arc<E>,
    policy: RetryConfig,
}

impl<E: ?Sized> fmt::Debug for RetryingExchange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingExchange")
            .field("inner", &std::any::type_name::<E>())
            .field("policy", &self.policy)
            .finish()
    }
}

impl<E: HttpExchange + ?Sized> RetryingExchange<E> {
    pub fn new(inner: Arc<E>, policy: RetryConfig) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryConfig {
        &self.policy
    }

    fn should_retry(&self, outcome: &Result<ApiResponse, TransportError>) -> bool {
        match outcome {
            Ok(response) => self.policy.retry_on.contains(response.status.as_u16()),
            Err(_) => true,
        }
    }
}

#[async_trait]
impl<E: HttpExchange + ?Sized> HttpExchange for RetryingExchange<E> {
    async fn send(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        let max_attempts = request
            .max_attempts
            .unwrap_or(self.policy.max_attempts)
            .max(1);

        let mut attempt = 1;
        loop {
            let outcome = self.inner.send(request.clone()).await;
            if !self.should_retry(&outcome) {
                return outcome;
            }
            if attempt >= max_attempts {
                debug!(
                    url = %request.url,
                    attempts = attempt,
                    "retry budget exhausted; returning last outcome"
                );
                return outcome;
            }

            let delay = self.policy.delay_for(attempt);
            match &outcome {
                Ok(response) => warn!(
                    attempt,
                    max_attempts,
                    url = %request.url,
                    status = response.status.as_u16(),
                    delay_ms = delay.as_millis() as u64,
                    "retryable status; backing off"
                ),
                Err(error) => warn!(
                    attempt,
                    max_attempts,
                    url = %request.url,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "request failed; backing off"
                ),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use impact_config::RetryStatusSet;
    use mockall::Sequence;
    use reqwest::{Method, StatusCode};
    use tokio::time::Instant;
    use url::Url;

    use super::*;
    use crate::transport::MockHttpExchange;

    fn url() -> Url {
        Url::parse("http://svc.local/v2/asset/id/a1/impact/status").unwrap()
    }

    fn reply(status: u16) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            url(),
            b"{}".to_vec(),
        ))
    }

    fn policy(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_secs(1),
            retry_on: RetryStatusSet::new([400, 429, 500, 503, 504]),
        }
    }

    fn scripted(statuses: &'static [u16]) -> MockHttpExchange {
        let mut mock = MockHttpExchange::new();
        let mut seq = Sequence::new();
        for status in statuses {
            mock.expect_send()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| reply(*status));
        }
        mock
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_with_linear_backoff() {
        let exchange =
            RetryingExchange::new(Arc::new(scripted(&[503, 429, 200])), policy(4));
        let started = Instant::now();

        let response = exchange
            .send(ApiRequest::new(Method::GET, url()))
            .await
            .expect("third attempt succeeds");

        assert_eq!(response.status, StatusCode::OK);
        // 1s after the first failure, 2s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_returns_last_response() {
        let exchange =
            RetryingExchange::new(Arc::new(scripted(&[500, 500, 504])), policy(3));

        let response = exchange
            .send(ApiRequest::new(Method::GET, url()))
            .await
            .expect("final response is surfaced, not an error");

        assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_status_is_returned_immediately() {
        let exchange =
            RetryingExchange::new(Arc::new(scripted(&[404])), policy(5));

        let response = exchange
            .send(ApiRequest::new(Method::GET, url()))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn bad_request_follows_the_configured_set() {
        let mut without_400 = policy(3);
        without_400.retry_on = RetryStatusSet::new([429, 500, 503, 504]);
        let exchange =
            RetryingExchange::new(Arc::new(scripted(&[400])), without_400);

        let response = exchange
            .send(ApiRequest::new(Method::POST, url()))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let exchange =
            RetryingExchange::new(Arc::new(scripted(&[400, 201])), policy(3));
        let response = exchange
            .send(ApiRequest::new(Method::POST, url()))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
    }

    #[tokio::test(start_paused = true)]
    async fn network_errors_are_retried_then_surfaced() {
        let mut mock = MockHttpExchange::new();
        mock.expect_send().times(2).returning(|request| {
            Err(TransportError::Failed {
                url: request.url,
                reason: "connection reset".into(),
            })
        });
        let exchange = RetryingExchange::new(Arc::new(mock), policy(2));

        let err = exchange
            .send(ApiRequest::new(Method::GET, url()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn per_request_budget_overrides_policy() {
        let exchange = RetryingExchange::new(
            Arc::new(scripted(&[503, 503, 503, 503, 200])),
            policy(2),
        );

        let response = exchange
            .send(ApiRequest::new(Method::GET, url()).max_attempts(5))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
    }
}
