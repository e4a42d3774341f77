// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{HttpClient, HttpRequest, HttpResponse};

/// Bounded retry schedule with exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_delay: Duration,
    /// Upper bound for any single delay, including server-requested ones
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let requested = retry_after.map(Duration::from_secs).unwrap_or_default();
        exponential.max(requested).min(self.max_delay)
    }
}

/// 408 and 429 mean the request was not processed
fn is_rejected_status(status: u16) -> bool {
    status == 408 || status == 429
}

fn is_retryable(request: &HttpRequest, result: &Result<HttpResponse, reqwest::Error>) -> bool {
    let idempotent = request.method.is_idempotent();
    match result {
        Ok(response) => {
            is_rejected_status(response.status)
                || (idempotent && (500..=599).contains(&response.status))
        }
        Err(_) => idempotent,
    }
}

/// Wraps an [`HttpClient`] and retries transient failures
///
/// 408 and 429 responses are always retried. Transport errors and 5xx
/// responses are retried for idempotent methods only, since a POST may have
/// landed before the failure. Other responses, successful or not, are
/// returned to the caller untouched. Once retries are exhausted the last
/// response or error is returned as-is.
#[derive(Clone)]
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: HttpClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for RetryingClient<C> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, reqwest::Error> {
        let mut attempt = 0;

        loop {
            let result = self.inner.execute(request.clone()).await;

            if !is_retryable(&request, &result) || attempt >= self.policy.max_retries {
                return result;
            }

            attempt += 1;
            let retry_after = match &result {
                Ok(response) => {
                    warn!(
                        url = %request.url,
                        status = response.status,
                        attempt,
                        "Request failed with retryable status"
                    );
                    response.retry_after
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, attempt, "Request failed");
                    None
                }
            };

            tokio::time::sleep(self.policy.backoff(attempt, retry_after)).await;
        }
    }
}
