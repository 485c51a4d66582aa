//! Bounded exponential backoff with jitter for remote calls.
//!
//! - HTTP 429 and 5xx → retry
//! - Other HTTP 4xx → fail immediately
//! - Network errors → retry
//! - Delay: `min(base · 2^(attempt-1), max)` plus up to half that again as
//!   jitter; a numeric `Retry-After` header overrides the computed delay
//!   (still capped at `max`)

use std::future::Future;
use std::time::Duration;

use uuid::Uuid;

use crate::config::RetryConfig;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff before retry number `attempt` (1-based), without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    /// Backoff plus random jitter in `[0, backoff / 2)`.
    ///
    /// Jitter is drawn from the random bits of a v4 UUID.
    pub fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        let half_ms = (backoff.as_millis() / 2) as u64;
        if half_ms == 0 {
            return backoff;
        }
        let jitter = (Uuid::new_v4().as_u128() as u64) % half_ms;
        backoff + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Send a request built by `f`, retrying transient failures per `policy`.
///
/// Returns the first successful response; the caller decodes it. Decode
/// failures are never retried.
pub async fn send_with_retry<F, Fut>(
    service: &'static str,
    policy: &RetryPolicy,
    mut f: F,
) -> Result<reqwest::Response, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0u32;
    loop {
        let (err, retry_after) = match f().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let retry_after = parse_retry_after(&response);
                let body = response.text().await.unwrap_or_default();
                (
                    ApiError::Status {
                        service,
                        status,
                        body,
                    },
                    retry_after,
                )
            }
            Err(source) => (ApiError::Transport { service, source }, None),
        };

        if !err.is_transient() || attempt >= policy.max_retries {
            return Err(err);
        }

        attempt += 1;
        let delay = retry_after
            .map(|d| d.min(policy.max_delay))
            .unwrap_or_else(|| policy.delay(attempt));
        tracing::warn!(
            service,
            attempt,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient API failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
