//! Back-off for Reddit requests.
//!
//! Reddit meters OAuth clients per rate-limit window. An over-quota request
//! gets `429 Too Many Requests` plus an `x-ratelimit-reset` header holding the
//! seconds left in the window; [`RetryPolicy::run`] waits that out (bounded by
//! [`MAX_DELAY`]) and tries again. Timeouts, refused connections and 5xx get
//! plain exponential back-off. A rejected credential, any other 4xx, or a body
//! that does not parse fails on the first attempt.

use std::future::Future;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};

use crate::error::SentimentError;

/// Longest single wait, whatever the back-off or reset window says.
const MAX_DELAY: Duration = Duration::from_secs(60);
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    max_retries: u32,
    backoff_base: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base: Duration::from_millis(backoff_base_ms),
        }
    }

    /// Exponential delay before retry `attempt` (1-based), with ±25 % jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let doubling = 1u32 << attempt.saturating_sub(1).min(10);
        let capped = self.backoff_base.saturating_mul(doubling).min(MAX_DELAY);
        capped
            .mul_f64(rand::random_range(0.75..=1.25))
            .min(MAX_DELAY)
    }

    /// How long to wait after `err` before retry `attempt`, or `None` when
    /// `err` goes straight back to the caller.
    fn delay_after(&self, err: &SentimentError, attempt: u32) -> Option<Duration> {
        match err {
            SentimentError::RateLimited { reset_secs } => {
                let window = reset_secs.map_or(Duration::ZERO, Duration::from_secs);
                Some(self.backoff(attempt).max(window).min(MAX_DELAY))
            }
            SentimentError::Http(e) if is_transient(e) => Some(self.backoff(attempt)),
            // A 4xx or an unparseable body repeats on the next attempt.
            // Configuration and Store errors never come out of a request; store
            // conflicts are retried by the orchestrator against the stored record.
            SentimentError::Http(_)
            | SentimentError::Reddit(_)
            | SentimentError::Configuration(_)
            | SentimentError::Store(_) => None,
        }
    }

    /// Run `request`, retrying up to `max_retries` times on rate limiting and
    /// transient failures.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        request: &str,
        mut operation: F,
    ) -> Result<T, SentimentError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SentimentError>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            attempt += 1;
            let delay = match self.delay_after(&err, attempt) {
                Some(delay) if attempt <= self.max_retries => delay,
                _ => return Err(err),
            };
            tracing::warn!(
                request,
                attempt,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Reddit request failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.status().is_some_and(|s| s.is_server_error())
}

/// Turn a non-success Reddit response into an error, keeping the reset window
/// of a 429.
pub(crate) fn check_status(response: Response) -> Result<Response, SentimentError> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(SentimentError::RateLimited {
            reset_secs: rate_limit_reset(response.headers()),
        });
    }
    Ok(response.error_for_status()?)
}

/// Whole seconds from `x-ratelimit-reset`. Reddit sometimes sends `"42.0"`.
fn rate_limit_reset(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(RATE_LIMIT_RESET)?.to_str().ok()?.trim();
    value.split('.').next()?.parse().ok()
}
