//! Two-tier request policy: a strict, fast attempt followed by a lenient,
//! slower one.
//!
//! Each [`Attempt`] bounds one request with its own timeout. Only
//! transient failures (timeouts, connection errors, HTTP 429 and 5xx)
//! move on to the next attempt; anything else is returned immediately.
//! There is no backoff between attempts since the second attempt is
//! already more patient than the first.

use std::future::Future;

use crate::{GeocodeError, service_registry::Attempt};

/// Runs `op` once per attempt until it succeeds or fails permanently.
///
/// `op` receives the current attempt so it can apply the attempt's
/// timeout to the request it builds. The whole call is additionally
/// bounded by [`tokio::time::timeout`] so an op that ignores the timeout
/// still cannot overrun it.
///
/// # Errors
///
/// Returns the last error if every attempt failed transiently, or the
/// first permanent error. Returns [`GeocodeError::Config`] if `attempts`
/// is empty.
pub async fn run_attempts<T, F, Fut>(attempts: &[Attempt], mut op: F) -> Result<T, GeocodeError>
where
    F: FnMut(&Attempt) -> Fut,
    Fut: Future<Output = Result<T, GeocodeError>>,
{
    let mut last_error = None;

    for (i, attempt) in attempts.iter().enumerate() {
        let result = match tokio::time::timeout(attempt.timeout(), op(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(GeocodeError::Timeout {
                attempt: attempt.name.clone(),
                timeout_ms: attempt.timeout_ms,
            }),
        };

        match result {
            Ok(value) => {
                if i > 0 {
                    log::debug!("Request succeeded on '{}' attempt", attempt.name);
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() => {
                log::warn!("'{}' attempt failed: {e}", attempt.name);
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| GeocodeError::Config {
        message: "no request attempts configured".to_string(),
    }))
}

/// Sends a GET request built by `build_request` under the attempt policy
/// and parses the response body as JSON.
///
/// The builder closure is called once per attempt since builders are
/// consumed by `.send()`.
///
/// # Errors
///
/// Returns [`GeocodeError`] if every attempt failed transiently, the
/// server returned a non-retryable status, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    attempts: &[Attempt],
    build_request: F,
) -> Result<serde_json::Value, GeocodeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    run_attempts(attempts, |attempt| {
        let request = build_request().timeout(attempt.timeout());
        async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(GeocodeError::Status {
                    code: status.as_u16(),
                });
            }
            let text = response.text().await?;
            serde_json::from_str(&text).map_err(|e| GeocodeError::Parse {
                message: format!("response body is not JSON: {e}"),
            })
        }
    })
    .await
}
