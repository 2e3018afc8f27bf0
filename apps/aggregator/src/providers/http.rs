use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tracing::warn;

use super::ProviderError;

/// Sends a request built by `build`, retrying 429 and 5xx answers with exponential
/// backoff (1s, 2s, 4s...) up to `max_attempts` in total. Other non-2xx answers fail
/// immediately so the chain can move on.
pub(super) async fn send_with_retry<F>(
    provider: &str,
    max_attempts: u32,
    build: F,
) -> Result<Response, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error: Option<ProviderError> = None;

    for attempt in 0..max_attempts {
        if attempt > 0 {
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "{provider} call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(ProviderError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("{provider} API returned {status}: {body}");
            last_error = Some(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or(ProviderError::RateLimited {
        retries: max_attempts,
    }))
}
