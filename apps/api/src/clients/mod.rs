//! HTTP clients for the remote collaborators: the DOCX→PDF converter and the
//! CV parser. Both share the retry policy below.
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::warn;

pub mod converter;
pub mod parser;

const MAX_ATTEMPTS: u32 = 3;

/// Sends the request built by `build`, retrying transport failures (timeouts,
/// refused connections) and 429/5xx responses with exponential backoff.
///
/// After the last attempt the final response is returned as-is, so callers
/// still see the status of a persistent 5xx.
pub(crate) async fn send_with_retry<F>(service: &str, build: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Result<RequestBuilder, reqwest::Error>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match build()?.send().await {
            Ok(response) if is_retryable(response.status()) && attempt < MAX_ATTEMPTS => {
                warn!(
                    "{service} returned {} (attempt {attempt}/{MAX_ATTEMPTS})",
                    response.status()
                );
            }
            Ok(response) => return Ok(response),
            Err(e) if (e.is_timeout() || e.is_connect()) && attempt < MAX_ATTEMPTS => {
                warn!("{service} call failed (attempt {attempt}/{MAX_ATTEMPTS}): {e}");
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(backoff(attempt)).await;
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// 500ms, 1s, 2s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * (1u64 << attempt.saturating_sub(1)))
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(1000));
        assert_eq!(backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::OK));
    }
}
