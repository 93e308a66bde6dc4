//! Timeout and retry policy around an [`HttpClient`].
//!
//! Reads default to a 5s timeout with one retry, writes to a 10s timeout and
//! no retry so a non-idempotent create is never sent twice. Only transport
//! failures and timeouts are retried unless `retry_server_errors` is set.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::client::{ApiRequest, HttpClient, RawResponse};
use crate::error::{ErrorInfo, ErrorKind};

pub const READ_TIMEOUT: Duration = Duration::from_millis(5000);
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(10000);
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    /// Also retry 5xx responses.
    pub retry_server_errors: bool,
}

impl FetchPolicy {
    pub fn read() -> Self {
        FetchPolicy {
            timeout: READ_TIMEOUT,
            retries: 1,
            retry_delay: RETRY_DELAY,
            retry_server_errors: false,
        }
    }

    pub fn write() -> Self {
        FetchPolicy {
            timeout: WRITE_TIMEOUT,
            retries: 0,
            retry_delay: RETRY_DELAY,
            retry_server_errors: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn retrying_server_errors(mut self) -> Self {
        self.retry_server_errors = true;
        self
    }

    fn should_retry(&self, err: &ErrorInfo) -> bool {
        err.is_retryable()
            || (self.retry_server_errors && err.kind == ErrorKind::Server && err.status.is_some())
    }
}

/// Sends `request` until it succeeds or the policy gives up. A non-2xx
/// response is turned into an [`ErrorInfo`]; its body is never returned as
/// success.
pub async fn execute<C: HttpClient>(
    client: &C,
    request: &ApiRequest,
    policy: &FetchPolicy,
) -> Result<RawResponse, ErrorInfo> {
    let mut attempt: u32 = 0;

    loop {
        let err = match tokio::time::timeout(policy.timeout, client.send(request)).await {
            Ok(Ok(response)) if response.is_success() => return Ok(response),
            Ok(Ok(response)) => ErrorInfo::from_response(response.status, &response.body),
            Ok(Err(transport)) => ErrorInfo::from(transport),
            Err(_) => ErrorInfo::timeout(policy.timeout),
        };

        if attempt >= policy.retries || !policy.should_retry(&err) {
            tracing::error!(
                method = %request.method,
                path = %request.path,
                kind = %err.kind,
                attempts = attempt + 1,
                "request failed: {}",
                err.message
            );
            return Err(err);
        }

        attempt += 1;
        tracing::warn!(
            method = %request.method,
            path = %request.path,
            kind = %err.kind,
            attempt,
            "request failed, retrying in {}ms",
            policy.retry_delay.as_millis()
        );
        tokio::time::sleep(policy.retry_delay).await;
    }
}

/// [`execute`] and decode the JSON body.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    request: &ApiRequest,
    policy: &FetchPolicy,
) -> Result<T, ErrorInfo> {
    let response = execute(client, request, policy).await?;
    serde_json::from_str(&response.body).map_err(ErrorInfo::malformed)
}
