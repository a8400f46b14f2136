//! Request execution with bounded retries, a time budget, and batching.
//!
//! [`RequestExecutor::execute`] drives one [`Request`] through the retry loop:
//! connection failures and statuses listed in
//! [`ExecutorConfig::retryable_status_codes`] are retried with exponential
//! backoff until either `max_retries` or `timeout_seconds` is spent.
//! [`RequestExecutor::execute_batch`] fans a slice of requests out over a
//! bounded pool of tasks and returns results in input order.

pub mod retry;

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use crate::config::ExecutorConfig;
use crate::error::{ExecuteError, TransportError};
use crate::request::Request;
use crate::response::{RawResponse, Response};
use crate::transport::Transport;

use retry::{backoff_delay, deadline_after, remaining_until};

/// Why one attempt did not produce a final response.
enum Failure {
    Status(u16),
    Transport(TransportError),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Status(status) => write!(f, "HTTP {}", status),
            Failure::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Executes requests against a [`Transport`].
///
/// Holds no per-call state; configuration travels with every call, so one
/// executor can serve any number of concurrent executions.
pub struct RequestExecutor<T> {
    transport: Arc<T>,
}

impl<T> Clone for RequestExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport + 'static> RequestExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Executes `request` until it yields a final response or fails terminally.
    pub async fn execute(
        &self,
        request: &Request,
        config: &ExecutorConfig,
    ) -> Result<Response, ExecuteError> {
        self.execute_with_cancel(request, config, &CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), stopping with
    /// [`ExecuteError::Cancelled`] as soon as `cancel` fires.
    #[tracing::instrument(
        skip(self, request, config, cancel),
        fields(method = %request.method, url = %request.url)
    )]
    pub async fn execute_with_cancel(
        &self,
        request: &Request,
        config: &ExecutorConfig,
        cancel: &CancellationToken,
    ) -> Result<Response, ExecuteError> {
        config.validate()?;
        request.validate()?;

        let budget = config.timeout();
        let deadline = deadline_after(budget);
        let attempts = config.max_retries.saturating_add(1);

        let mut last_response: Option<RawResponse> = None;
        let mut last_failure: Option<Failure> = None;
        let mut out_of_time = false;

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(ExecuteError::Cancelled);
            }

            if attempt > 1 {
                let delay = backoff_delay(attempt - 1, budget);
                match remaining_until(deadline) {
                    Some(remaining) if delay < remaining => {}
                    _ => {
                        debug!(
                            "{} {}: no time left for a {}ms backoff, giving up",
                            request.method,
                            request.url,
                            delay.as_millis()
                        );
                        out_of_time = true;
                        break;
                    }
                }

                tokio::select! {
                    _ = cancel.cancelled() => return Err(ExecuteError::Cancelled),
                    _ = sleep(delay) => {}
                }
            }

            let Some(remaining) = remaining_until(deadline) else {
                out_of_time = true;
                break;
            };

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(ExecuteError::Cancelled),
                outcome = timeout(remaining, self.transport.send(request, remaining)) => outcome,
            };

            let failure = match outcome {
                Err(_) => {
                    debug!(
                        "{} {}: attempt {} ran into the deadline",
                        request.method, request.url, attempt
                    );
                    out_of_time = true;
                    break;
                }
                Ok(Ok(raw)) if !(100..=599).contains(&raw.status) => Failure::Transport(
                    TransportError::Connection(format!("invalid HTTP status {}", raw.status)),
                ),
                Ok(Ok(raw)) if config.is_retryable_status(raw.status) => {
                    let status = raw.status;
                    last_response = Some(raw);
                    Failure::Status(status)
                }
                Ok(Ok(raw)) => {
                    info!(
                        "{} {} -> {} after {} attempt(s)",
                        request.method, request.url, raw.status, attempt
                    );
                    return Ok(Response::from_raw(raw));
                }
                Ok(Err(TransportError::TimedOut)) => {
                    debug!(
                        "{} {}: attempt {} timed out in the transport",
                        request.method, request.url, attempt
                    );
                    out_of_time = true;
                    break;
                }
                Ok(Err(e)) => Failure::Transport(e),
            };

            if attempt < attempts {
                warn!(
                    "{} {}: attempt {}/{} failed ({}), retrying...",
                    request.method, request.url, attempt, attempts, failure
                );
            } else {
                warn!(
                    "{} {}: attempt {}/{} failed ({}), no retries left",
                    request.method, request.url, attempt, attempts, failure
                );
            }
            last_failure = Some(failure);
        }

        if let Some(raw) = last_response {
            return Ok(Response::exhausted(raw));
        }

        match last_failure {
            _ if out_of_time => Err(ExecuteError::TimeoutExceeded { timeout: budget }),
            Some(failure) => Err(ExecuteError::Connection(failure.to_string())),
            None => Err(ExecuteError::TimeoutExceeded { timeout: budget }),
        }
    }

    /// Executes every request independently, at most `concurrency_limit` at
    /// a time (0 behaves like 1). Results come back in input order.
    pub async fn execute_batch(
        &self,
        requests: &[Request],
        config: &ExecutorConfig,
        concurrency_limit: usize,
    ) -> Vec<Result<Response, ExecuteError>> {
        let cancel = CancellationToken::new();
        self.execute_batch_with_cancel(requests, config, concurrency_limit, &cancel)
            .await
    }

    /// Like [`execute_batch`](Self::execute_batch). On cancellation, entries
    /// that already finished keep their result and the rest become
    /// [`ExecuteError::Cancelled`].
    #[tracing::instrument(skip(self, requests, config, cancel), fields(total = requests.len()))]
    pub async fn execute_batch_with_cancel(
        &self,
        requests: &[Request],
        config: &ExecutorConfig,
        concurrency_limit: usize,
        cancel: &CancellationToken,
    ) -> Vec<Result<Response, ExecuteError>> {
        let total = requests.len();
        let limit = concurrency_limit.max(1);
        debug!("Executing batch of {} request(s), concurrency {}", total, limit);

        let mut results: Vec<Option<Result<Response, ExecuteError>>> = vec![None; total];
        let mut join_set: JoinSet<Result<Response, ExecuteError>> = JoinSet::new();
        let mut indices = HashMap::new();
        let mut next = 0usize;

        loop {
            // Keep up to `limit` workers busy
            while next < total && join_set.len() < limit && !cancel.is_cancelled() {
                let executor = self.clone();
                let request = requests[next].clone();
                let config = config.clone();
                let cancel = cancel.clone();
                let handle = join_set.spawn(async move {
                    executor
                        .execute_with_cancel(&request, &config, &cancel)
                        .await
                });
                indices.insert(handle.id(), next);
                next += 1;
            }

            let Some(joined) = join_set.join_next_with_id().await else {
                break;
            };

            match joined {
                Ok((id, result)) => {
                    if let Some(index) = indices.remove(&id) {
                        results[index] = Some(result);
                    }
                }
                Err(e) => {
                    if let Some(index) = indices.remove(&e.id()) {
                        warn!("Batch entry {} worker failed: {}", index, e);
                        results[index] = Some(Err(ExecuteError::WorkerFailed(e.to_string())));
                    }
                }
            }
        }

        results
            .into_iter()
            .map(|result| result.unwrap_or(Err(ExecuteError::Cancelled)))
            .collect()
    }
}
