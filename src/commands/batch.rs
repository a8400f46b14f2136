use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Settings,
    error::ExecuteError,
    executor::RequestExecutor,
    request::{Headers, Method, Request},
    response::Response,
    transport::Transport,
};

/// One request in a batch file.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    #[serde(default)]
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<String>,
}

impl From<BatchEntry> for Request {
    fn from(entry: BatchEntry) -> Self {
        Request {
            method: entry.method,
            url: entry.url,
            headers: entry.headers,
            body: entry.body.map(String::into_bytes),
        }
    }
}

/// One line of batch output, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Response {
        index: usize,
        status: u16,
        success: bool,
        headers: Headers,
        body: String,
    },
    Error {
        index: usize,
        error: String,
    },
}

impl BatchOutcome {
    fn new(index: usize, result: Result<Response, ExecuteError>) -> Self {
        match result {
            Ok(response) => BatchOutcome::Response {
                index,
                status: response.status_code(),
                success: response.success(),
                headers: response.headers().clone(),
                body: response.text().into_owned(),
            },
            Err(e) => BatchOutcome::Error {
                index,
                error: e.to_string(),
            },
        }
    }
}

/// Parses a JSON array of [`BatchEntry`] values.
pub fn parse_entries(input: &str) -> Result<Vec<Request>> {
    let entries: Vec<BatchEntry> =
        serde_json::from_str(input).context("Failed to parse batch file")?;
    Ok(entries.into_iter().map(Request::from).collect())
}

/// Runs every request in `input` and writes a JSON array of outcomes to `out`.
/// Per-entry failures are reported in the output, not as an error.
#[tracing::instrument(skip(executor, input, settings, cancel, out))]
pub async fn batch<T: Transport + 'static, W: Write>(
    executor: &RequestExecutor<T>,
    input: &str,
    settings: &Settings,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<Vec<BatchOutcome>> {
    let requests = parse_entries(input)?;
    info!(
        "Running {} request(s) with concurrency {}",
        requests.len(),
        settings.concurrency_limit
    );

    let results = executor
        .execute_batch_with_cancel(
            &requests,
            &settings.executor,
            settings.concurrency_limit,
            cancel,
        )
        .await;

    let outcomes: Vec<BatchOutcome> = results
        .into_iter()
        .enumerate()
        .map(|(index, result)| BatchOutcome::new(index, result))
        .collect();

    serde_json::to_writer_pretty(&mut *out, &outcomes).context("Failed to write batch output")?;
    writeln!(out).context("Failed to write batch output")?;

    let failed = outcomes
        .iter()
        .filter(|o| !matches!(o, BatchOutcome::Response { success: true, .. }))
        .count();
    info!("Batch finished: {} ok, {} failed", outcomes.len() - failed, failed);

    Ok(outcomes)
}
