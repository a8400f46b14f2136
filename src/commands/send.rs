use anyhow::{Context, Result, bail};
use log::info;
use std::io::Write;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Settings,
    executor::RequestExecutor,
    request::{Method, Request},
    transport::Transport,
};

/// Parses a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Invalid header '{}', expected 'Name: value'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid header '{}', name is empty", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Builds a request from `send` arguments.
pub fn build_request(
    method: &str,
    url: &str,
    headers: &[String],
    body: Option<&str>,
) -> Result<Request> {
    let method: Method = method.parse()?;
    let mut request = Request::new(method, url);
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        request.headers.insert(name, value);
    }
    if let Some(body) = body {
        request.body = Some(body.as_bytes().to_vec());
    }
    Ok(request)
}

/// Executes one request and writes the response body to `out`.
/// Fails when the response is not successful.
#[tracing::instrument(skip(executor, settings, cancel, out))]
pub async fn send<T: Transport + 'static, W: Write>(
    executor: &RequestExecutor<T>,
    request: &Request,
    settings: &Settings,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<()> {
    let response = executor
        .execute_with_cancel(request, &settings.executor, cancel)
        .await
        .with_context(|| format!("{} {} failed", request.method, request.url))?;

    info!(
        "{} {} -> HTTP {}",
        request.method,
        request.url,
        response.status_code()
    );

    out.write_all(response.body())
        .context("Failed to write response body")?;
    out.flush().context("Failed to flush output")?;

    if !response.success() {
        bail!(
            "{} {} failed with HTTP {}",
            request.method,
            request.url,
            response.status_code()
        );
    }
    Ok(())
}
