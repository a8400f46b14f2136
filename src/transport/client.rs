//! Transport backed by a shared reqwest client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use super::Transport;
use crate::error::TransportError;
use crate::request::{Headers, Request};
use crate::response::RawResponse;

/// User agent sent by [`ReqwestTransport::with_default_client`].
pub const USER_AGENT: &str = concat!("httpexec/", env!("HTTPEXEC_VERSION"));

/// [`Transport`] over reqwest. Cloning shares the connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a transport with a fresh client that identifies as httpexec.
    pub fn with_default_client() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        debug!("{} {} (timeout {:?})...", request.method, request.url, timeout);

        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(timeout);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify_error)?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await.map_err(classify_error)?.to_vec();

        debug!("{} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Timeouts stay distinguishable; everything else is a connection failure.
fn classify_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::TimedOut
    } else {
        TransportError::Connection(error.to_string())
    }
}

/// Repeated headers are folded into one comma-separated value.
fn collect_headers(map: &reqwest::header::HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes());
        let folded = match headers.get(name.as_str()) {
            Some(existing) => format!("{}, {}", existing, value),
            None => value.into_owned(),
        };
        headers.insert(name.as_str(), folded);
    }
    headers
}
