//! Transport abstraction for the executor.
//!
//! The executor only talks to [`Transport`]. [`ReqwestTransport`] is the
//! production implementation; tests substitute a mock.

mod client;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::TransportError;
use crate::request::Request;
use crate::response::RawResponse;

pub use client::{ReqwestTransport, USER_AGENT};

/// Performs one HTTP exchange. Must be safe to call concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` once, giving up after `timeout`.
    ///
    /// HTTP error statuses are returned as a [`RawResponse`], not as errors.
    async fn send(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}
