//! HTTP request execution with bounded retries, timeouts and batching.
//!
//! A [`RequestExecutor`] sends [`Request`]s through a [`Transport`], retrying
//! connection failures and configured statuses with exponential backoff
//! inside a per-call time budget described by [`ExecutorConfig`].

pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod request;
pub mod response;
pub mod transport;

pub use config::{ExecutorConfig, Settings};
pub use error::{ExecuteError, TransportError};
pub use executor::RequestExecutor;
pub use request::{Headers, Method, Request};
pub use response::{RawResponse, Response};
pub use transport::{ReqwestTransport, Transport};
