//! Command implementations behind the `httpexec` binary.

mod batch;
pub mod config;
mod send;

pub use batch::{BatchEntry, BatchOutcome, batch, parse_entries};
pub use config::{Config, Overrides, resolve_settings};
pub use send::{build_request, parse_header, send};
