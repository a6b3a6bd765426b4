//! Toolmesh — a framework-agnostic tool registry and execution platform.
//!
//! Unifies heterogeneous AI-agent tool providers (reasoning frameworks,
//! knowledge bases, MCP servers, ...) behind one discovery and execution
//! contract:
//!
//! - [`model`] — the Tool Specification Model (`ToolSpec`, `ToolCategory`,
//!   `Capability`).
//! - [`adapter`] — the Framework Adapter trait each tool provider
//!   implements.
//! - [`adapters`] — five illustrative, in-process adapter implementations.
//! - [`unified_registry`] — the catalog indexing every adapter's tools.
//! - [`coordinator`] — bounds concurrency and tracks execution lifecycle.
//! - [`manager`] — top-level lifecycle and configuration.
//! - [`bridge`] — the HTTP projection of the platform (axum).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod adapters;
pub mod bridge;
pub mod cli;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod manager;
pub mod model;
pub mod result;
pub mod unified_registry;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup structured logging, honoring `RUST_LOG` if set and falling back to
/// the given level; `format` selects `"json"` or human-readable output.
///
/// # Errors
///
/// Never actually fails today, but is fallible so a future validation step
/// (e.g. rejecting an unknown format) doesn't require a breaking API change.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
