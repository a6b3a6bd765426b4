//! Illustrative adapter implementations (spec §6: "The source includes
//! five illustrative providers ... the core does not distinguish them").
//!
//! Each adapter here is a thin, in-process demonstration — deterministic,
//! synthetic logic standing in for the real framework integration, which
//! remains an external collaborator per spec §1. Shape (provider name,
//! category set, tool names) is grounded in the matching
//! `app/adapters/*_adapter.py` file; the actual logic (HTTP calls, vector
//! stores, LLM calls) is not reproduced.

mod agno;
mod demo;
mod fastmcp;
mod haystack;
mod llamaindex;
mod owl;

pub use agno::AgnoAdapter;
pub use demo::DemoAdapter;
pub use fastmcp::FastMcpAdapter;
pub use haystack::HaystackAdapter;
pub use llamaindex::LlamaIndexAdapter;
pub use owl::OwlAdapter;
