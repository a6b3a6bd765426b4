//! API Bridge — the thin HTTP projection of the platform (spec §2, §6).
//!
//! Not part of the core: the [`crate::manager::RegistryManager`] is fully
//! usable without this module. Grounded in the teacher's
//! `gateway::router`/`gateway::server` split.

mod router;
mod server;

pub use router::{AppState, create_router};
pub use server::Bridge;
