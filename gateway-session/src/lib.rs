//! Gateway Session - per-agent session state and drift tracking
//!
//! Tracks one [`gateway_core::Session`] per `(tenant_id, agent_id)` pair:
//! captures a baseline Intent Vector on first use, accumulates semantic
//! drift as the agent's calls diverge from it, and bounds call history and
//! session lifetime.

mod key;
mod store;
mod sweeper;

pub use key::SessionKey;
pub use store::{DriftUpdate, SessionConfig, SessionStore};
pub use sweeper::spawn_sweeper;
