//! Gateway Proxy - the streaming enforcement proxy
//!
//! Wraps a compiled agent graph's state stream, intercepting tool-call
//! messages between the agent's reasoning step and tool execution and
//! enforcing each one before the state reaches the caller.

mod client;
mod mapper;
mod proxy;
mod rate_limit;
mod tool_call;

pub use client::{transport_error_effect, EnforcementClient, EnforcementTransportError, LocalEnforcementClient};
pub use mapper::build_intent_event;
pub use proxy::{BlockMode, EnforcementProxy, InvocationContext, ProxyError, ProxyOptions};
pub use rate_limit::AgentRateLimiter;
pub use tool_call::{GraphState, ToolCall};
