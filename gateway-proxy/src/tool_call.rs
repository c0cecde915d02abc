//! Trait seam between a compiled agent graph's own state/message types and
//! the proxy's interception loop. A caller implements these for whatever
//! graph state representation their agent framework uses; the proxy never
//! assumes a concrete message or tool-call shape.

/// One pending tool invocation surfaced by the wrapped graph.
pub trait ToolCall {
    /// Stable id the graph assigns this call, used to avoid re-enforcing
    /// the same call across multiple yielded states in one invocation.
    fn id(&self) -> &str;
    fn tool_name(&self) -> &str;
    fn tool_args(&self) -> &serde_json::Value;
}

/// One state yielded by the wrapped graph's stream.
pub trait GraphState: Send + 'static {
    type Call: ToolCall;

    /// Tool calls surfaced by the most recent message in this state, if
    /// any. Empty when the state carries no pending tool calls.
    fn tool_calls(&self) -> &[Self::Call];
}
