//! Streaming enforcement proxy: wraps a compiled agent graph's state
//! stream, intercepting tool-call messages and enforcing each one before
//! the state reaches the caller.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use gateway_core::{BlockReason, ComparisonResult, Decision, Effect};

use crate::client::EnforcementClient;
use crate::mapper::build_intent_event;
use crate::rate_limit::AgentRateLimiter;
use crate::tool_call::{GraphState, ToolCall};

/// Block-handling mode, set once per proxy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    /// Log the violation and let the stream continue.
    Soft,
    /// Raise and halt the stream.
    Hard,
}

/// Invocation identity: which agent, tenant and Design Boundary this
/// stream is being enforced against.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub agent_id: String,
    pub tenant_id: String,
    pub boundary_id: String,
}

type BlockCallback = Arc<dyn Fn(&gateway_core::IntentEvent, &ComparisonResult) + Send + Sync>;

#[derive(Clone)]
pub struct ProxyOptions {
    pub mode: BlockMode,
    pub on_soft_block: Option<BlockCallback>,
    pub on_violation: Option<BlockCallback>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self { mode: BlockMode::Hard, on_soft_block: None, on_violation: None }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("tool call {tool_name:?} denied: {reason:?}")]
    PermissionDenied { tool_name: String, reason: Option<BlockReason> },
}

/// Wraps a compiled agent graph's already-running state stream, adding
/// per-tool-call enforcement. Holds the state shared *across* invocations
/// for one agent graph: the enforcement client and the per-agent
/// rate-limit counter. The enforced-tool-call-id set lives only for the
/// lifetime of one `wrap` call, matching the "reset on first use per
/// invocation" contract.
pub struct EnforcementProxy<C: EnforcementClient> {
    enforcement: Arc<C>,
    rate_limiter: Arc<AgentRateLimiter>,
}

impl<C: EnforcementClient + 'static> EnforcementProxy<C> {
    pub fn new(enforcement: Arc<C>, rate_limit_window_seconds: u32) -> Self {
        Self { enforcement, rate_limiter: Arc::new(AgentRateLimiter::new(rate_limit_window_seconds)) }
    }

    /// Wrap one invocation's state stream. Every yielded state is forwarded
    /// to the caller after any tool calls it carries have been enforced.
    /// A hard block under `BlockMode::Hard` ends the stream with
    /// `Err(ProxyError::PermissionDenied)`; a soft block or an allow is
    /// logged and the state is forwarded unchanged.
    pub fn wrap<S, G>(
        &self,
        graph_stream: S,
        ctx: InvocationContext,
        options: ProxyOptions,
    ) -> impl Stream<Item = Result<G, ProxyError>>
    where
        S: Stream<Item = G> + Send + 'static,
        G: GraphState,
    {
        let enforcement = Arc::clone(&self.enforcement);
        let rate_limiter = Arc::clone(&self.rate_limiter);

        async_stream::stream! {
            let mut enforced_ids: HashSet<String> = HashSet::new();
            futures_util::pin_mut!(graph_stream);

            while let Some(state) = graph_stream.next().await {
                for call in state.tool_calls() {
                    if enforced_ids.contains(call.id()) {
                        continue;
                    }

                    let rate_limit = rate_limiter.record_call(&ctx.agent_id);
                    let intent = build_intent_event(&ctx.tenant_id, &ctx.agent_id, call, Some(rate_limit));

                    let result = match enforcement.enforce(&intent).await {
                        Effect::Ok(result) => result,
                        Effect::Err(err) => {
                            tracing::warn!(error = %err, tool = call.tool_name(), "enforcement effect failed, blocking");
                            ComparisonResult::block(BlockReason::TransportUnavailable, chrono::Utc::now())
                        }
                        Effect::Retry { reason, .. } => {
                            tracing::warn!(reason = %reason, tool = call.tool_name(), "enforcement requested retry, blocking (proxy does not retry)");
                            ComparisonResult::block(BlockReason::TransportUnavailable, chrono::Utc::now())
                        }
                    };

                    enforced_ids.insert(call.id().to_string());

                    if result.decision == Decision::Block {
                        match options.mode {
                            BlockMode::Soft => {
                                tracing::warn!(tool = call.tool_name(), reason = ?result.reason, "SOFT-BLOCK: tool call denied, continuing");
                                if let Some(cb) = &options.on_soft_block {
                                    cb(&intent, &result);
                                }
                            }
                            BlockMode::Hard => {
                                tracing::warn!(tool = call.tool_name(), reason = ?result.reason, "HARD-BLOCK: tool call denied, halting stream");
                                if let Some(cb) = &options.on_violation {
                                    cb(&intent, &result);
                                }
                                yield Err(ProxyError::PermissionDenied {
                                    tool_name: call.tool_name().to_string(),
                                    reason: result.reason,
                                });
                                return;
                            }
                        }
                    } else {
                        tracing::debug!(tool = call.tool_name(), "tool call allowed");
                    }
                }

                yield Ok(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gateway_core::IntentEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeCall {
        id: String,
        tool_name: String,
        args: serde_json::Value,
    }

    impl FakeCall {
        fn new(id: &str, tool_name: &str) -> Self {
            Self { id: id.to_string(), tool_name: tool_name.to_string(), args: serde_json::json!({}) }
        }
    }

    impl ToolCall for FakeCall {
        fn id(&self) -> &str {
            &self.id
        }
        fn tool_name(&self) -> &str {
            &self.tool_name
        }
        fn tool_args(&self) -> &serde_json::Value {
            &self.args
        }
    }

    struct FakeState {
        calls: Vec<FakeCall>,
    }

    impl GraphState for FakeState {
        type Call = FakeCall;
        fn tool_calls(&self) -> &[FakeCall] {
            &self.calls
        }
    }

    struct FixedClient {
        decision: Decision,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EnforcementClient for FixedClient {
        async fn enforce(&self, _intent: &IntentEvent) -> Effect<ComparisonResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Effect::Ok(ComparisonResult {
                decision: self.decision,
                slice_similarities: [1.0; 4],
                policies_evaluated: 1,
                timestamp: chrono::Utc::now(),
                evidence: Vec::new(),
                reason: if self.decision == Decision::Block { Some(BlockReason::DenyMatched) } else { None },
                drift: None,
                modified_params: None,
                trace: None,
            })
        }
    }

    fn ctx() -> InvocationContext {
        InvocationContext { agent_id: "agent-1".to_string(), tenant_id: "tenant-a".to_string(), boundary_id: "ops".to_string() }
    }

    #[tokio::test]
    async fn allowed_calls_are_forwarded_and_not_re_enforced() {
        let client = Arc::new(FixedClient { decision: Decision::Allow, calls: AtomicUsize::new(0) });
        let proxy = EnforcementProxy::new(client.clone(), 60);

        let states = vec![
            FakeState { calls: vec![FakeCall::new("call-1", "read_file")] },
            FakeState { calls: vec![FakeCall::new("call-1", "read_file")] },
        ];
        let stream = proxy.wrap(futures_util::stream::iter(states), ctx(), ProxyOptions::default());
        futures_util::pin_mut!(stream);

        let mut forwarded = 0;
        while let Some(item) = stream.next().await {
            assert!(item.is_ok());
            forwarded += 1;
        }
        assert_eq!(forwarded, 2);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hard_block_halts_the_stream() {
        let client = Arc::new(FixedClient { decision: Decision::Block, calls: AtomicUsize::new(0) });
        let proxy = EnforcementProxy::new(client, 60);

        let states = vec![FakeState { calls: vec![FakeCall::new("call-1", "delete_record")] }];
        let stream = proxy.wrap(futures_util::stream::iter(states), ctx(), ProxyOptions { mode: BlockMode::Hard, ..Default::default() });
        futures_util::pin_mut!(stream);

        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(ProxyError::PermissionDenied { .. })));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn soft_block_continues_the_stream() {
        let client = Arc::new(FixedClient { decision: Decision::Block, calls: AtomicUsize::new(0) });
        let proxy = EnforcementProxy::new(client, 60);

        let states = vec![FakeState { calls: vec![FakeCall::new("call-1", "delete_record")] }];
        let stream = proxy.wrap(futures_util::stream::iter(states), ctx(), ProxyOptions { mode: BlockMode::Soft, ..Default::default() });
        futures_util::pin_mut!(stream);

        let first = stream.next().await.unwrap();
        assert!(first.is_ok());
    }
}
