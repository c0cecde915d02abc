//! Enforcement transport seam. The streaming proxy calls enforcement either
//! in-process or over RPC depending on deployment. The trait's boundary
//! type is [`gateway_core::Effect`]: a BLOCK verdict is a domain outcome
//! carried as an ordinary `Effect::Ok(ComparisonResult)` (it's already
//! persisted as evidence and replayed to the caller), while a transport
//! timeout or unavailable endpoint is an operational effect that never
//! itself becomes structured evidence — the proxy fails closed on it
//! instead. Callers on the far side of a real transport still map
//! timeouts/unavailability into [`EnforcementTransportError`] first, then
//! lift it into an `Effect::Err` via [`transport_error_effect`].

use async_trait::async_trait;
use gateway_core::{ComparisonResult, Effect, ErrorEffect, IntentEvent, OperationalError};

#[derive(Debug, thiserror::Error)]
pub enum EnforcementTransportError {
    #[error("enforcement call exceeded its deadline")]
    DeadlineExceeded,
    #[error("enforcement endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Lifts a transport failure into the `ErrorEffect` carried at the C4->C6
/// boundary. A plain function rather than a `From` impl: `ErrorEffect` is
/// defined in `gateway-core`, so a `From<EnforcementTransportError>` impl
/// here would be a foreign trait over a foreign type and rejected by the
/// orphan rule.
pub fn transport_error_effect(err: EnforcementTransportError) -> ErrorEffect {
    match err {
        EnforcementTransportError::DeadlineExceeded => {
            ErrorEffect::Operational(OperationalError::Timeout { operation: "enforce".to_string() })
        }
        EnforcementTransportError::Unavailable(reason) => ErrorEffect::Operational(OperationalError::Unavailable { resource: reason }),
    }
}

#[async_trait]
pub trait EnforcementClient: Send + Sync {
    async fn enforce(&self, intent: &IntentEvent) -> Effect<ComparisonResult>;
}

/// In-process enforcement: wraps a local [`gateway_engine::EnforcementEngine`]
/// directly, skipping any RPC. `EnforcementEngine::evaluate` never fails, so
/// this impl never returns `Effect::Err` — it exists purely so the proxy's
/// interception loop doesn't need to special-case the in-process
/// deployment mode against a remote one.
pub struct LocalEnforcementClient<P: gateway_embed::EmbeddingProvider> {
    engine: std::sync::Arc<gateway_engine::EnforcementEngine<P>>,
}

impl<P: gateway_embed::EmbeddingProvider> LocalEnforcementClient<P> {
    pub fn new(engine: std::sync::Arc<gateway_engine::EnforcementEngine<P>>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<P: gateway_embed::EmbeddingProvider> EnforcementClient for LocalEnforcementClient<P> {
    async fn enforce(&self, intent: &IntentEvent) -> Effect<ComparisonResult> {
        Effect::Ok(self.engine.evaluate(intent).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{
        Action, ActorType, Actor, ApplicabilityConfig, ApplicabilityMode, Authn, Data, Resource, ResourceType, Risk, SchemaVersion,
        Sensitivity, Volume,
    };
    use gateway_embed::MockEmbeddingProvider;
    use gateway_encoder::SemanticEncoder;
    use gateway_session::{SessionConfig, SessionStore};
    use gateway_store::PolicyStore;
    use std::sync::Arc;
    use uuid::Uuid;

    fn session_store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(SessionConfig {
            idle_timeout: chrono::Duration::minutes(30),
            absolute_timeout: chrono::Duration::hours(24),
            sweep_interval: std::time::Duration::from_secs(300),
            max_call_history: 50,
        }))
    }

    #[tokio::test]
    async fn local_client_allows_with_no_policies_installed() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 384));
        let encoder = Arc::new(SemanticEncoder::new(provider, 16));
        let store = Arc::new(PolicyStore::new());
        let engine = Arc::new(gateway_engine::EnforcementEngine::new(
            encoder,
            store,
            ApplicabilityConfig { mode: ApplicabilityMode::Soft, min_score: 0.5 },
            session_store(),
        ));
        let client = LocalEnforcementClient::new(engine);

        let event = IntentEvent {
            id: Uuid::nil(),
            tenant_id: "tenant-a".to_string(),
            schema_version: SchemaVersion::V1_3,
            timestamp: chrono::Utc::now(),
            actor: Actor { id: "agent-1".to_string(), actor_type: ActorType::Agent },
            action: Action::Read,
            resource: Resource { resource_type: ResourceType::File, name: None, location: None },
            data: Data { sensitivity: vec![Sensitivity::Internal], pii: false, volume: Volume::Single },
            risk: Risk { authn: Authn::NotRequired },
            layer: None,
            tool_name: None,
            tool_method: None,
            tool_params: None,
            rate_limit: None,
        };

        let result = client.enforce(&event).await.unwrap();
        assert_eq!(result.decision, gateway_core::Decision::Allow);
    }
}
