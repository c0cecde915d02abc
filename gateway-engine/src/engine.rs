//! Enforcement engine: the hottest path in the system. For one intent,
//! selects applicable policies from the store, scores them against their
//! anchors, and emits a verdict.

use std::sync::Arc;

use chrono::Utc;
use gateway_core::{ApplicabilityConfig, BlockReason, CallRecord, ComparisonResult, IntentEvent, IntentVector};
use gateway_embed::EmbeddingProvider;
use gateway_encoder::SemanticEncoder;
use gateway_session::SessionStore;
use gateway_store::PolicyStore;

use crate::aggregation::{aggregate, Evaluated};
use crate::applicability::evaluate_applicability;
use crate::decision::slice_similarities;

pub struct EnforcementEngine<P: EmbeddingProvider> {
    encoder: Arc<SemanticEncoder<P>>,
    store: Arc<PolicyStore>,
    applicability: ApplicabilityConfig,
    sessions: Arc<SessionStore>,
}

impl<P: EmbeddingProvider> EnforcementEngine<P> {
    pub fn new(
        encoder: Arc<SemanticEncoder<P>>,
        store: Arc<PolicyStore>,
        applicability: ApplicabilityConfig,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self { encoder, store, applicability, sessions }
    }

    /// Evaluate a single intent against the active policies installed for
    /// its tenant, returning the resulting Comparison Result. Never returns
    /// an error: every failure mode resolves to a BLOCK with a `reason`.
    /// On any outcome that reaches an encoded Intent Vector, the call is
    /// also recorded against the actor's session so cumulative drift keeps
    /// advancing regardless of whether this particular call was allowed.
    #[tracing::instrument(skip(self, intent), fields(tenant_id = %intent.tenant_id, action = ?intent.action))]
    pub async fn evaluate(&self, intent: &IntentEvent) -> ComparisonResult {
        let timestamp = Utc::now();

        let intent_vector = match self.encoder.encode_intent(intent).await {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(error = %err, "intent encoding failed, blocking");
                return ComparisonResult::block(BlockReason::EncodingFailed, timestamp);
            }
        };

        let mut result = self.decide(intent, &intent_vector, timestamp);

        let record = CallRecord { request_id: intent.id, action: intent.action, decision: result.decision, timestamp };
        let update = self
            .sessions
            .record_call(&intent.tenant_id, &intent.actor.id, intent_vector, record, timestamp)
            .await;
        result.drift = Some(update.cumulative_drift);

        result
    }

    fn decide(&self, intent: &IntentEvent, intent_vector: &IntentVector, timestamp: chrono::DateTime<Utc>) -> ComparisonResult {
        let active_policies = self.store.active_policies(&intent.tenant_id);
        if active_policies.is_empty() {
            tracing::warn!(tenant_id = %intent.tenant_id, "no policies configured for tenant, allowing by default");
            return gateway_core::ComparisonResult {
                decision: gateway_core::Decision::Allow,
                slice_similarities: [0.0; 4],
                policies_evaluated: 0,
                timestamp,
                evidence: Vec::new(),
                reason: None,
                drift: None,
                modified_params: None,
                trace: None,
            };
        }

        let mut evaluated = Vec::new();
        for record in &active_policies {
            let applicability = evaluate_applicability(intent, &record.policy, &self.applicability);
            if !applicability.applicable {
                continue;
            }
            let similarities = slice_similarities(intent_vector, &record.anchors);
            evaluated.push(Evaluated { policy: &record.policy, similarities });
        }

        if evaluated.is_empty() {
            tracing::debug!(tenant_id = %intent.tenant_id, "no applicable policies for this intent");
            return ComparisonResult::block(BlockReason::NoApplicablePolicy, timestamp);
        }

        aggregate(&evaluated, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gateway_core::{
        Action, ActorType, Actor, AggregationMode, ApplicabilityMode, Authn, Constraints, Data, PolicyEffect, PolicyStatus, PolicyType, Resource,
        Risk, Scope, SchemaVersion, Sensitivity, Thresholds, Volume, Weights,
    };
    use gateway_embed::MockEmbeddingProvider;
    use gateway_session::{SessionConfig, SessionStore};
    use uuid::Uuid;

    fn session_store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(SessionConfig {
            idle_timeout: chrono::Duration::minutes(30),
            absolute_timeout: chrono::Duration::hours(24),
            sweep_interval: std::time::Duration::from_secs(300),
            max_call_history: 50,
        }))
    }

    fn event() -> IntentEvent {
        IntentEvent {
            id: Uuid::nil(),
            tenant_id: "tenant-a".to_string(),
            schema_version: SchemaVersion::V1_3,
            timestamp: Utc::now(),
            actor: Actor { id: "agent-1".to_string(), actor_type: ActorType::Agent },
            action: Action::Delete,
            resource: Resource { resource_type: gateway_core::ResourceType::Database, name: Some("accounts".to_string()), location: None },
            data: Data { sensitivity: vec![Sensitivity::Internal], pii: true, volume: Volume::Single },
            risk: Risk { authn: Authn::Required },
            layer: None,
            tool_name: None,
            tool_method: None,
            tool_params: None,
            rate_limit: None,
        }
    }

    fn deny_everything_policy() -> gateway_core::Policy {
        let now = Utc::now();
        gateway_core::Policy {
            id: Uuid::new_v4(),
            tenant_id: "tenant-a".to_string(),
            name: "deny-deletes".to_string(),
            status: PolicyStatus::Active,
            effect: PolicyEffect::Deny,
            policy_type: PolicyType::Optional,
            priority: 0,
            thresholds: Thresholds { action: 0.0, resource: 0.0, data: 0.0, risk: 0.0 },
            weights: Weights::default(),
            aggregation_mode: AggregationMode::Min,
            global_threshold: None,
            constraints: Constraints {
                actions: vec![Action::Delete],
                actor_types: vec![ActorType::Agent],
                resource_types: vec![gateway_core::ResourceType::Database],
                ..Default::default()
            },
            scope: Scope::default(),
            drift_threshold: None,
            modification: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn empty_store_allows_by_default() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 384));
        let encoder = Arc::new(SemanticEncoder::new(provider, 16));
        let store = Arc::new(PolicyStore::new());
        let engine =
            EnforcementEngine::new(encoder, store, ApplicabilityConfig { mode: ApplicabilityMode::Soft, min_score: 0.5 }, session_store());

        let result = engine.evaluate(&event()).await;
        assert_eq!(result.decision, gateway_core::Decision::Allow);
        assert!(result.evidence.is_empty());
        assert_eq!(result.drift, Some(0.0));
    }

    #[tokio::test]
    async fn matching_deny_policy_blocks() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 384));
        let encoder = Arc::new(SemanticEncoder::new(Arc::clone(&provider), 16));
        let store = Arc::new(PolicyStore::new());

        let policy = deny_everything_policy();
        let anchor_texts = gateway_encoder::RuleAnchorTexts {
            action: vec!["delete resources as an agent".to_string()],
            resource: vec![],
            data: vec![],
            risk: vec![],
        };
        let anchors = encoder.encode_rule_vector(&anchor_texts).await.unwrap();
        store.install(policy, anchors);

        let engine =
            EnforcementEngine::new(encoder, store, ApplicabilityConfig { mode: ApplicabilityMode::Soft, min_score: 0.5 }, session_store());
        let result = engine.evaluate(&event()).await;
        assert_eq!(result.decision, gateway_core::Decision::Block);
        assert_eq!(result.reason, Some(BlockReason::DenyMatched));
        assert_eq!(result.drift, Some(0.0));
    }

    #[tokio::test]
    async fn repeated_calls_accumulate_drift_on_the_same_session() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 384));
        let encoder = Arc::new(SemanticEncoder::new(provider, 16));
        let store = Arc::new(PolicyStore::new());
        let engine =
            EnforcementEngine::new(encoder, store, ApplicabilityConfig { mode: ApplicabilityMode::Soft, min_score: 0.5 }, session_store());

        let first = engine.evaluate(&event()).await;
        assert_eq!(first.drift, Some(0.0));

        let mut other = event();
        other.action = Action::Read;
        other.resource.resource_type = gateway_core::ResourceType::File;
        let second = engine.evaluate(&other).await;
        assert!(second.drift.unwrap() >= first.drift.unwrap());
    }
}
