//! Gateway Test Utilities
//!
//! Centralized test infrastructure for the gateway workspace:
//! - Proptest generators constrained to the closed vocabulary enums
//! - Fixtures for common Intent Events and Design Boundaries
//! - Custom assertions for gateway-specific validation

// Re-export the mock embedding provider from its source crate.
pub use gateway_embed::MockEmbeddingProvider;

// Re-export core types for convenience.
pub use gateway_core::{
    Action, ActorType, Actor, AggregationMode, ApplicabilityConfig, ApplicabilityMode, Authn,
    BlockReason, ComparisonResult, Constraints, Data, Decision, GatewayConfig, IntentEvent,
    IntentVector, Modification, Policy, PolicyEffect, PolicyStatus, PolicyType, ProviderConfig,
    RateLimitContext, Resource, ResourceType, Risk, Scope, SchemaVersion, Sensitivity, Slice,
    SlotVector, Thresholds, Volume, Weights,
};

use chrono::Utc;
use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating gateway entity types. Every enum
    //! strategy is drawn from the type's own closed `ALL` constant so a new
    //! vocabulary variant is picked up here automatically.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID (for generic id generation, not v7-ordered).
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::Read),
            Just(Action::Write),
            Just(Action::Delete),
            Just(Action::Export),
            Just(Action::Execute),
            Just(Action::Update),
        ]
    }

    pub fn arb_actor_type() -> impl Strategy<Value = ActorType> {
        prop_oneof![
            Just(ActorType::User),
            Just(ActorType::Service),
            Just(ActorType::Llm),
            Just(ActorType::Agent),
        ]
    }

    pub fn arb_resource_type() -> impl Strategy<Value = ResourceType> {
        prop_oneof![
            Just(ResourceType::Database),
            Just(ResourceType::File),
            Just(ResourceType::Api),
        ]
    }

    pub fn arb_sensitivity() -> impl Strategy<Value = Sensitivity> {
        prop_oneof![Just(Sensitivity::Internal), Just(Sensitivity::Public)]
    }

    pub fn arb_volume() -> impl Strategy<Value = Volume> {
        prop_oneof![Just(Volume::Single), Just(Volume::Bulk)]
    }

    pub fn arb_authn() -> impl Strategy<Value = Authn> {
        prop_oneof![Just(Authn::Required), Just(Authn::NotRequired)]
    }

    pub fn arb_actor() -> impl Strategy<Value = Actor> {
        ("[a-z0-9-]{3,20}", arb_actor_type()).prop_map(|(id, actor_type)| Actor { id, actor_type })
    }

    pub fn arb_resource() -> impl Strategy<Value = Resource> {
        (arb_resource_type(), prop::option::of("[a-z0-9_./-]{1,40}"))
            .prop_map(|(resource_type, name)| Resource { resource_type, name, location: None })
    }

    pub fn arb_data() -> impl Strategy<Value = Data> {
        (prop::collection::vec(arb_sensitivity(), 1..=2), any::<bool>(), arb_volume())
            .prop_map(|(sensitivity, pii, volume)| Data { sensitivity, pii, volume })
    }

    pub fn arb_risk() -> impl Strategy<Value = Risk> {
        arb_authn().prop_map(|authn| Risk { authn })
    }

    /// Generate an Intent Event for a fixed tenant, with every closed-vocab
    /// field drawn independently.
    pub fn arb_intent_event(tenant_id: impl Into<String> + Clone) -> impl Strategy<Value = IntentEvent> {
        let tenant_id = tenant_id.into();
        (arb_actor(), arb_action(), arb_resource(), arb_data(), arb_risk()).prop_map(
            move |(actor, action, resource, data, risk)| IntentEvent {
                id: Uuid::nil(),
                tenant_id: tenant_id.clone(),
                schema_version: SchemaVersion::V1_3,
                timestamp: Utc::now(),
                actor,
                action,
                resource,
                data,
                risk,
                layer: None,
                tool_name: None,
                tool_method: None,
                tool_params: None,
                rate_limit: None,
            },
        )
    }

    /// Generate per-slice thresholds, each independently in `[0, 1]`.
    pub fn arb_thresholds() -> impl Strategy<Value = Thresholds> {
        (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0)
            .prop_map(|(action, resource, data, risk)| Thresholds { action, resource, data, risk })
    }

    pub fn arb_constraints() -> impl Strategy<Value = Constraints> {
        (
            prop::collection::vec(arb_action(), 0..=3),
            prop::collection::vec(arb_actor_type(), 0..=2),
            prop::collection::vec(arb_resource_type(), 0..=2),
        )
            .prop_map(|(actions, actor_types, resource_types)| Constraints {
                actions,
                actor_types,
                resource_types,
                ..Default::default()
            })
    }

    /// Generate a policy's aggregation mode.
    pub fn arb_aggregation_mode() -> impl Strategy<Value = AggregationMode> {
        prop_oneof![Just(AggregationMode::Min), Just(AggregationMode::WeightedAvg)]
    }

    /// Generate a random, unit-or-zero slot vector for one semantic slice.
    pub fn arb_slot_vector() -> impl Strategy<Value = SlotVector> {
        prop::collection::vec(-1.0f32..=1.0f32, gateway_core::SLOT_DIM).prop_map(|v| {
            let raw: [f32; gateway_core::SLOT_DIM] = v.try_into().expect("fixed-length strategy");
            SlotVector::from_raw(raw)
        })
    }

    /// Generate a random Intent Vector by composing four independent slot
    /// vectors.
    pub fn arb_intent_vector() -> impl Strategy<Value = IntentVector> {
        (arb_slot_vector(), arb_slot_vector(), arb_slot_vector(), arb_slot_vector())
            .prop_map(|(action, resource, data, risk)| IntentVector { action, resource, data, risk })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common enforcement scenarios.

    use super::*;

    /// A default, low-risk read Intent Event for the given tenant.
    pub fn sample_intent_event(tenant_id: impl Into<String>) -> IntentEvent {
        IntentEvent {
            id: Uuid::nil(),
            tenant_id: tenant_id.into(),
            schema_version: SchemaVersion::V1_3,
            timestamp: Utc::now(),
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
        }
    }

    /// A high-risk Intent Event: bulk PII delete against a database,
    /// unauthenticated. Useful for exercising deny policies.
    pub fn risky_intent_event(tenant_id: impl Into<String>) -> IntentEvent {
        IntentEvent {
            action: Action::Delete,
            resource: Resource { resource_type: ResourceType::Database, name: Some("accounts".to_string()), location: None },
            data: Data { sensitivity: vec![Sensitivity::Internal], pii: true, volume: Volume::Bulk },
            risk: Risk { authn: Authn::NotRequired },
            ..sample_intent_event(tenant_id)
        }
    }

    /// A minimal, always-applicable deny policy matching every intent with
    /// the given tenant: zero thresholds and no constraints to abstain on.
    pub fn deny_everything_policy(tenant_id: impl Into<String>) -> Policy {
        let now = Utc::now();
        Policy {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            name: "deny-everything".to_string(),
            status: PolicyStatus::Active,
            effect: PolicyEffect::Deny,
            policy_type: PolicyType::Optional,
            priority: 0,
            thresholds: Thresholds { action: 0.0, resource: 0.0, data: 0.0, risk: 0.0 },
            weights: Weights::default(),
            aggregation_mode: AggregationMode::Min,
            global_threshold: None,
            constraints: Constraints {
                actions: Action::ALL.to_vec(),
                actor_types: ActorType::ALL.to_vec(),
                resource_types: ResourceType::ALL.to_vec(),
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

    /// A mandatory allow policy constrained to read-only, non-PII access.
    pub fn mandatory_read_only_allow_policy(tenant_id: impl Into<String>) -> Policy {
        let now = Utc::now();
        Policy {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            name: "allow-read-only".to_string(),
            status: PolicyStatus::Active,
            effect: PolicyEffect::Allow,
            policy_type: PolicyType::Mandatory,
            priority: 0,
            thresholds: Thresholds { action: 0.5, resource: 0.5, data: 0.5, risk: 0.5 },
            weights: Weights::default(),
            aggregation_mode: AggregationMode::Min,
            global_threshold: None,
            constraints: Constraints { actions: vec![Action::Read], ..Default::default() },
            scope: Scope::default(),
            drift_threshold: None,
            modification: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A unit slot vector with a single `1.0` at `axis`, zero elsewhere.
    pub fn unit_slot(axis: usize) -> SlotVector {
        let mut raw = [0.0f32; gateway_core::SLOT_DIM];
        if axis < raw.len() {
            raw[axis] = 1.0;
        }
        SlotVector::from_raw(raw)
    }

    /// An Intent Vector with every slice equal to the same unit slot vector.
    pub fn unit_intent_vector(axis: usize) -> IntentVector {
        let slot = unit_slot(axis);
        IntentVector { action: slot, resource: slot, data: slot, risk: slot }
    }

    /// A provider config good enough to pass `GatewayConfig::validate`.
    pub fn sample_provider_config() -> ProviderConfig {
        ProviderConfig { provider_type: "mock".to_string(), endpoint: None, model: "mock-embed".to_string(), dimensions: 384 }
    }

    /// A fully valid gateway configuration, built from `sample_provider_config`.
    pub fn sample_gateway_config() -> GatewayConfig {
        GatewayConfig::default_for(sample_provider_config())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for gateway-specific validation.

    use super::*;

    #[track_caller]
    pub fn assert_allow(result: &ComparisonResult) {
        assert_eq!(result.decision, Decision::Allow, "expected ALLOW, got: {:?}", result);
    }

    #[track_caller]
    pub fn assert_block(result: &ComparisonResult) {
        assert_eq!(result.decision, Decision::Block, "expected BLOCK, got: {:?}", result);
    }

    #[track_caller]
    pub fn assert_blocked_with_reason(result: &ComparisonResult, reason: BlockReason) {
        assert_block(result);
        assert_eq!(result.reason, Some(reason), "wrong block reason on: {:?}", result);
    }

    #[track_caller]
    pub fn assert_slot_is_unit_or_zero(slot: &SlotVector) {
        assert!(slot.is_unit_or_zero(), "slot vector is neither unit nor zero: norm={}", slot.norm());
    }

    #[track_caller]
    pub fn assert_intent_vector_norm(vector: &IntentVector, expected: f32, tolerance: f32) {
        let norm = vector.norm();
        assert!(
            (norm - expected).abs() <= tolerance,
            "intent vector norm {} not within {} of expected {}",
            norm,
            tolerance,
            expected
        );
    }

    #[track_caller]
    pub fn assert_similarity_in_range(similarity: f32, min: f32, max: f32) {
        assert!(similarity >= min && similarity <= max, "similarity {} not in range [{}, {}]", similarity, min, max);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sample_intent_event_round_trips_as_json() {
        let event = fixtures::sample_intent_event("tenant-a");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["tenant_id"], "tenant-a");
        assert!(json.get("tool_name").is_none());
    }

    #[test]
    fn risky_intent_event_flags_pii_and_bulk() {
        let event = fixtures::risky_intent_event("tenant-a");
        assert!(event.data.pii);
        assert_eq!(event.data.volume, Volume::Bulk);
        assert_eq!(event.action, Action::Delete);
    }

    #[test]
    fn deny_everything_policy_has_zero_thresholds() {
        let policy = fixtures::deny_everything_policy("tenant-a");
        assert!(policy.is_deny());
        assert_eq!(policy.thresholds.as_array(), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn mandatory_read_only_allow_policy_is_mandatory_allow() {
        let policy = fixtures::mandatory_read_only_allow_policy("tenant-a");
        assert!(policy.is_mandatory_allow());
    }

    #[test]
    fn unit_intent_vector_has_norm_two() {
        let vector = fixtures::unit_intent_vector(0);
        assertions::assert_intent_vector_norm(&vector, 2.0, 1e-5);
    }

    #[test]
    fn sample_gateway_config_validates() {
        let config = fixtures::sample_gateway_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn assert_blocked_with_reason_accepts_matching_reason() {
        let result = ComparisonResult::block(BlockReason::NoApplicablePolicy, Utc::now());
        assertions::assert_blocked_with_reason(&result, BlockReason::NoApplicablePolicy);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_intent_event_keeps_tenant(event in generators::arb_intent_event("tenant-a")) {
            prop_assert_eq!(event.tenant_id, "tenant-a");
        }

        #[test]
        fn prop_generated_slot_vector_is_unit_or_zero(slot in generators::arb_slot_vector()) {
            prop_assert!(slot.is_unit_or_zero());
        }

        #[test]
        fn prop_generated_intent_vector_norm_at_most_two(vector in generators::arb_intent_vector()) {
            prop_assert!(vector.norm() <= 2.0 + 1e-4);
        }

        #[test]
        fn prop_generated_thresholds_are_in_range(thresholds in generators::arb_thresholds()) {
            prop_assert!(thresholds.is_valid());
        }
    }
}
