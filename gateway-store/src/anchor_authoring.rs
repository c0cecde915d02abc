//! LLM-assisted anchor authoring: a write-path convenience for operators
//! installing a Design Boundary from free-text notes, not a decision-time
//! dependency. Gated behind the `anchor-authoring` feature so a deployment
//! that never installs policies interactively can skip it entirely.
//!
//! The reference implementation calls an LLM to propose per-slice anchor
//! text from a rule's free-text notes. Wiring an actual LLM client is a
//! deployment concern, so this only ships the trait seam plus a
//! deterministic fallback that derives anchor text straight from a
//! policy's `Constraints` via the canonical vocabulary templates — the
//! same anchor text C2 would assemble for a matching Intent Event.

use async_trait::async_trait;
use gateway_core::{Constraints, Policy, RuleVector, Slice};
use gateway_encoder::{EncodeError, RuleAnchorTexts, SemanticEncoder};
use gateway_vocab::VOCABULARY;
use std::collections::BTreeMap;

/// Per-slice candidate anchor text for a policy under authoring, before
/// encoding. An operator reviews and edits these before install.
#[derive(Debug, Clone, Default)]
pub struct AnchorTextProposal {
    pub action: Vec<String>,
    pub resource: Vec<String>,
    pub data: Vec<String>,
    pub risk: Vec<String>,
}

#[async_trait]
pub trait AnchorTextGenerator: Send + Sync {
    async fn propose(&self, policy: &Policy) -> AnchorTextProposal;
}

/// Deterministic fallback: one anchor per distinct constraint value,
/// rendered through the same templates the encoder uses for live intents.
/// Does not call an LLM — `nl_notes`-driven generation is left to whatever
/// implements `AnchorTextGenerator` in front of a real model.
pub struct ConstraintAnchorGenerator;

#[async_trait]
impl AnchorTextGenerator for ConstraintAnchorGenerator {
    async fn propose(&self, policy: &Policy) -> AnchorTextProposal {
        let c = &policy.constraints;
        AnchorTextProposal {
            action: action_anchors(c),
            resource: resource_anchors(c),
            data: data_anchors(c),
            risk: risk_anchors(c),
        }
    }
}

/// A constrained field's values for crossing into a cartesian product. An
/// empty list stands for "unconstrained" and contributes exactly one pass
/// with `placeholder`, rather than vanishing from the product entirely.
fn product_values<T>(values: &[T], placeholder: Option<String>, render: impl Fn(&T) -> String) -> Vec<Option<String>> {
    if values.is_empty() {
        return vec![placeholder];
    }
    values.iter().map(|v| Some(render(v))).collect()
}

fn action_anchors(c: &Constraints) -> Vec<String> {
    let actor_types = product_values(&c.actor_types, Some("agent".to_string()), |a| enum_str(a));
    let mut anchors = Vec::with_capacity(c.actions.len() * actor_types.len());
    for action in &c.actions {
        for actor_type in &actor_types {
            let mut fields = BTreeMap::new();
            fields.insert("action".to_string(), enum_str(action));
            if let Some(actor_type) = actor_type {
                fields.insert("actor_type".to_string(), actor_type.clone());
            }
            if let Ok(anchor) = VOCABULARY.assemble_anchor(Slice::Action, &fields) {
                anchors.push(anchor);
            }
        }
    }
    anchors
}

fn resource_anchors(c: &Constraints) -> Vec<String> {
    if c.resource_types.is_empty() {
        return Vec::new();
    }
    let locations = product_values(&c.resource_locations, None, |s| s.clone());
    let names = product_values(&c.resource_names, None, |s| s.clone());
    let mut anchors = Vec::with_capacity(c.resource_types.len() * locations.len() * names.len());
    for rt in &c.resource_types {
        for location in &locations {
            for name in &names {
                let mut fields = BTreeMap::new();
                fields.insert("resource_type".to_string(), enum_str(rt));
                if let Some(location) = location {
                    fields.insert("resource_location".to_string(), location.clone());
                }
                if let Some(name) = name {
                    fields.insert("resource_name".to_string(), name.clone());
                }
                if let Ok(anchor) = VOCABULARY.assemble_anchor(Slice::Resource, &fields) {
                    if !anchor.is_empty() {
                        anchors.push(anchor);
                    }
                }
            }
        }
    }
    anchors
}

fn data_anchors(c: &Constraints) -> Vec<String> {
    if c.sensitivity.is_empty() {
        return Vec::new();
    }
    let volumes = product_values(&c.volume, Some(enum_str(&gateway_core::Volume::Single)), |v| enum_str(v));
    let mut anchors = Vec::with_capacity(c.sensitivity.len() * volumes.len());
    for s in &c.sensitivity {
        for volume in &volumes {
            let mut fields = BTreeMap::new();
            fields.insert("sensitivity".to_string(), enum_str(s));
            fields.insert("pii".to_string(), c.pii.unwrap_or(false).to_string());
            if let Some(volume) = volume {
                fields.insert("volume".to_string(), volume.clone());
            }
            if let Ok(anchor) = VOCABULARY.assemble_anchor(Slice::Data, &fields) {
                if !anchor.is_empty() {
                    anchors.push(anchor);
                }
            }
        }
    }
    anchors
}

fn risk_anchors(c: &Constraints) -> Vec<String> {
    c.authn
        .iter()
        .map(|authn| {
            let mut fields = BTreeMap::new();
            fields.insert("authn".to_string(), enum_str(authn));
            VOCABULARY.assemble_anchor(Slice::Risk, &fields).unwrap_or_default()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Proposes anchor text from `policy.constraints` and encodes it into a
/// real Rule Vector, the non-test path an operator's install flow calls
/// after reviewing (and possibly editing) the generator's proposal.
pub async fn propose_rule_vector<P: gateway_embed::EmbeddingProvider>(
    policy: &Policy,
    generator: &dyn AnchorTextGenerator,
    encoder: &SemanticEncoder<P>,
) -> Result<RuleVector, EncodeError> {
    let proposal = generator.propose(policy).await;
    let anchors = RuleAnchorTexts {
        action: proposal.action,
        resource: proposal.resource,
        data: proposal.data,
        risk: proposal.risk,
    };
    encoder.encode_rule_vector(&anchors).await
}

fn enum_str<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value).expect("enum serialization is infallible") {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gateway_core::{Action, AggregationMode, PolicyEffect, PolicyStatus, PolicyType, Scope, Thresholds, Weights};
    use uuid::Uuid;

    fn policy_with(constraints: Constraints) -> Policy {
        let now = Utc::now();
        Policy {
            id: Uuid::nil(),
            tenant_id: "tenant-a".to_string(),
            name: "boundary".to_string(),
            status: PolicyStatus::Active,
            effect: PolicyEffect::Deny,
            policy_type: PolicyType::Optional,
            priority: 0,
            thresholds: Thresholds { action: 0.5, resource: 0.5, data: 0.5, risk: 0.5 },
            weights: Weights::default(),
            aggregation_mode: AggregationMode::Min,
            global_threshold: None,
            constraints,
            scope: Scope::default(),
            drift_threshold: None,
            modification: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn proposes_one_action_anchor_per_constrained_action() {
        let constraints = Constraints { actions: vec![Action::Delete, Action::Export], ..Default::default() };
        let proposal = ConstraintAnchorGenerator.propose(&policy_with(constraints)).await;
        assert_eq!(proposal.action.len(), 2);
        assert!(proposal.action[0].contains("delete"));
    }

    #[tokio::test]
    async fn empty_constraints_propose_no_anchors() {
        let proposal = ConstraintAnchorGenerator.propose(&policy_with(Constraints::default())).await;
        assert!(proposal.action.is_empty());
        assert!(proposal.resource.is_empty());
    }

    #[tokio::test]
    async fn action_anchors_cross_actions_with_actor_types() {
        let constraints = Constraints {
            actions: vec![Action::Delete, Action::Export],
            actor_types: vec![gateway_core::ActorType::Agent, gateway_core::ActorType::Human],
            ..Default::default()
        };
        let proposal = ConstraintAnchorGenerator.propose(&policy_with(constraints)).await;
        assert_eq!(proposal.action.len(), 4);
    }

    #[tokio::test]
    async fn action_anchor_set_is_order_independent() {
        let forward = Constraints {
            actions: vec![Action::Delete],
            actor_types: vec![gateway_core::ActorType::Agent, gateway_core::ActorType::Human],
            ..Default::default()
        };
        let mut reversed = forward.clone();
        reversed.actor_types.reverse();

        let mut forward_anchors = ConstraintAnchorGenerator.propose(&policy_with(forward)).await.action;
        let mut reversed_anchors = ConstraintAnchorGenerator.propose(&policy_with(reversed)).await.action;
        forward_anchors.sort();
        reversed_anchors.sort();
        assert_eq!(forward_anchors, reversed_anchors);
    }
}
