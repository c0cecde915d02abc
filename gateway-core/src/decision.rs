//! Applicability Result and Comparison Result: the ephemeral and
//! per-call outputs of the enforcement engine (C4).

use crate::policy::{Modification, PolicyEffect};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a verdict was ALLOW or BLOCK. Wire shape is numeric
/// (`0`=BLOCK, `1`=ALLOW) per the resolved "final_decision wire shape"
/// open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = u8))]
#[repr(u8)]
pub enum Decision {
    Block = 0,
    Allow = 1,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl Serialize for Decision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Decision::Block),
            1 => Ok(Decision::Allow),
            other => Err(serde::de::Error::custom(format!(
                "invalid decision value: {other}, expected 0 or 1"
            ))),
        }
    }
}

/// A closed reason code for why a Comparison Result came out the way it
/// did, distinct from the per-policy evidence list so a caller can tell
/// "a policy said no" from "the gateway couldn't decide" without parsing
/// evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// A deny policy's local decision matched and short-circuited.
    DenyMatched,
    /// The applicability filter admitted no candidate policies.
    NoApplicablePolicy,
    /// C2 encoding of the intent failed.
    EncodingFailed,
    /// The enforcement RPC transport was unavailable or timed out.
    TransportUnavailable,
    /// At least one mandatory allow policy's local decision was 0.
    MandatoryAllowUnmet,
}

/// The family a rule in the applicability filter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Core,
    Soft,
}

/// A single rule's verdict within the applicability filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RuleVerdict {
    Match,
    Mismatch,
    /// Neither the policy nor the intent constrains this field.
    Abstain,
}

/// One rule's contribution to an applicability evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleOutcome {
    pub rule_id: String,
    pub kind: RuleKind,
    pub weight: f32,
    pub verdict: RuleVerdict,
}

/// Whether an (intent, policy) pair is in play for similarity scoring.
/// Ephemeral — recomputed on every enforcement call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApplicabilityResult {
    pub applicable: bool,
    pub score: f32,
    pub outcomes: Vec<RuleOutcome>,
}

impl ApplicabilityResult {
    pub fn not_applicable(outcomes: Vec<RuleOutcome>) -> Self {
        Self { applicable: false, score: 0.0, outcomes }
    }
}

/// One policy's contribution to a Comparison Result's evidence list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EvidenceEntry {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub policy_id: Uuid,
    pub policy_name: String,
    pub effect: PolicyEffect,
    /// 1 if this policy's local decision was a match, 0 otherwise.
    pub local_decision: u8,
    /// [action, resource, data, risk] in that fixed order.
    pub slice_similarities: [f32; 4],
    /// This policy's declared side effect, forwarded unevaluated; C4 never
    /// interprets it, only carries it into evidence for C6 to act on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification: Option<Modification>,
}

/// One step of the optional debug trace, carrying no decision weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TraceStep {
    pub label: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub detail: serde_json::Value,
}

/// Per-intent verdict produced by the enforcement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComparisonResult {
    pub decision: Decision,
    /// [action, resource, data, risk] in that fixed order.
    pub slice_similarities: [f32; 4],
    pub policies_evaluated: usize,
    pub timestamp: DateTime<Utc>,
    pub evidence: Vec<EvidenceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub modified_params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceStep>>,
}

impl ComparisonResult {
    pub fn block(reason: BlockReason, timestamp: DateTime<Utc>) -> Self {
        Self {
            decision: Decision::Block,
            slice_similarities: [0.0; 4],
            policies_evaluated: 0,
            timestamp,
            evidence: Vec::new(),
            reason: Some(reason),
            drift: None,
            modified_params: None,
            trace: None,
        }
    }
}
