//! Design Boundary / Policy: a tenant-owned predicate over intents,
//! expressed as per-slice allowed-value constraints and thresholds.

use crate::config::AggregationMode;
use crate::intent::{Action, ActorType, Authn, ResourceType, Sensitivity, Volume};
use crate::vector::NUM_SLICES;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    Disabled,
}

/// Whether a policy permits or forbids the intents it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    Allow,
    Deny,
}

/// Whether an allow policy is required for an enforcement call to succeed,
/// or merely evaluated for evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Mandatory,
    Optional,
}

/// A closed set of allowed values for one slice of a policy's constraint.
/// Every field is independently optional: an absent constraint means the
/// applicability filter abstains rather than matches or mismatches on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actor_types: Vec<ActorType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<ResourceType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitivity: Vec<Sensitivity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pii: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume: Vec<Volume>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authn: Vec<Authn>,
}

/// A policy's domain scope, consulted by the applicability filter's
/// `DomainRule`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
}

/// Per-slice thresholds, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Thresholds {
    pub action: f32,
    pub resource: f32,
    pub data: f32,
    pub risk: f32,
}

impl Thresholds {
    pub fn as_array(&self) -> [f32; NUM_SLICES] {
        [self.action, self.resource, self.data, self.risk]
    }

    pub fn is_valid(&self) -> bool {
        self.as_array().iter().all(|t| t.is_finite() && (0.0..=1.0).contains(t))
    }
}

/// Per-slice weights used by `weighted-avg` aggregation. Defaults to 1 for
/// every slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Weights {
    pub action: f32,
    pub resource: f32,
    pub data: f32,
    pub risk: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self { action: 1.0, resource: 1.0, data: 1.0, risk: 1.0 }
    }
}

impl Weights {
    pub fn as_array(&self) -> [f32; NUM_SLICES] {
        [self.action, self.resource, self.data, self.risk]
    }

    pub fn is_valid(&self) -> bool {
        self.as_array().iter().all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// A side effect the enforcement caller (C6) may apply on ALLOW. Opaque to
/// the decision algorithm itself — C4 only forwards it in evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Modification {
    RedactField { path: String },
    ClampVolume { max: u64 },
    RequireApproval,
}

/// Owned entity: a tenant-scoped predicate over intents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Policy {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub status: PolicyStatus,
    pub effect: PolicyEffect,
    pub policy_type: PolicyType,
    pub priority: i32,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub weights: Weights,
    pub aggregation_mode: AggregationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_threshold: Option<f32>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification: Option<Modification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    /// True if this policy requires ALLOW to proceed (a mandatory allow),
    /// distinguishing it from optional-allow (evidence only) and deny
    /// policies entirely.
    pub fn is_mandatory_allow(&self) -> bool {
        matches!(self.effect, PolicyEffect::Allow) && matches!(self.policy_type, PolicyType::Mandatory)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self.effect, PolicyEffect::Deny)
    }
}
