//! Per-slice similarity against a policy's anchors, and the per-policy
//! local decision derived from it.

use gateway_core::{AggregationMode, Policy, RuleVector, Slice};

/// `[action, resource, data, risk]` cosine similarity of an intent's slots
/// against a policy's anchor sets, each slice max-pooled over that slice's
/// anchor rows.
pub fn slice_similarities(intent: &gateway_core::IntentVector, anchors: &RuleVector) -> [f32; 4] {
    let mut out = [0.0f32; 4];
    for (i, slice) in Slice::ALL.into_iter().enumerate() {
        out[i] = anchors.slice(slice).max_similarity(intent.slot(slice));
    }
    out
}

/// Whether `policy`'s local decision is a match, given its per-slice
/// similarities.
pub fn local_decision(policy: &Policy, similarities: [f32; 4]) -> bool {
    let thresholds = policy.thresholds.as_array();
    let every_slice_meets_threshold = similarities.iter().zip(thresholds.iter()).all(|(sim, t)| sim >= t);

    match policy.aggregation_mode {
        AggregationMode::Min => every_slice_meets_threshold,
        AggregationMode::WeightedAvg => {
            let Some(global_threshold) = policy.global_threshold else {
                tracing::warn!(policy_id = %policy.id, "weighted-avg policy has no global_threshold set, treating as unmet");
                return false;
            };
            let weights = policy.weights.as_array();
            let weight_sum: f32 = weights.iter().sum();
            if weight_sum <= 0.0 {
                return false;
            }
            let weighted_score: f32 = similarities.iter().zip(weights.iter()).map(|(sim, w)| sim * w).sum::<f32>() / weight_sum;
            weighted_score >= global_threshold && every_slice_meets_threshold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gateway_core::{Constraints, PolicyEffect, PolicyStatus, PolicyType, Scope, Thresholds, Weights};
    use uuid::Uuid;

    fn policy_with(mode: AggregationMode, thresholds: Thresholds, global_threshold: Option<f32>) -> Policy {
        let now = Utc::now();
        Policy {
            id: Uuid::nil(),
            tenant_id: "tenant-a".to_string(),
            name: "p".to_string(),
            status: PolicyStatus::Active,
            effect: PolicyEffect::Deny,
            policy_type: PolicyType::Optional,
            priority: 0,
            thresholds,
            weights: Weights::default(),
            aggregation_mode: mode,
            global_threshold,
            constraints: Constraints::default(),
            scope: Scope::default(),
            drift_threshold: None,
            modification: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn min_mode_requires_every_slice_above_threshold() {
        let thresholds = Thresholds { action: 0.6, resource: 0.6, data: 0.6, risk: 0.6 };
        let policy = policy_with(AggregationMode::Min, thresholds, None);
        assert!(local_decision(&policy, [0.7, 0.7, 0.7, 0.7]));
        assert!(!local_decision(&policy, [0.7, 0.7, 0.5, 0.7]));
    }

    #[test]
    fn weighted_avg_needs_both_global_and_per_slice_thresholds() {
        let thresholds = Thresholds { action: 0.5, resource: 0.5, data: 0.5, risk: 0.5 };
        let policy = policy_with(AggregationMode::WeightedAvg, thresholds, Some(0.8));
        assert!(local_decision(&policy, [0.9, 0.9, 0.9, 0.9]));
        assert!(!local_decision(&policy, [0.9, 0.9, 0.4, 0.9]));
    }

    #[test]
    fn weighted_avg_without_global_threshold_never_matches() {
        let thresholds = Thresholds { action: 0.0, resource: 0.0, data: 0.0, risk: 0.0 };
        let policy = policy_with(AggregationMode::WeightedAvg, thresholds, None);
        assert!(!local_decision(&policy, [1.0, 1.0, 1.0, 1.0]));
    }
}
