//! Deny-first aggregation: turns a set of applicable (policy, similarity)
//! pairs into a single verdict plus an evidence trail.

use gateway_core::{BlockReason, ComparisonResult, Decision, EvidenceEntry, PolicyEffect};

use crate::decision::local_decision;

/// One applicable policy's similarities, carried alongside the policy
/// itself so aggregation can build evidence without a second pass.
pub struct Evaluated<'a> {
    pub policy: &'a gateway_core::Policy,
    pub similarities: [f32; 4],
}

/// Aggregate already-applicable policies into a verdict. Policies must be
/// pre-sorted: deny policies in evaluation order (higher `priority` first),
/// ties broken by store iteration order.
pub fn aggregate(evaluated: &[Evaluated<'_>], timestamp: chrono::DateTime<chrono::Utc>) -> ComparisonResult {
    let mut evidence = Vec::with_capacity(evaluated.len());

    let mut denies: Vec<&Evaluated<'_>> = evaluated.iter().filter(|e| e.policy.is_deny()).collect();
    denies.sort_by(|a, b| b.policy.priority.cmp(&a.policy.priority));

    for deny in denies.iter().copied() {
        let matched = local_decision(deny.policy, deny.similarities);
        evidence.push(evidence_entry(deny, matched));
        if matched {
            return ComparisonResult {
                decision: Decision::Block,
                slice_similarities: deny.similarities,
                policies_evaluated: evaluated.len(),
                timestamp,
                evidence,
                reason: Some(BlockReason::DenyMatched),
                drift: None,
                modified_params: None,
                trace: None,
            };
        }
    }

    let mandatory_allows: Vec<&Evaluated<'_>> = evaluated.iter().filter(|e| e.policy.is_mandatory_allow()).collect();
    let optional_allows: Vec<&Evaluated<'_>> = evaluated
        .iter()
        .filter(|e| matches!(e.policy.effect, PolicyEffect::Allow) && !e.policy.is_mandatory_allow())
        .collect();

    for allow in optional_allows {
        let matched = local_decision(allow.policy, allow.similarities);
        evidence.push(evidence_entry(allow, matched));
    }

    if mandatory_allows.is_empty() {
        return ComparisonResult {
            decision: Decision::Block,
            slice_similarities: [0.0; 4],
            policies_evaluated: evaluated.len(),
            timestamp,
            evidence,
            reason: Some(BlockReason::MandatoryAllowUnmet),
            drift: None,
            modified_params: None,
            trace: None,
        };
    }

    let mut all_matched = true;
    let mut matched_similarities = Vec::with_capacity(mandatory_allows.len());
    // The first matched mandatory allow with a declared modification wins;
    // C4 doesn't merge or order multiple modifications, it just forwards one.
    let mut modified_params = None;
    for allow in mandatory_allows.iter().copied() {
        let matched = local_decision(allow.policy, allow.similarities);
        evidence.push(evidence_entry(allow, matched));
        all_matched &= matched;
        matched_similarities.push(allow.similarities);
        if matched && modified_params.is_none() {
            modified_params = allow.policy.modification.as_ref().and_then(|m| serde_json::to_value(m).ok());
        }
    }

    let slice_similarities = if all_matched { elementwise_mean(&matched_similarities) } else { elementwise_min(&matched_similarities) };

    ComparisonResult {
        decision: if all_matched { Decision::Allow } else { Decision::Block },
        slice_similarities,
        policies_evaluated: evaluated.len(),
        timestamp,
        evidence,
        reason: if all_matched { None } else { Some(BlockReason::MandatoryAllowUnmet) },
        drift: None,
        modified_params: if all_matched { modified_params } else { None },
        trace: None,
    }
}

fn evidence_entry(evaluated: &Evaluated<'_>, matched: bool) -> EvidenceEntry {
    EvidenceEntry {
        policy_id: evaluated.policy.id,
        policy_name: evaluated.policy.name.clone(),
        effect: evaluated.policy.effect,
        local_decision: matched as u8,
        slice_similarities: evaluated.similarities,
        modification: evaluated.policy.modification.clone(),
    }
}

fn elementwise_mean(values: &[[f32; 4]]) -> [f32; 4] {
    let mut out = [0.0f32; 4];
    if values.is_empty() {
        return out;
    }
    for v in values {
        for i in 0..4 {
            out[i] += v[i];
        }
    }
    for x in out.iter_mut() {
        *x /= values.len() as f32;
    }
    out
}

fn elementwise_min(values: &[[f32; 4]]) -> [f32; 4] {
    let mut out = [1.0f32; 4];
    for v in values {
        for i in 0..4 {
            out[i] = out[i].min(v[i]);
        }
    }
    if values.is_empty() {
        out = [0.0; 4];
    }
    out
}
