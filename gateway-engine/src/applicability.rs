//! Rule-family applicability filter: decides which installed policies are
//! even in play for a given intent, before any similarity math runs.
//!
//! Core rules (action/actor-type/resource-type) must not mismatch — a
//! mismatch short-circuits the policy out entirely. Soft rules only vote
//! toward a score; a policy or intent that doesn't constrain a soft field
//! abstains rather than matching or mismatching on it.

use gateway_core::{ApplicabilityConfig, ApplicabilityMode, ApplicabilityResult, IntentEvent, Policy, ResourceType, RuleKind, RuleOutcome, RuleVerdict};

struct Rule {
    id: &'static str,
    weight: f32,
    kind: RuleKind,
    check: fn(&IntentEvent, &Policy) -> RuleVerdict,
}

const CORE_RULES: &[Rule] = &[
    Rule { id: "ActionRule", weight: 1.0, kind: RuleKind::Core, check: action_rule },
    Rule { id: "ActorTypeRule", weight: 1.0, kind: RuleKind::Core, check: actor_type_rule },
    Rule { id: "ResourceTypeRule", weight: 1.0, kind: RuleKind::Core, check: resource_type_rule },
];

const SOFT_RULES: &[Rule] = &[
    Rule { id: "LocationRule", weight: 0.5, kind: RuleKind::Soft, check: location_rule },
    Rule { id: "PiiRule", weight: 0.5, kind: RuleKind::Soft, check: pii_rule },
    Rule { id: "VolumeRule", weight: 0.5, kind: RuleKind::Soft, check: volume_rule },
    Rule { id: "DomainRule", weight: 0.25, kind: RuleKind::Soft, check: domain_rule },
    Rule { id: "ResourceNameRule", weight: 0.25, kind: RuleKind::Soft, check: resource_name_rule },
];

fn action_rule(intent: &IntentEvent, policy: &Policy) -> RuleVerdict {
    contains_or_mismatch(&policy.constraints.actions, &intent.action)
}

fn actor_type_rule(intent: &IntentEvent, policy: &Policy) -> RuleVerdict {
    contains_or_mismatch(&policy.constraints.actor_types, &intent.actor.actor_type)
}

fn resource_type_rule(intent: &IntentEvent, policy: &Policy) -> RuleVerdict {
    contains_or_mismatch(&policy.constraints.resource_types, &intent.resource.resource_type)
}

fn contains_or_mismatch<T: PartialEq>(constraint: &[T], value: &T) -> RuleVerdict {
    if constraint.contains(value) {
        RuleVerdict::Match
    } else {
        RuleVerdict::Mismatch
    }
}

fn location_rule(intent: &IntentEvent, policy: &Policy) -> RuleVerdict {
    let locations = &policy.constraints.resource_locations;
    if locations.is_empty() {
        return RuleVerdict::Abstain;
    }
    match intent.resource.location.as_deref() {
        None => RuleVerdict::Abstain,
        Some(location) if locations.iter().any(|l| l == location) => RuleVerdict::Match,
        Some(_) => RuleVerdict::Mismatch,
    }
}

fn pii_rule(intent: &IntentEvent, policy: &Policy) -> RuleVerdict {
    match policy.constraints.pii {
        None => RuleVerdict::Abstain,
        Some(target) if target == intent.data.pii => RuleVerdict::Match,
        Some(_) => RuleVerdict::Mismatch,
    }
}

fn volume_rule(intent: &IntentEvent, policy: &Policy) -> RuleVerdict {
    let volumes = &policy.constraints.volume;
    if volumes.is_empty() {
        return RuleVerdict::Abstain;
    }
    contains_or_mismatch(volumes, &intent.data.volume)
}

fn domain_rule(intent: &IntentEvent, policy: &Policy) -> RuleVerdict {
    let domains = &policy.scope.domains;
    if domains.is_empty() {
        return RuleVerdict::Abstain;
    }
    let resource_type = resource_type_label(intent.resource.resource_type);
    if domains.iter().any(|d| d == resource_type) {
        RuleVerdict::Match
    } else {
        RuleVerdict::Mismatch
    }
}

fn resource_type_label(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::Database => "database",
        ResourceType::File => "file",
        ResourceType::Api => "api",
    }
}

fn resource_name_rule(intent: &IntentEvent, policy: &Policy) -> RuleVerdict {
    let names = &policy.constraints.resource_names;
    if names.is_empty() {
        return RuleVerdict::Abstain;
    }
    match intent.resource.name.as_deref() {
        None => RuleVerdict::Abstain,
        Some(name) if names.iter().any(|n| n == name) => RuleVerdict::Match,
        Some(_) => RuleVerdict::Mismatch,
    }
}

/// Evaluate whether `policy` applies to `intent`, per `config`'s mode and
/// minimum score.
pub fn evaluate_applicability(intent: &IntentEvent, policy: &Policy, config: &ApplicabilityConfig) -> ApplicabilityResult {
    let mut outcomes = Vec::with_capacity(CORE_RULES.len() + SOFT_RULES.len());

    for rule in CORE_RULES {
        let verdict = (rule.check)(intent, policy);
        outcomes.push(RuleOutcome { rule_id: rule.id.to_string(), kind: rule.kind, weight: rule.weight, verdict });
        if verdict == RuleVerdict::Mismatch {
            return ApplicabilityResult { applicable: false, score: 0.0, outcomes };
        }
    }

    let mut numerator = 0.0f32;
    let mut denominator = 0.0f32;
    for rule in SOFT_RULES {
        let verdict = (rule.check)(intent, policy);
        outcomes.push(RuleOutcome { rule_id: rule.id.to_string(), kind: rule.kind, weight: rule.weight, verdict });
        match verdict {
            RuleVerdict::Abstain => continue,
            RuleVerdict::Match => numerator += rule.weight,
            RuleVerdict::Mismatch => numerator -= rule.weight,
        }
        denominator += rule.weight;
    }

    let score = if denominator == 0.0 { 1.0 } else { (numerator + denominator) / (2.0 * denominator) };

    if config.mode == ApplicabilityMode::Strict {
        let any_soft_mismatch = outcomes
            .iter()
            .filter(|o| o.kind == RuleKind::Soft && o.verdict != RuleVerdict::Abstain)
            .any(|o| o.verdict == RuleVerdict::Mismatch);
        if any_soft_mismatch {
            return ApplicabilityResult { applicable: false, score, outcomes };
        }
    }

    ApplicabilityResult { applicable: score >= config.min_score, score, outcomes }
}
