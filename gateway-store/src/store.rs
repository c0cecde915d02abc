//! In-memory policy store: the authoritative set of installed policies and
//! their encoded anchor tensors, keyed by (tenant, policy id).
//!
//! This is both the store and the cache the enforcement engine reads —
//! there is no separate persistence backend behind it. Each policy's
//! (policy row, anchor payload) pair is installed as a single `Arc` swap,
//! so a reader never observes one half written without the other.

use std::sync::Arc;

use dashmap::DashMap;
use gateway_core::{Policy, PolicyStatus, RuleVector};
use uuid::Uuid;

use crate::key::PolicyKey;

/// A policy together with its encoded anchor tensors, as installed.
#[derive(Debug, Clone)]
pub struct PolicyRecord {
    pub policy: Policy,
    pub anchors: RuleVector,
}

/// Anything that accepts a freshly-encoded policy, used by `resync_into` to
/// push the store's active policies into a downstream enforcement cache on
/// startup.
pub trait PolicySink {
    fn install(&self, policy: Policy, anchors: RuleVector);
}

#[derive(Default)]
pub struct PolicyStore {
    records: DashMap<PolicyKey, Arc<PolicyRecord>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self { records: DashMap::new() }
    }

    /// Install or update a policy and its anchor payload atomically. If a
    /// policy with this id already exists, its `created_at` is preserved.
    pub fn install(&self, mut policy: Policy, anchors: RuleVector) -> Policy {
        let key = PolicyKey::new(policy.tenant_id.clone(), policy.id);
        if let Some(existing) = self.records.get(&key) {
            policy.created_at = existing.policy.created_at;
        }
        let record = Arc::new(PolicyRecord { policy: policy.clone(), anchors });
        self.records.insert(key, record);
        policy
    }

    /// Remove a policy. Idempotent: removing a policy that doesn't exist is
    /// not an error.
    pub fn remove(&self, tenant_id: &str, policy_id: Uuid) {
        self.records.remove(&PolicyKey::new(tenant_id, policy_id));
    }

    pub fn get(&self, tenant_id: &str, policy_id: Uuid) -> Option<Policy> {
        self.records.get(&PolicyKey::new(tenant_id, policy_id)).map(|r| r.policy.clone())
    }

    pub fn list(&self, tenant_id: &str) -> Vec<Policy> {
        self.records
            .iter()
            .filter(|entry| entry.key().tenant_id() == tenant_id)
            .map(|entry| entry.value().policy.clone())
            .collect()
    }

    /// The snapshot the enforcement engine reads: active policies for a
    /// tenant, each paired with its anchor tensors.
    pub fn active_policies(&self, tenant_id: &str) -> Vec<Arc<PolicyRecord>> {
        self.records
            .iter()
            .filter(|entry| entry.key().tenant_id() == tenant_id && entry.value().policy.status == PolicyStatus::Active)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn tenant_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.iter().map(|e| e.key().tenant_id().to_string()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Re-push every active policy into a downstream sink. Failures are
    /// logged per-policy and never abort the sweep, matching the startup
    /// contract that a cold downstream cache must not block boot.
    pub fn resync_into(&self, sink: &dyn PolicySink) {
        for entry in self.records.iter() {
            if entry.value().policy.status != PolicyStatus::Active {
                continue;
            }
            let record = entry.value();
            sink.install(record.policy.clone(), record.anchors.clone());
            tracing::debug!(policy_id = %record.policy.id, tenant_id = %record.policy.tenant_id, "resynced policy to downstream cache");
        }
    }
}
