//! Concurrent per-agent session store: baseline capture, drift accumulation,
//! bounded call history and expiry sweeping.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gateway_core::{CallRecord, IntentVector, Session, SessionPage, SessionSummary};
use tokio::sync::Mutex;

use crate::key::SessionKey;

/// Timeouts and bounds the store enforces. Mirrors the session fields of
/// `GatewayConfig` so a caller can build one straight from the master config.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub idle_timeout: chrono::Duration,
    pub absolute_timeout: chrono::Duration,
    pub sweep_interval: StdDuration,
    pub max_call_history: usize,
}

impl SessionConfig {
    pub fn from_gateway_config(config: &gateway_core::GatewayConfig) -> Self {
        Self {
            idle_timeout: chrono::Duration::from_std(config.session_idle_timeout).unwrap_or(chrono::Duration::minutes(30)),
            absolute_timeout: chrono::Duration::from_std(config.session_absolute_timeout).unwrap_or(chrono::Duration::hours(24)),
            sweep_interval: config.session_sweep_interval,
            max_call_history: config.max_call_history,
        }
    }
}

/// The result of recording one enforced call against a session: the
/// contribution that call made to cumulative drift, and the running total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftUpdate {
    pub contribution: f32,
    pub cumulative_drift: f32,
}

/// Per-agent session state, keyed by `(tenant_id, agent_id)`. Every mutation
/// of a single session serialises through that session's own mutex, so
/// concurrent calls from the same agent never race on baseline capture or
/// drift accumulation — calls from different agents proceed independently.
pub struct SessionStore {
    sessions: DashMap<SessionKey, Arc<Mutex<Session>>>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self { sessions: DashMap::new(), config }
    }

    fn entry(&self, tenant_id: &str, agent_id: &str, now: DateTime<Utc>) -> Arc<Mutex<Session>> {
        let key = SessionKey::new(tenant_id, agent_id);
        Arc::clone(
            self.sessions
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(agent_id, tenant_id, now))))
                .value(),
        )
    }

    /// Record one enforced call: sets the baseline on first use (first call
    /// wins and is never overwritten), accumulates drift relative to the
    /// previous vector seen for this session (or the baseline, on the first
    /// call), and appends to the bounded call history.
    pub async fn record_call(
        &self,
        tenant_id: &str,
        agent_id: &str,
        vector: IntentVector,
        record: CallRecord,
        now: DateTime<Utc>,
    ) -> DriftUpdate {
        let session = self.entry(tenant_id, agent_id, now);
        let mut session = session.lock().await;

        if session.baseline.is_none() {
            session.baseline = Some(vector.clone());
        }

        let baseline = session.baseline.clone().unwrap();
        let contribution = vector.drift_from(&baseline);
        session.cumulative_drift += contribution;
        session.last_vector = Some(vector);

        session.call_history.push(record);
        if session.call_history.len() > self.config.max_call_history {
            let overflow = session.call_history.len() - self.config.max_call_history;
            session.call_history.drain(0..overflow);
        }
        session.call_count += 1;
        session.last_seen_at = now;

        tracing::debug!(
            tenant_id,
            agent_id,
            contribution,
            cumulative_drift = session.cumulative_drift,
            "recorded call"
        );

        DriftUpdate { contribution, cumulative_drift: session.cumulative_drift }
    }

    /// Snapshot of a session's current state, if one has been created.
    pub async fn get_session(&self, tenant_id: &str, agent_id: &str) -> Option<Session> {
        let key = SessionKey::new(tenant_id, agent_id);
        let entry = self.sessions.get(&key)?;
        let session = entry.value().lock().await;
        Some(session.clone())
    }

    /// Cumulative drift alone, without cloning the full session.
    pub async fn get_drift(&self, tenant_id: &str, agent_id: &str) -> Option<f32> {
        let key = SessionKey::new(tenant_id, agent_id);
        let entry = self.sessions.get(&key)?;
        let session = entry.value().lock().await;
        Some(session.cumulative_drift)
    }

    /// Remove every session expired as of `now`. Returns the number removed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut expired = Vec::new();
        for entry in self.sessions.iter() {
            let session = entry.value().lock().await;
            if session.is_expired(now, self.config.idle_timeout, self.config.absolute_timeout) {
                expired.push(entry.key().clone());
            }
        }
        let removed = expired.len();
        for key in expired {
            self.sessions.remove(&key);
        }
        if removed > 0 {
            tracing::info!(removed, "swept expired sessions");
        }
        removed
    }

    /// Paginated, alphabetically-ordered listing of a tenant's sessions.
    /// `cursor` is the `agent_id` to resume after, as returned in the
    /// previous page's `next_cursor`.
    pub async fn list_sessions(&self, tenant_id: &str, cursor: Option<&str>, limit: usize) -> SessionPage {
        let mut agent_ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.key().tenant_id() == tenant_id)
            .map(|entry| entry.key().agent_id().to_string())
            .collect();
        agent_ids.sort();

        let start = match cursor {
            Some(c) => agent_ids.partition_point(|id| id.as_str() <= c),
            None => 0,
        };

        let mut sessions = Vec::new();
        for agent_id in agent_ids.iter().skip(start).take(limit) {
            if let Some(session) = self.get_session(tenant_id, agent_id).await {
                sessions.push(SessionSummary::from(&session));
            }
        }

        let next_cursor = if start + sessions.len() < agent_ids.len() { sessions.last().map(|s| s.agent_id.clone()) } else { None };

        SessionPage { sessions, next_cursor }
    }

    pub(crate) fn config(&self) -> SessionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{Action, Decision};
    use uuid::Uuid;

    fn config() -> SessionConfig {
        SessionConfig {
            idle_timeout: chrono::Duration::minutes(30),
            absolute_timeout: chrono::Duration::hours(24),
            sweep_interval: StdDuration::from_secs(300),
            max_call_history: 3,
        }
    }

    fn vector(seed: f32) -> IntentVector {
        let mut arr = [0.0f32; gateway_core::INTENT_DIM];
        let unit = seed.signum();
        for slice_start in (0..gateway_core::INTENT_DIM).step_by(gateway_core::SLOT_DIM) {
            arr[slice_start] = unit;
        }
        IntentVector::from_array(arr)
    }

    fn call_record() -> CallRecord {
        CallRecord { request_id: Uuid::nil(), action: Action::Read, decision: Decision::Allow, timestamp: Utc::now() }
    }

    #[tokio::test]
    async fn first_call_sets_baseline_with_zero_drift() {
        let store = SessionStore::new(config());
        let now = Utc::now();
        let update = store.record_call("tenant-a", "agent-1", vector(1.0), call_record(), now).await;
        assert_eq!(update.contribution, 0.0);
        assert_eq!(update.cumulative_drift, 0.0);
    }

    #[tokio::test]
    async fn baseline_is_never_overwritten_by_later_calls() {
        let store = SessionStore::new(config());
        let now = Utc::now();
        store.record_call("tenant-a", "agent-1", vector(1.0), call_record(), now).await;
        store.record_call("tenant-a", "agent-1", vector(-1.0), call_record(), now).await;
        let session = store.get_session("tenant-a", "agent-1").await.unwrap();
        assert_eq!(session.baseline.unwrap(), vector(1.0));
    }

    #[tokio::test]
    async fn cumulative_drift_only_grows() {
        let store = SessionStore::new(config());
        let now = Utc::now();
        store.record_call("tenant-a", "agent-1", vector(1.0), call_record(), now).await;
        let first = store.record_call("tenant-a", "agent-1", vector(-1.0), call_record(), now).await;
        let second = store.record_call("tenant-a", "agent-1", vector(-1.0), call_record(), now).await;
        assert!(first.cumulative_drift > 0.0);
        assert!(second.cumulative_drift >= first.cumulative_drift);
    }

    #[tokio::test]
    async fn call_history_is_bounded() {
        let store = SessionStore::new(config());
        let now = Utc::now();
        for _ in 0..5 {
            store.record_call("tenant-a", "agent-1", vector(1.0), call_record(), now).await;
        }
        let session = store.get_session("tenant-a", "agent-1").await.unwrap();
        assert_eq!(session.call_history.len(), 3);
        assert_eq!(session.call_count, 5);
    }

    #[tokio::test]
    async fn different_tenants_with_same_agent_id_are_independent() {
        let store = SessionStore::new(config());
        let now = Utc::now();
        store.record_call("tenant-a", "agent-1", vector(1.0), call_record(), now).await;
        assert!(store.get_session("tenant-b", "agent-1").await.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_idle_sessions() {
        let store = SessionStore::new(config());
        let old = Utc::now() - chrono::Duration::hours(1);
        store.record_call("tenant-a", "agent-1", vector(1.0), call_record(), old).await;
        let removed = store.sweep_expired(Utc::now()).await;
        assert_eq!(removed, 1);
        assert!(store.get_session("tenant-a", "agent-1").await.is_none());
    }

    #[tokio::test]
    async fn list_sessions_paginates_alphabetically() {
        let store = SessionStore::new(config());
        let now = Utc::now();
        for agent in ["agent-a", "agent-b", "agent-c"] {
            store.record_call("tenant-a", agent, vector(1.0), call_record(), now).await;
        }
        let page = store.list_sessions("tenant-a", None, 2).await;
        assert_eq!(page.sessions.len(), 2);
        assert_eq!(page.sessions[0].agent_id, "agent-a");
        assert_eq!(page.next_cursor.as_deref(), Some("agent-b"));

        let next = store.list_sessions("tenant-a", page.next_cursor.as_deref(), 2).await;
        assert_eq!(next.sessions.len(), 1);
        assert_eq!(next.sessions[0].agent_id, "agent-c");
        assert!(next.next_cursor.is_none());
    }
}
