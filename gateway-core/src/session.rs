//! Session: per-agent mutable state tracked across a multi-turn
//! interaction, used to measure semantic drift and bound session lifetime.

use crate::decision::Decision;
use crate::intent::Action;
use crate::vector::IntentVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One enforced call recorded in a session's bounded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CallRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub request_id: Uuid,
    pub action: Action,
    pub decision: Decision,
    pub timestamp: DateTime<Utc>,
}

/// Per-agent mutable state. The baseline vector, once set, is never
/// overwritten; cumulative drift only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Session {
    pub agent_id: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<IntentVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_vector: Option<IntentVector>,
    pub cumulative_drift: f32,
    pub call_history: Vec<CallRecord>,
    pub call_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Session {
    pub fn new(agent_id: impl Into<String>, tenant_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            agent_id: agent_id.into(),
            tenant_id: tenant_id.into(),
            baseline: None,
            last_vector: None,
            cumulative_drift: 0.0,
            call_history: Vec::new(),
            call_count: 0,
            created_at: now,
            last_seen_at: now,
        }
    }

    /// True once `last_seen_at` is more than `idle_timeout` in the past,
    /// or `created_at` is more than `absolute_timeout` in the past.
    pub fn is_expired(
        &self,
        now: DateTime<Utc>,
        idle_timeout: chrono::Duration,
        absolute_timeout: chrono::Duration,
    ) -> bool {
        now - self.last_seen_at > idle_timeout || now - self.created_at > absolute_timeout
    }
}

/// A single page of [`Session`] summaries returned by the operator-facing
/// `listSessions` read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionSummary {
    pub agent_id: String,
    pub call_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_decision: Option<Decision>,
    pub cumulative_drift: f32,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            agent_id: session.agent_id.clone(),
            call_count: session.call_count,
            created_at: session.created_at,
            last_seen_at: session.last_seen_at,
            final_decision: session.call_history.last().map(|r| r.decision),
            cumulative_drift: session.cumulative_drift,
        }
    }
}

/// A page of session summaries plus the cursor to fetch the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionPage {
    pub sessions: Vec<SessionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_no_baseline() {
        let s = Session::new("agent-1", "tenant-a", Utc::now());
        assert!(s.baseline.is_none());
        assert_eq!(s.cumulative_drift, 0.0);
    }

    #[test]
    fn expires_on_idle_timeout() {
        let now = Utc::now();
        let mut s = Session::new("agent-1", "tenant-a", now);
        s.last_seen_at = now - chrono::Duration::minutes(31);
        assert!(s.is_expired(now, chrono::Duration::minutes(30), chrono::Duration::hours(24)));
    }

    #[test]
    fn expires_on_absolute_timeout_even_if_recently_seen() {
        let now = Utc::now();
        let mut s = Session::new("agent-1", "tenant-a", now - chrono::Duration::hours(25));
        s.last_seen_at = now;
        assert!(s.is_expired(now, chrono::Duration::minutes(30), chrono::Duration::hours(24)));
    }

    #[test]
    fn summary_final_decision_is_last_history_entry() {
        let mut s = Session::new("agent-1", "tenant-a", Utc::now());
        s.call_history.push(CallRecord {
            request_id: Uuid::nil(),
            action: Action::Read,
            decision: Decision::Allow,
            timestamp: Utc::now(),
        });
        let summary = SessionSummary::from(&s);
        assert_eq!(summary.final_decision, Some(Decision::Allow));
    }
}
