//! Per-agent sliding-window call counter, one fixed window per agent id,
//! lazily created and cached behind a `DashMap` the way the teacher caches
//! one rate limiter per key in its own request-level rate limiter.

use std::time::Instant;

use dashmap::DashMap;
use gateway_core::RateLimitContext;

struct Window {
    started_at: Instant,
    count: u32,
}

pub struct AgentRateLimiter {
    windows: DashMap<String, Window>,
    window_seconds: u32,
}

impl AgentRateLimiter {
    pub fn new(window_seconds: u32) -> Self {
        Self { windows: DashMap::new(), window_seconds: window_seconds.max(1) }
    }

    /// Record one call for `agent_id` and return the sliding-window
    /// context to attach to its Intent Event: how many calls this agent
    /// has made within the current window.
    pub fn record_call(&self, agent_id: &str) -> RateLimitContext {
        let now = Instant::now();
        let window = std::time::Duration::from_secs(self.window_seconds as u64);

        let mut entry = self.windows.entry(agent_id.to_string()).or_insert_with(|| Window { started_at: now, count: 0 });
        if now.duration_since(entry.started_at) >= window {
            entry.started_at = now;
            entry.count = 0;
        }
        entry.count += 1;

        RateLimitContext { calls_in_window: entry.count, window_seconds: self.window_seconds }
    }
}
