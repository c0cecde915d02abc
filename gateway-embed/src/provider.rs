//! Async embedding provider abstraction: the trait implementations adapt
//! to, plus routing/health/circuit-breaking machinery for running several
//! providers behind one registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock as TokioRwLock;
use uuid::Uuid;

use crate::error::EmbedError;
use crate::vector::EmbeddingVector;

/// Implementations must be thread-safe; a registry may hold several behind
/// one routing strategy.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedError>;
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, EmbedError>;
    fn dimensions(&self) -> i32;
    fn model_id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct PingResponse {
    pub provider_id: String,
    pub latency_ms: u64,
    pub health: HealthStatus,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct EmbedRequest {
    pub text: String,
    pub request_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct EmbedResponse {
    pub embedding: EmbeddingVector,
    pub request_id: Uuid,
    pub latency_ms: u64,
}

/// Adapter a registry holds one of per backing provider. Separate from
/// `EmbeddingProvider` so registration carries a stable id and a health
/// check independent of the embedding call itself.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider_id(&self) -> &str;
    async fn ping(&self) -> Result<PingResponse, EmbedError>;
    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, EmbedError>;
}

#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub request_id: Uuid,
    pub provider_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub request_id: Uuid,
    pub provider_id: String,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub request_id: Uuid,
    pub provider_id: String,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

/// Hook for observers (billing, metrics export) that want every embed call
/// without being on the hot path themselves.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_request(&self, event: RequestEvent);
    async fn on_response(&self, event: ResponseEvent);
    async fn on_error(&self, event: ErrorEvent);
}

#[derive(Default)]
pub struct ListenerChain {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl ListenerChain {
    pub fn new() -> Self {
        Self { listeners: Vec::new() }
    }

    pub fn add(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub async fn emit_request(&self, event: RequestEvent) {
        for listener in &self.listeners {
            listener.on_request(event.clone()).await;
        }
    }

    pub async fn emit_response(&self, event: ResponseEvent) {
        for listener in &self.listeners {
            listener.on_response(event.clone()).await;
        }
    }

    pub async fn emit_error(&self, event: ErrorEvent) {
        for listener in &self.listeners {
            listener.on_error(event.clone()).await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(v: u8) -> Self {
        match v {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, success_threshold: 3, timeout: Duration::from_secs(30) }
    }
}

pub struct CircuitBreaker {
    state: AtomicU8,
    failure_count: AtomicU32,
    success_count: AtomicU32,
    last_failure: RwLock<Option<Instant>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed as u8),
            failure_count: AtomicU32::new(0),
            success_count: AtomicU32::new(0),
            last_failure: RwLock::new(None),
            config,
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_allowed(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if let Ok(guard) = self.last_failure.read() {
                    if let Some(last) = *guard {
                        if last.elapsed() > self.config.timeout {
                            self.state.store(CircuitState::HalfOpen as u8, Ordering::SeqCst);
                            return true;
                        }
                    }
                }
                false
            }
            CircuitState::HalfOpen => true,
        }
    }

    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::SeqCst);
        if self.state() == CircuitState::HalfOpen {
            let count = self.success_count.fetch_add(1, Ordering::SeqCst) + 1;
            if count >= self.config.success_threshold {
                self.state.store(CircuitState::Closed as u8, Ordering::SeqCst);
                self.success_count.store(0, Ordering::SeqCst);
            }
        }
    }

    pub fn record_failure(&self) {
        self.success_count.store(0, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_failure.write() {
            *guard = Some(Instant::now());
        }
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= self.config.failure_threshold {
            self.state.store(CircuitState::Open as u8, Ordering::SeqCst);
        }
    }

    pub fn reset(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::SeqCst);
        self.failure_count.store(0, Ordering::SeqCst);
        self.success_count.store(0, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_failure.write() {
            *guard = None;
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("state", &self.state())
            .field("failure_count", &self.failure_count.load(Ordering::Relaxed))
            .field("success_count", &self.success_count.load(Ordering::Relaxed))
            .finish()
    }
}

/// How a registry with more than one provider picks the one to use.
#[derive(Debug, Clone)]
pub enum RoutingStrategy {
    RoundRobin,
    LeastLatency,
    Random,
    First,
}

pub struct ProviderRegistry {
    adapters: TokioRwLock<HashMap<String, Arc<dyn ProviderAdapter>>>,
    routing_strategy: RoutingStrategy,
    health_cache: TokioRwLock<HashMap<String, (PingResponse, Instant)>>,
    health_cache_ttl: Duration,
    round_robin_index: AtomicU64,
    listeners: TokioRwLock<ListenerChain>,
    circuit_breakers: TokioRwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl ProviderRegistry {
    pub fn new(routing_strategy: RoutingStrategy) -> Self {
        Self {
            adapters: TokioRwLock::new(HashMap::new()),
            routing_strategy,
            health_cache: TokioRwLock::new(HashMap::new()),
            health_cache_ttl: Duration::from_secs(60),
            round_robin_index: AtomicU64::new(0),
            listeners: TokioRwLock::new(ListenerChain::new()),
            circuit_breakers: TokioRwLock::new(HashMap::new()),
        }
    }

    pub fn with_round_robin() -> Self {
        Self::new(RoutingStrategy::RoundRobin)
    }

    pub async fn register(&self, adapter: Arc<dyn ProviderAdapter>) {
        let id = adapter.provider_id().to_string();
        self.adapters.write().await.insert(id.clone(), adapter);
        self.circuit_breakers.write().await.insert(id, Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())));
    }

    pub async fn unregister(&self, provider_id: &str) {
        self.adapters.write().await.remove(provider_id);
        self.circuit_breakers.write().await.remove(provider_id);
    }

    pub async fn add_listener(&self, listener: Arc<dyn EventListener>) {
        self.listeners.write().await.add(listener);
    }

    pub async fn provider_ids(&self) -> Vec<String> {
        self.adapters.read().await.keys().cloned().collect()
    }

    pub async fn echo(&self) -> Vec<PingResponse> {
        let adapters = self.adapters.read().await;
        let mut responses = Vec::new();
        for (id, adapter) in adapters.iter() {
            if let Ok(response) = adapter.ping().await {
                self.health_cache.write().await.insert(id.clone(), (response.clone(), Instant::now()));
                responses.push(response);
            }
        }
        responses
    }

    pub async fn has_providers(&self) -> bool {
        !self.adapters.read().await.is_empty()
    }

    async fn select_provider(&self) -> Result<Arc<dyn ProviderAdapter>, EmbedError> {
        let adapters = self.adapters.read().await;
        let breakers = self.circuit_breakers.read().await;

        let available: Vec<_> = adapters
            .iter()
            .filter(|(id, _)| breakers.get(*id).map(|cb| cb.is_allowed()).unwrap_or(true))
            .collect();

        if available.is_empty() {
            return Err(if adapters.is_empty() {
                EmbedError::ProviderNotConfigured
            } else {
                EmbedError::ProviderUnavailable
            });
        }

        let selected = match &self.routing_strategy {
            RoutingStrategy::First => available.first().map(|(_, a)| Arc::clone(a)),
            RoutingStrategy::RoundRobin => {
                let idx = self.round_robin_index.fetch_add(1, Ordering::Relaxed) as usize % available.len();
                available.get(idx).map(|(_, a)| Arc::clone(a))
            }
            RoutingStrategy::Random => {
                let seed =
                    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().subsec_nanos()
                        as usize;
                available.get(seed % available.len()).map(|(_, a)| Arc::clone(a))
            }
            RoutingStrategy::LeastLatency => {
                let health_cache = self.health_cache.read().await;
                let ttl = self.health_cache_ttl;
                let mut best: Option<(&str, u64)> = None;
                for (id, _) in &available {
                    if let Some((ping, cached_at)) = health_cache.get(*id) {
                        if cached_at.elapsed() < ttl {
                            match best {
                                None => best = Some((id.as_str(), ping.latency_ms)),
                                Some((_, lat)) if ping.latency_ms < lat => best = Some((id.as_str(), ping.latency_ms)),
                                _ => {}
                            }
                        }
                    }
                }
                match best {
                    Some((id, _)) => adapters.get(id).cloned(),
                    None => available.first().map(|(_, a)| Arc::clone(a)),
                }
            }
        };

        selected.ok_or(EmbedError::ProviderNotConfigured)
    }

    pub async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedError> {
        let provider = self.select_provider().await?;
        let provider_id = provider.provider_id().to_string();
        let request_id = Uuid::now_v7();

        self.listeners
            .read()
            .await
            .emit_request(RequestEvent { request_id, provider_id: provider_id.clone(), timestamp: Utc::now() })
            .await;

        let start = Instant::now();
        let result = provider.embed(EmbedRequest { text: text.to_string(), request_id }).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        if let Some(cb) = self.circuit_breakers.read().await.get(&provider_id) {
            match &result {
                Ok(_) => cb.record_success(),
                Err(_) => cb.record_failure(),
            }
        }

        let listeners = self.listeners.read().await;
        match &result {
            Ok(_) => {
                listeners
                    .emit_response(ResponseEvent { request_id, provider_id, latency_ms, timestamp: Utc::now() })
                    .await;
            }
            Err(e) => {
                listeners
                    .emit_error(ErrorEvent { request_id, provider_id, error_message: e.to_string(), timestamp: Utc::now() })
                    .await;
            }
        }

        result.map(|r| r.embedding)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").field("routing_strategy", &self.routing_strategy).finish()
    }
}
