//! Error taxonomy for the enforcement gateway.

use thiserror::Error;

/// Startup / configuration errors. Fatal — the process should not serve
/// traffic with an invalid configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("vocabulary file could not be loaded from {path}: {reason}")]
    VocabularyUnavailable { path: String, reason: String },

    #[error("vocabulary schema mismatch: {reason}")]
    VocabularySchema { reason: String },
}

/// Encoding pipeline errors (C2). Every encoding failure is a per-call
/// BLOCK, never a silent default.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("embedding provider unreachable: {reason}")]
    ProviderUnavailable { reason: String },

    #[error("input too large to encode: {len} bytes (max {max})")]
    InputTooLarge { len: usize, max: usize },

    #[error("unknown vocabulary value for slot {slot}: {value}")]
    UnknownVocabularyValue { slot: String, value: String },

    #[error("no template defined for slot {slot}")]
    MissingTemplate { slot: String },
}

/// Policy store errors (C3).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("policy not found: tenant={tenant_id} policy={policy_id}")]
    PolicyNotFound { tenant_id: String, policy_id: String },

    #[error("tenant unknown: {tenant_id}")]
    TenantUnknown { tenant_id: String },

    #[error("persistence unavailable: {reason}")]
    PersistenceUnavailable { reason: String },

    #[error("partial write detected for policy={policy_id}, refusing to expose it")]
    PartialAnchorPayload { policy_id: String },
}

/// Enforcement RPC transport errors (C6 <-> C4 Data Plane boundary).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("enforcement RPC timed out after {timeout_ms}ms")]
    DeadlineExceeded { timeout_ms: u64 },

    #[error("enforcement service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("enforcement request was malformed: {reason}")]
    InvalidArgument { reason: String },
}

/// Session/drift store errors (C5). Never safety-critical — callers log
/// and proceed with drift=0 rather than failing the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Master error type for the enforcement gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
