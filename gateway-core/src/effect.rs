//! Effect system for error-as-effects pattern.
//!
//! This module implements the "errors as effects" pattern where domain errors
//! are first-class events that can be persisted, replayed, and affect downstream
//! handlers.
//!
//! # Usage Guidelines
//!
//! ## Effect at Boundaries, Result Internally
//!
//! Internal code should use `Result<T, E>` for normal error handling.
//! `Effect<T>` should only be used at system boundaries:
//! - Enforcement RPC responses (C4 -> C6)
//! - Policy store write responses
//! - API response wrappers
//!
//! ```rust,ignore
//! // Internal: use Result
//! async fn load_policy(&self, id: Uuid) -> Result<Policy, StoreError> {
//!     self.cache.get(id).await
//! }
//!
//! // Boundary: wrap in Effect
//! pub async fn handle_enforce(&self, req: IntentEvent) -> Effect<ComparisonResult> {
//!     match self.evaluate(req).await {
//!         Ok(result) => Effect::Ok(result),
//!         Err(e) if e.is_transient() => Effect::retry(Duration::from_millis(100), 1, 3, "transient"),
//!         Err(e) => Effect::Err(ErrorEffect::from(e)),
//!     }
//! }
//! ```
//!
//! # Key Distinction
//!
//! A BLOCK verdict is a domain error: it must be persisted to the evidence
//! trail and can affect session drift tracking. A transport timeout talking
//! to the Data Plane is an operational error: it is telemetry only and never
//! itself the reason a Comparison Result says BLOCK (the caller fails closed
//! instead, see [`ConfigError`](crate::ConfigError) siblings in `error.rs`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// EFFECT TYPE
// ============================================================================

/// An effect represents the outcome of a boundary operation.
///
/// Effects are more expressive than simple `Result<T, E>` because they can
/// represent retry conditions alongside the usual success/failure split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Effect<T> {
    /// Successful result
    Ok(T),
    /// Domain-level error (must persist, affects evidence/drift)
    Err(ErrorEffect),
    /// Operation should be retried
    Retry {
        /// Duration to wait before retrying
        #[serde(with = "duration_millis")]
        after: Duration,
        /// Current attempt number (1-indexed)
        attempt: u32,
        /// Maximum number of attempts
        max_attempts: u32,
        /// Reason for retry
        reason: String,
    },
}

impl<T> Effect<T> {
    /// Create a successful effect.
    pub fn ok(value: T) -> Self {
        Effect::Ok(value)
    }

    /// Create an error effect.
    pub fn err(error: ErrorEffect) -> Self {
        Effect::Err(error)
    }

    /// Create a domain error effect.
    pub fn domain_error(error: DomainError, request_id: Uuid) -> Self {
        Effect::Err(ErrorEffect::Domain(DomainErrorContext {
            error,
            request_id,
        }))
    }

    /// Create a retry effect.
    pub fn retry(
        after: Duration,
        attempt: u32,
        max_attempts: u32,
        reason: impl Into<String>,
    ) -> Self {
        Effect::Retry {
            after,
            attempt,
            max_attempts,
            reason: reason.into(),
        }
    }

    /// Check if this is a successful effect.
    pub fn is_ok(&self) -> bool {
        matches!(self, Effect::Ok(_))
    }

    /// Check if this is an error effect.
    pub fn is_err(&self) -> bool {
        matches!(self, Effect::Err(_))
    }

    /// Check if this effect requires retry.
    pub fn needs_retry(&self) -> bool {
        matches!(self, Effect::Retry { .. })
    }

    /// Convert to a Result, losing retry information.
    pub fn into_result(self) -> Result<T, ErrorEffect> {
        match self {
            Effect::Ok(v) => Ok(v),
            Effect::Err(e) => Err(e),
            Effect::Retry { reason, .. } => Err(ErrorEffect::Operational(
                OperationalError::RetryExhausted { reason },
            )),
        }
    }

    /// Map the success value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Effect<U> {
        match self {
            Effect::Ok(v) => Effect::Ok(f(v)),
            Effect::Err(e) => Effect::Err(e),
            Effect::Retry {
                after,
                attempt,
                max_attempts,
                reason,
            } => Effect::Retry {
                after,
                attempt,
                max_attempts,
                reason,
            },
        }
    }

    /// Extract the success value, panicking if not Ok.
    pub fn unwrap(self) -> T {
        match self {
            Effect::Ok(v) => v,
            _ => panic!("called unwrap on non-Ok effect: {:?}", std::any::type_name::<Self>()),
        }
    }

    /// Chain a function that returns an Effect on the success value.
    pub fn and_then<U, F: FnOnce(T) -> Effect<U>>(self, f: F) -> Effect<U> {
        match self {
            Effect::Ok(v) => f(v),
            Effect::Err(e) => Effect::Err(e),
            Effect::Retry {
                after,
                attempt,
                max_attempts,
                reason,
            } => Effect::Retry {
                after,
                attempt,
                max_attempts,
                reason,
            },
        }
    }

    /// Map the error effect using a transformation function.
    pub fn map_err<F: FnOnce(ErrorEffect) -> ErrorEffect>(self, f: F) -> Self {
        match self {
            Effect::Err(e) => Effect::Err(f(e)),
            other => other,
        }
    }

    /// Extract the success value or return a default.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Effect::Ok(v) => v,
            _ => default,
        }
    }

    /// Extract the success value or compute a default from the error.
    pub fn unwrap_or_else<F: FnOnce(ErrorEffect) -> T>(self, f: F) -> T {
        match self {
            Effect::Ok(v) => v,
            Effect::Err(e) => f(e),
            Effect::Retry { reason, .. } => {
                f(ErrorEffect::Operational(OperationalError::RetryExhausted { reason }))
            }
        }
    }
}

impl<T, E: Into<ErrorEffect>> From<Result<T, E>> for Effect<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Effect::Ok(v),
            Err(e) => Effect::Err(e.into()),
        }
    }
}

// ============================================================================
// ERROR EFFECT
// ============================================================================

/// An error effect that can be persisted and replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ErrorEffect {
    /// Domain-level error (must persist, affects evidence/drift)
    Domain(DomainErrorContext),
    /// Operational error (telemetry only, can sample/discard)
    Operational(OperationalError),
}

impl ErrorEffect {
    /// Check if this is a domain error.
    pub fn is_domain(&self) -> bool {
        matches!(self, ErrorEffect::Domain(_))
    }

    /// Check if this is an operational error.
    pub fn is_operational(&self) -> bool {
        matches!(self, ErrorEffect::Operational(_))
    }

    /// Get the error kind for categorization.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorEffect::Domain(ctx) => ctx.error.kind(),
            ErrorEffect::Operational(op) => op.kind(),
        }
    }
}

impl fmt::Display for ErrorEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorEffect::Domain(ctx) => write!(f, "domain error: {}", ctx.error),
            ErrorEffect::Operational(op) => write!(f, "operational error: {}", op),
        }
    }
}

impl std::error::Error for ErrorEffect {}

// ============================================================================
// DOMAIN ERROR CONTEXT
// ============================================================================

/// Domain error with request context for correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DomainErrorContext {
    /// The domain error
    pub error: DomainError,
    /// Request (intent event) that caused this error
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub request_id: Uuid,
}

// ============================================================================
// DOMAIN ERRORS
// ============================================================================

/// Domain-level errors that affect the enforcement verdict.
///
/// These are persisted to the evidence trail and can affect session drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DomainError {
    /// A deny policy matched and short-circuited the aggregation to BLOCK.
    BlockedByDenyPolicy {
        policy_id: Uuid,
        boundary_id: String,
    },
    /// A mandatory allow policy failed to locally decide ALLOW.
    MandatoryAllowNotSatisfied { policy_id: Uuid },
    PolicyNotFound { tenant_id: String, policy_id: Uuid },
    TenantUnknown { tenant_id: String },
    ValidationFailed { field: String, reason: String },
    QuotaExceeded {
        resource: String,
        limit: u64,
        requested: u64,
    },
}

impl DomainError {
    /// Get the error kind for categorization.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::BlockedByDenyPolicy { .. } => ErrorKind::BusinessLogic,
            DomainError::MandatoryAllowNotSatisfied { .. } => ErrorKind::BusinessLogic,
            DomainError::PolicyNotFound { .. } => ErrorKind::NotFound,
            DomainError::TenantUnknown { .. } => ErrorKind::NotFound,
            DomainError::ValidationFailed { .. } => ErrorKind::Validation,
            DomainError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BlockedByDenyPolicy { policy_id, boundary_id } => {
                write!(f, "deny policy {} ({}) matched", policy_id, boundary_id)
            }
            DomainError::MandatoryAllowNotSatisfied { policy_id } => {
                write!(f, "mandatory allow policy {} was not satisfied", policy_id)
            }
            DomainError::PolicyNotFound { tenant_id, policy_id } => {
                write!(f, "policy not found: tenant={} policy={}", tenant_id, policy_id)
            }
            DomainError::TenantUnknown { tenant_id } => write!(f, "tenant unknown: {}", tenant_id),
            DomainError::ValidationFailed { field, reason } => {
                write!(f, "validation failed for {}: {}", field, reason)
            }
            DomainError::QuotaExceeded { resource, limit, requested } => {
                write!(f, "quota exceeded for {}: limit {}, requested {}", resource, limit, requested)
            }
        }
    }
}

impl std::error::Error for DomainError {}

// ============================================================================
// OPERATIONAL ERRORS
// ============================================================================

/// Operational errors that don't affect the enforcement verdict.
///
/// Infrastructure concerns, sampled for telemetry rather than persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum OperationalError {
    /// Network or connection error
    NetworkError { message: String },
    /// Operation timed out
    Timeout { operation: String },
    /// Rate limited by an upstream service
    RateLimited { service: String, retry_after_ms: i64 },
    /// Internal error (unexpected)
    Internal { message: String },
    /// Resource temporarily unavailable
    Unavailable { resource: String },
    /// Retries exhausted
    RetryExhausted { reason: String },
    /// Serialization/deserialization error
    SerializationError { message: String },
}

impl OperationalError {
    /// Get the error kind for categorization.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationalError::NetworkError { .. } => ErrorKind::Network,
            OperationalError::Timeout { .. } => ErrorKind::Timeout,
            OperationalError::RateLimited { .. } => ErrorKind::RateLimited,
            OperationalError::Internal { .. } => ErrorKind::Internal,
            OperationalError::Unavailable { .. } => ErrorKind::Unavailable,
            OperationalError::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            OperationalError::SerializationError { .. } => ErrorKind::Serialization,
        }
    }
}

impl fmt::Display for OperationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationalError::NetworkError { message } => write!(f, "network error: {}", message),
            OperationalError::Timeout { operation } => write!(f, "timeout: {}", operation),
            OperationalError::RateLimited { service, retry_after_ms } => {
                write!(f, "rate limited by {}, retry after {}ms", service, retry_after_ms)
            }
            OperationalError::Internal { message } => write!(f, "internal error: {}", message),
            OperationalError::Unavailable { resource } => write!(f, "unavailable: {}", resource),
            OperationalError::RetryExhausted { reason } => write!(f, "retries exhausted: {}", reason),
            OperationalError::SerializationError { message } => write!(f, "serialization error: {}", message),
        }
    }
}

impl std::error::Error for OperationalError {}

// ============================================================================
// ERROR KIND
// ============================================================================

/// High-level error categorization for metrics and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ErrorKind {
    // Domain error kinds
    NotFound,
    Validation,
    BusinessLogic,
    QuotaExceeded,

    // Operational error kinds
    Network,
    Timeout,
    RateLimited,
    Internal,
    Unavailable,
    RetryExhausted,
    Serialization,
}

impl ErrorKind {
    /// Check if this is a retriable error kind.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimited | ErrorKind::Unavailable
        )
    }

    /// Check if this is a domain error kind.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotFound | ErrorKind::Validation | ErrorKind::BusinessLogic | ErrorKind::QuotaExceeded
        )
    }
}

// ============================================================================
// SERDE HELPERS
// ============================================================================

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_ok() {
        let effect: Effect<i32> = Effect::ok(42);
        assert!(effect.is_ok());
        assert_eq!(effect.unwrap(), 42);
    }

    #[test]
    fn effect_domain_err() {
        let effect: Effect<i32> = Effect::domain_error(
            DomainError::PolicyNotFound {
                tenant_id: "t1".to_string(),
                policy_id: Uuid::nil(),
            },
            Uuid::nil(),
        );
        assert!(effect.is_err());
    }

    #[test]
    fn effect_retry() {
        let effect: Effect<i32> = Effect::retry(Duration::from_secs(1), 1, 3, "transient");
        assert!(effect.needs_retry());
    }

    #[test]
    fn effect_map() {
        let effect: Effect<i32> = Effect::ok(42);
        let mapped = effect.map(|n| n * 2);
        assert_eq!(mapped.unwrap(), 84);
    }

    #[test]
    fn error_kind_retriable() {
        assert!(ErrorKind::Network.is_retriable());
        assert!(ErrorKind::Timeout.is_retriable());
        assert!(!ErrorKind::NotFound.is_retriable());
        assert!(!ErrorKind::BusinessLogic.is_retriable());
    }

    #[test]
    fn domain_vs_operational() {
        let domain = ErrorEffect::Domain(DomainErrorContext {
            error: DomainError::TenantUnknown { tenant_id: "t1".to_string() },
            request_id: Uuid::nil(),
        });
        assert!(domain.is_domain());

        let operational = ErrorEffect::Operational(OperationalError::Timeout {
            operation: "enforce".to_string(),
        });
        assert!(operational.is_operational());
    }
}
