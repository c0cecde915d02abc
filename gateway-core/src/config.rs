//! Configuration types.

use crate::{ConfigError, GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Local-decision aggregation mode for a single policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AggregationMode {
    /// Every slice similarity must meet its own threshold.
    Min,
    /// Weighted average must meet the global threshold AND every slice must
    /// still meet its own threshold.
    WeightedAvg,
}

/// Applicability filter mode, mirroring the management-plane's
/// `APPLICABILITY_MODE` environment switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ApplicabilityMode {
    /// Accept by score alone; soft rule mismatches only count against the score.
    Soft,
    /// Reject outright if any participating soft rule mismatches, regardless
    /// of score.
    Strict,
}

/// Applicability filter configuration.
///
/// ALL values are required — no implicit defaults except through
/// [`ApplicabilityConfig::from_env`], which mirrors the management-plane's
/// own env-var fallback behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApplicabilityConfig {
    pub mode: ApplicabilityMode,
    pub min_score: f32,
}

impl ApplicabilityConfig {
    pub fn validate(&self) -> GatewayResult<()> {
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "applicability.min_score".to_string(),
                value: self.min_score.to_string(),
                reason: "min_score must be between 0.0 and 1.0".to_string(),
            }));
        }
        Ok(())
    }

    /// Read from `GATEWAY_APPLICABILITY_MODE` / `GATEWAY_APPLICABILITY_MIN_SCORE`,
    /// falling back to soft mode / 0.5 on any unset or unparseable value —
    /// the same fallback-on-parse-failure behavior as the Python
    /// `_get_mode()`/`_get_min_score()` helpers it replaces.
    pub fn from_env() -> Self {
        let mode = match std::env::var("GATEWAY_APPLICABILITY_MODE") {
            Ok(s) if s.eq_ignore_ascii_case("strict") => ApplicabilityMode::Strict,
            _ => ApplicabilityMode::Soft,
        };
        let min_score = std::env::var("GATEWAY_APPLICABILITY_MIN_SCORE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|v| (0.0..=1.0).contains(v))
            .unwrap_or(0.5);
        Self { mode, min_score }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProviderConfig {
    pub provider_type: String,
    pub endpoint: Option<String>,
    pub model: String,
    pub dimensions: i32,
}

/// Retry configuration for provider and transport operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RetryConfig {
    pub max_retries: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub initial_backoff: Duration,
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub max_backoff: Duration,
    pub backoff_multiplier: f32,
}

/// Master configuration struct for the enforcement gateway.
/// ALL values are required - no defaults anywhere, except through the
/// explicit [`GatewayConfig::default_for`] convenience constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GatewayConfig {
    // Encoding (REQUIRED)
    pub embedding_provider: ProviderConfig,
    pub embedding_retry: RetryConfig,
    /// Bound on the content-addressed embedding cache.
    pub embedding_cache_capacity: usize,

    // Applicability filter (REQUIRED)
    pub applicability: ApplicabilityConfig,

    // Session / drift tracking (REQUIRED)
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub session_idle_timeout: Duration,
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub session_absolute_timeout: Duration,
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub session_sweep_interval: Duration,
    pub max_call_history: usize,

    // Enforcement transport (REQUIRED)
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub enforcement_deadline: Duration,
    pub fail_closed: bool,

    // Policy store (REQUIRED)
    pub max_anchors_per_slice: usize,
}

impl GatewayConfig {
    /// Build a configuration with the management-plane's own defaults
    /// (30 minute idle / 24 hour absolute session expiry, 16 anchors per
    /// slice, fail-closed transport) layered over a caller-supplied
    /// embedding provider.
    pub fn default_for(embedding_provider: ProviderConfig) -> Self {
        Self {
            embedding_provider,
            embedding_retry: RetryConfig {
                max_retries: 3,
                initial_backoff: Duration::from_millis(100),
                max_backoff: Duration::from_secs(10),
                backoff_multiplier: 2.0,
            },
            embedding_cache_capacity: 10_000,
            applicability: ApplicabilityConfig {
                mode: ApplicabilityMode::Soft,
                min_score: 0.5,
            },
            session_idle_timeout: Duration::from_secs(1800),
            session_absolute_timeout: Duration::from_secs(86400),
            session_sweep_interval: Duration::from_secs(300),
            max_call_history: 200,
            enforcement_deadline: Duration::from_millis(500),
            fail_closed: true,
            max_anchors_per_slice: 16,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.embedding_provider.dimensions <= 0 {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "embedding_provider.dimensions".to_string(),
                value: self.embedding_provider.dimensions.to_string(),
                reason: "dimensions must be greater than 0".to_string(),
            }));
        }

        if self.embedding_cache_capacity == 0 {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "embedding_cache_capacity".to_string(),
                value: "0".to_string(),
                reason: "embedding_cache_capacity must be positive".to_string(),
            }));
        }

        self.applicability.validate()?;

        if self.session_idle_timeout.is_zero() {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "session_idle_timeout".to_string(),
                value: format!("{:?}", self.session_idle_timeout),
                reason: "session_idle_timeout must be positive".to_string(),
            }));
        }

        if self.session_absolute_timeout <= self.session_idle_timeout {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "session_absolute_timeout".to_string(),
                value: format!("{:?}", self.session_absolute_timeout),
                reason: "session_absolute_timeout must exceed session_idle_timeout".to_string(),
            }));
        }

        if self.session_sweep_interval.is_zero() {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "session_sweep_interval".to_string(),
                value: format!("{:?}", self.session_sweep_interval),
                reason: "session_sweep_interval must be positive".to_string(),
            }));
        }

        if self.max_call_history == 0 {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "max_call_history".to_string(),
                value: "0".to_string(),
                reason: "max_call_history must be positive".to_string(),
            }));
        }

        if self.enforcement_deadline.is_zero() {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "enforcement_deadline".to_string(),
                value: format!("{:?}", self.enforcement_deadline),
                reason: "enforcement_deadline must be positive".to_string(),
            }));
        }

        if self.max_anchors_per_slice == 0 {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "max_anchors_per_slice".to_string(),
                value: "0".to_string(),
                reason: "max_anchors_per_slice must be positive".to_string(),
            }));
        }

        if self.embedding_retry.max_retries < 0 {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "embedding_retry.max_retries".to_string(),
                value: self.embedding_retry.max_retries.to_string(),
                reason: "max_retries must be non-negative".to_string(),
            }));
        }

        if self.embedding_retry.backoff_multiplier <= 0.0 {
            return Err(GatewayError::Config(ConfigError::InvalidValue {
                field: "embedding_retry.backoff_multiplier".to_string(),
                value: self.embedding_retry.backoff_multiplier.to_string(),
                reason: "backoff_multiplier must be positive".to_string(),
            }));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_provider() -> ProviderConfig {
        ProviderConfig {
            provider_type: "mock".to_string(),
            endpoint: None,
            model: "mock-embed".to_string(),
            dimensions: 384,
        }
    }

    #[test]
    fn default_for_validates() {
        let cfg = GatewayConfig::default_for(sample_provider());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_dimensions() {
        let mut provider = sample_provider();
        provider.dimensions = 0;
        let cfg = GatewayConfig::default_for(provider);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_absolute_timeout_not_exceeding_idle() {
        let mut cfg = GatewayConfig::default_for(sample_provider());
        cfg.session_absolute_timeout = cfg.session_idle_timeout;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn applicability_from_env_falls_back_to_soft_default() {
        std::env::remove_var("GATEWAY_APPLICABILITY_MODE");
        std::env::remove_var("GATEWAY_APPLICABILITY_MIN_SCORE");
        let cfg = ApplicabilityConfig::from_env();
        assert_eq!(cfg.mode, ApplicabilityMode::Soft);
        assert_eq!(cfg.min_score, 0.5);
    }
}
