use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbedError {
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: i32, got: i32 },

    #[error("no embedding provider is currently allowed (circuit open)")]
    ProviderUnavailable,

    #[error("no embedding provider is registered")]
    ProviderNotConfigured,
}
