use gateway_core::Slice;
use thiserror::Error;

/// Errors raised while assembling anchor text from vocabulary templates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VocabError {
    #[error("no template registered for slot {slot:?} variant {variant}")]
    TemplateNotFound { slot: Slice, variant: &'static str },

    #[error("template {template:?} references field {field} which was not supplied")]
    MissingField { template: String, field: String },

    #[error("embedded vocabulary asset failed to parse: {0}")]
    AssetMalformed(String),
}
