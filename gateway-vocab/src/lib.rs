//! Gateway Vocab - canonical vocabulary registry
//!
//! Closed keyword tables for inferring intent fields from raw tool calls,
//! and the anchor-text templates C2 (encoding) uses to turn a structured
//! intent or policy constraint into text before embedding.

mod error;
mod registry;

pub use error::VocabError;
pub use registry::{VocabularyRegistry, VOCABULARY};
