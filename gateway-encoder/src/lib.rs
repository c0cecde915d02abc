//! Gateway Encoder - semantic encoding pipeline
//!
//! Turns an Intent Event into an Intent Vector, and a policy's per-slice
//! anchor texts into a Rule Vector, by assembling canonical anchor text
//! (`gateway-vocab`), embedding it (`gateway-embed`), and projecting the
//! raw embedding down to 32 dimensions per slice.

mod anchor;
mod cache;
mod encoder;
mod error;
mod params;
mod projection;

pub use cache::{content_key, SlotCache};
pub use encoder::{RuleAnchorTexts, SemanticEncoder};
pub use error::EncodeError;
pub use projection::{matrix_for, seed_for, EMBEDDING_DIM};
