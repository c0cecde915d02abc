//! Gateway Store - the installed policy set and its encoded anchor tensors
//!
//! A tenant-scoped, in-memory record of every installed Design Boundary
//! paired with the Rule Vector encoded from its anchor text. This is the
//! store the enforcement engine reads directly; there is no separate
//! persistence layer behind it.

mod key;
mod store;

#[cfg(feature = "anchor-authoring")]
mod anchor_authoring;

pub use key::PolicyKey;
pub use store::{PolicyRecord, PolicySink, PolicyStore};

#[cfg(feature = "anchor-authoring")]
pub use anchor_authoring::{propose_rule_vector, AnchorTextGenerator, AnchorTextProposal, ConstraintAnchorGenerator};
