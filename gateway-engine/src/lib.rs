//! Gateway Engine - the enforcement decision pipeline
//!
//! For a single intent: select applicable policies from the store,
//! score each against its anchors, and aggregate deny-first into one
//! Comparison Result.

mod aggregation;
mod applicability;
mod decision;
mod engine;

pub use aggregation::{aggregate, Evaluated};
pub use applicability::evaluate_applicability;
pub use decision::{local_decision, slice_similarities};
pub use engine::EnforcementEngine;
