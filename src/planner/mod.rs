//! Planning module for reconciliation.
//!
//! This module compares snapshots collection by collection, turns the
//! comparison into a reviewable plan and runs the apply phases.

mod compare;
mod diff;
mod executor;
mod plan;

pub use compare::{compare, ClusterComparison};
pub use diff::{find_differences, DiffResult, Keyed};
pub use executor::{ConfigApplier, PhaseReport};
pub use plan::{ActionTarget, ApplyPlan, PlannedAction};
