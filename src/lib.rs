// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Gridconf
//!
//! Declarative configuration management for compute-cluster schedulers.
//!
//! ## Overview
//!
//! Gridconf treats the configuration of a cluster scheduler (queues, hosts,
//! projects, users, resource definitions, parallel environments, quota sets
//! and the global configuration) as one snapshot, and lets you:
//!
//! - Describe the desired configuration in a YAML or JSON file
//! - Compare any two snapshots collection by collection
//! - Converge the live cluster onto the desired snapshot
//! - Detect drift and export the live configuration
//!
//! ## Architecture
//!
//! The system is built around **snapshot reconciliation**:
//!
//! 1. **Desired snapshot**: loaded from `gridconf.yaml`
//! 2. **Live snapshot**: read from the control plane, one collection at a time
//! 3. **Comparator**: classifies every record as added, modified or removed
//! 4. **Apply phases**: create, update, then delete, in dependency order
//!
//! ## Modules
//!
//! - [`config`]: Snapshot types, parsing, validation and hashing
//! - [`control`]: Control plane trait, local backend, locking and wrappers
//! - [`planner`]: Keyed differ, comparator, plans and apply phases
//! - [`reconciler`]: Top-level apply, drift check and destroy
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! managers:
//!   - root
//! projects:
//!   - name: physics
//!     fshare: 100
//! cluster_queues:
//!   - qname: all.q
//!     hostlist: ["@allhosts"]
//!     slots: ["8"]
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod planner;
pub mod reconciler;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{
    ClusterConfig, ConfigHasher, ConfigValidator, EntityKind, EntityRecord, SnapshotParser,
};
pub use control::{ControlPlane, LocalControlPlane};
pub use error::{GridconfError, Result};
pub use planner::{compare, find_differences, ApplyPlan, ClusterComparison, ConfigApplier};
pub use reconciler::{ApplyOutcome, DriftReport, Reconciler};
