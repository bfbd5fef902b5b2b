//! Apply phases.
//!
//! This module pushes the records of a snapshot to the control plane: one
//! create, update or delete call per record, strictly in sequence and in
//! creation order (reverse order for deletion). Every phase reports exactly
//! the records it changed, so a caller can undo them after a failure.

use std::fmt;
use tracing::{debug, error, info, warn};

use crate::config::{ClusterConfig, EntityKind, EntityRecord};
use crate::control::ControlPlane;
use crate::error::{ApplyError, Operation};

/// Runs apply phases against a control plane.
pub struct ConfigApplier<'a> {
    /// Control plane receiving the calls.
    plane: &'a dyn ControlPlane,
}

/// Outcome of one apply phase.
#[derive(Debug)]
pub struct PhaseReport {
    /// Operation issued by this phase.
    pub operation: Operation,
    /// Records whose call succeeded, in a snapshot of their own.
    pub completed: ClusterConfig,
    /// Number of calls issued.
    pub attempted: usize,
    /// Failure that stopped the phase, or every failure when continuing.
    pub error: Option<ApplyError>,
}

impl PhaseReport {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            completed: ClusterConfig::default(),
            attempted: 0,
            error: None,
        }
    }

    /// Returns true if every call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the number of records changed.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.completed.entity_count() + usize::from(self.completed.global_config.is_some())
    }

    /// Converts the report into the changed records or the failure.
    ///
    /// # Errors
    ///
    /// Returns the phase failure, discarding the changed records.
    pub fn into_result(self) -> Result<ClusterConfig, ApplyError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.completed),
        }
    }
}

impl<'a> ConfigApplier<'a> {
    /// Creates a new applier over the given control plane.
    #[must_use]
    pub fn new(plane: &'a dyn ControlPlane) -> Self {
        Self { plane }
    }

    /// Creates every record of `config` in creation order.
    ///
    /// Stops at the first failure. The global configuration is not touched.
    pub async fn add_all(&self, config: &ClusterConfig) -> PhaseReport {
        let mut report = PhaseReport::new(Operation::Create);
        info!("Adding {} entities", config.entity_count());

        for kind in EntityKind::CREATION_ORDER {
            for record in config.records(kind) {
                report.attempted += 1;
                debug!("Adding {kind} {}", record.name());

                if let Err(source) = self.plane.create(&record).await {
                    error!("Failed to add {kind} {}: {source}", record.name());
                    report.error = Some(mutation_error(Operation::Create, &record, source));
                    return report;
                }
                report.completed.push(record);
            }
        }

        report
    }

    /// Updates every record of `config` in creation order, then the global
    /// configuration if present.
    ///
    /// Stops at the first failure. Records must already exist.
    pub async fn modify_all(&self, config: &ClusterConfig) -> PhaseReport {
        let mut report = PhaseReport::new(Operation::Update);
        info!("Modifying {} entities", config.entity_count());

        for kind in EntityKind::CREATION_ORDER {
            for record in config.records(kind) {
                report.attempted += 1;
                debug!("Modifying {kind} {}", record.name());

                if let Err(source) = self.plane.update(record.name(), &record).await {
                    error!("Failed to modify {kind} {}: {source}", record.name());
                    report.error = Some(mutation_error(Operation::Update, &record, source));
                    return report;
                }
                report.completed.push(record);
            }
        }

        if let Some(global) = &config.global_config {
            report.attempted += 1;
            debug!("Modifying global configuration");

            if let Err(source) = self.plane.modify_global_config(global).await {
                error!("Failed to modify global configuration: {source}");
                report.error = Some(ApplyError::GlobalConfig { source });
                return report;
            }
            report.completed.global_config = Some(global.clone());
        }

        report
    }

    /// Deletes every record of `config` in reverse creation order.
    ///
    /// With `continue_on_error` every record is attempted and all failures
    /// are combined into one [`ApplyError::Aggregate`]; otherwise the phase
    /// stops at the first failure. The global configuration is not touched.
    pub async fn delete_all(&self, config: &ClusterConfig, continue_on_error: bool) -> PhaseReport {
        let mut report = PhaseReport::new(Operation::Delete);
        let mut failures = Vec::new();
        info!("Deleting {} entities", config.entity_count());

        for kind in EntityKind::deletion_order() {
            for record in config.records(kind) {
                report.attempted += 1;
                debug!("Deleting {kind} {}", record.name());

                match self.plane.delete(kind, record.name()).await {
                    Ok(()) => report.completed.push(record),
                    Err(source) => {
                        let failure = mutation_error(Operation::Delete, &record, source);
                        if !continue_on_error {
                            error!("{failure}");
                            report.error = Some(failure);
                            return report;
                        }
                        warn!("{failure}, continuing");
                        failures.push(failure);
                    }
                }
            }
        }

        if !failures.is_empty() {
            error!("{} of {} deletions failed", failures.len(), report.attempted);
            report.error = Some(ApplyError::Aggregate(failures));
        }

        report
    }
}

fn mutation_error(
    operation: Operation,
    record: &EntityRecord,
    source: crate::error::ControlPlaneError,
) -> ApplyError {
    ApplyError::Mutation {
        operation,
        kind: record.kind(),
        key: record.name().to_string(),
        source,
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_success() { "SUCCESS" } else { "FAILED" };
        writeln!(f, "{} phase: {status}", self.operation)?;
        writeln!(f, "  Attempted: {}", self.attempted)?;
        writeln!(f, "  Succeeded: {}", self.succeeded())?;
        if let Some(err) = &self.error {
            writeln!(f, "  Error: {err}")?;
        }
        Ok(())
    }
}
