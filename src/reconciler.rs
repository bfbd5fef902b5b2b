//! Reconciler for converging the live cluster onto a desired snapshot.
//!
//! This module implements the top-level apply: read the live configuration,
//! compare it with the desired snapshot, then run the add, modify and delete
//! phases in order. It also provides the read-only drift check and the
//! destroy operation.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{ClusterConfig, ConfigHasher, EntityKind};
use crate::control::{ControlPlane, DryRunControlPlane, SnapshotReader};
use crate::error::{ApplyError, Result};
use crate::planner::{compare, ApplyPlan, ClusterComparison, ConfigApplier, PhaseReport};

/// Reconciler for maintaining desired state.
pub struct Reconciler<'a> {
    /// Control plane of the live cluster.
    plane: &'a dyn ControlPlane,
    /// Configuration hasher.
    hasher: ConfigHasher,
}

/// Result of a top-level apply.
#[derive(Debug, Default, Serialize)]
pub struct ApplyOutcome {
    /// Whether mutations were only reported.
    pub dry_run: bool,
    /// Whether any mutation was issued.
    pub changed: bool,
    /// Entities created.
    pub added: ClusterConfig,
    /// Entities updated, and the global configuration if it was updated.
    pub modified: ClusterConfig,
    /// Entities deleted.
    pub deleted: ClusterConfig,
}

impl ApplyOutcome {
    /// Returns the number of entities created, updated and deleted.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.added.entity_count(),
            self.modified.entity_count(),
            self.deleted.entity_count(),
        )
    }

    fn issued_any(&self) -> bool {
        let (added, modified, deleted) = self.counts();
        added + modified + deleted > 0 || self.modified.global_config.is_some()
    }
}

impl<'a> Reconciler<'a> {
    /// Creates a new reconciler over the given control plane.
    #[must_use]
    pub fn new(plane: &'a dyn ControlPlane) -> Self {
        Self {
            plane,
            hasher: ConfigHasher::new(),
        }
    }

    /// Reads the live configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any collection cannot be read.
    pub async fn read_current(&self) -> Result<ClusterConfig> {
        Ok(SnapshotReader::new(self.plane).read().await?)
    }

    /// Builds the plan of calls that applying `desired` would issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the live configuration cannot be read or the
    /// snapshots cannot be compared.
    pub async fn plan(&self, desired: &ClusterConfig) -> Result<ApplyPlan> {
        let live = self.read_current().await?;
        let comparison = compare(&live, desired)?;
        let config_hash = self.hasher.hash_config(desired)?;

        Ok(ApplyPlan::from_comparison(&comparison, &config_hash))
    }

    /// Converges the live cluster onto `desired`.
    ///
    /// Nothing is called when the live cluster already matches. Otherwise
    /// the add, modify and delete phases run in that order; the first
    /// failing phase aborts the apply and earlier phases are not undone.
    /// With `dry_run` every mutation is only logged.
    ///
    /// # Errors
    ///
    /// Returns a read or comparison error before any mutation, or an
    /// [`ApplyError::Phase`] carrying the entities the failing phase changed.
    pub async fn apply(&self, desired: &ClusterConfig, dry_run: bool) -> Result<ApplyOutcome> {
        let live = self.read_current().await?;
        let comparison = compare(&live, desired)?;

        if comparison.is_same {
            info!("No changes required - cluster is converged");
            return Ok(ApplyOutcome {
                dry_run,
                ..ApplyOutcome::default()
            });
        }

        let dry_plane = DryRunControlPlane::new(self.plane);
        let plane: &dyn ControlPlane = if dry_run {
            info!("Dry run: mutations will only be reported");
            &dry_plane
        } else {
            self.plane
        };
        let applier = ConfigApplier::new(plane);

        let added = finish_phase(applier.add_all(&comparison.diff_added).await)?;
        let modified = finish_phase(applier.modify_all(&comparison.diff_modified).await)?;
        let deleted = finish_phase(applier.delete_all(&comparison.diff_removed, false).await)?;

        let mut outcome = ApplyOutcome {
            dry_run,
            changed: false,
            added,
            modified,
            deleted,
        };
        outcome.changed = outcome.issued_any();
        if !outcome.changed {
            warn!("Live global configuration is not in the desired snapshot and cannot be removed");
        }

        let (created, updated, removed) = outcome.counts();
        info!("Apply complete: {created} created, {updated} updated, {removed} deleted");

        Ok(outcome)
    }

    /// Compares the live cluster with `desired` without changing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the live configuration cannot be read or the
    /// snapshots cannot be compared.
    pub async fn check_drift(&self, desired: &ClusterConfig) -> Result<DriftReport> {
        info!("Checking for drift");

        let live = self.read_current().await?;
        let comparison = compare(&live, desired)?;

        let report = DriftReport::from_comparison(&comparison, &live, desired);
        if report.has_drift {
            warn!("Drift detected on {} entities", report.drifted_count());
        }

        Ok(report)
    }

    /// Deletes every live entity in reverse creation order.
    ///
    /// The global configuration cannot be deleted and is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the live configuration cannot be read. Deletion
    /// failures are carried in the returned report.
    pub async fn destroy(&self, continue_on_error: bool) -> Result<PhaseReport> {
        let live = self.read_current().await?;
        info!("Destroying {} live entities", live.entity_count());

        let report = ConfigApplier::new(self.plane)
            .delete_all(&live, continue_on_error)
            .await;

        if let Some(err) = &report.error {
            error!("Destroy failed: {err}");
        }

        Ok(report)
    }
}

/// Wraps a phase failure with the entities the phase changed.
fn finish_phase(report: PhaseReport) -> std::result::Result<ClusterConfig, ApplyError> {
    match report.error {
        None => Ok(report.completed),
        Some(source) => Err(ApplyError::Phase {
            operation: report.operation,
            completed: Box::new(report.completed),
            source: Box::new(source),
        }),
    }
}

/// Report of drift detection.
#[derive(Debug, Serialize)]
pub struct DriftReport {
    /// Whether drift was detected.
    pub has_drift: bool,
    /// Desired entities absent from the live cluster.
    pub missing: Vec<String>,
    /// Entities whose live version differs from the desired one.
    pub changed: Vec<String>,
    /// Live entities absent from the desired snapshot.
    pub unmanaged: Vec<String>,
    /// Whether the desired global configuration differs from the live one.
    pub global_config_changed: bool,
    /// Whether the cluster has a global configuration the desired snapshot
    /// omits. It cannot be removed, so it is not counted as drift.
    pub global_config_unmanaged: bool,
    /// Number of live entities.
    pub live_count: usize,
    /// Number of desired entities.
    pub desired_count: usize,
}

impl DriftReport {
    fn from_comparison(
        comparison: &ClusterComparison,
        live: &ClusterConfig,
        desired: &ClusterConfig,
    ) -> Self {
        let global_config_unmanaged =
            live.global_config.is_some() && desired.global_config.is_none();
        let global_config_changed = comparison.global_config_changed && !global_config_unmanaged;

        let mut report = Self {
            has_drift: false,
            missing: describe(&comparison.diff_added),
            changed: describe(&comparison.diff_modified),
            unmanaged: describe(&comparison.diff_removed),
            global_config_changed,
            global_config_unmanaged,
            live_count: live.entity_count(),
            desired_count: desired.entity_count(),
        };
        report.has_drift = report.drifted_count() > 0 || global_config_changed;
        report
    }

    /// Returns true if the live cluster matches the desired snapshot.
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        !self.has_drift
    }

    /// Returns the number of drifted entities.
    #[must_use]
    pub fn drifted_count(&self) -> usize {
        self.missing.len() + self.changed.len() + self.unmanaged.len()
    }
}

fn describe(config: &ClusterConfig) -> Vec<String> {
    EntityKind::CREATION_ORDER
        .into_iter()
        .flat_map(|kind| {
            config
                .keys(kind)
                .into_iter()
                .map(move |key| format!("{kind} {key}"))
        })
        .collect()
}

impl std::fmt::Display for DriftReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.has_drift {
            write!(f, "No drift detected - cluster is converged")?;
            if self.global_config_unmanaged {
                write!(f, " (live global configuration cannot be removed)")?;
            }
            return Ok(());
        }

        writeln!(f, "Drift detected:")?;
        for entity in &self.missing {
            writeln!(f, "  + {entity}")?;
        }
        for entity in &self.changed {
            writeln!(f, "  ~ {entity}")?;
        }
        for entity in &self.unmanaged {
            writeln!(f, "  - {entity}")?;
        }
        if self.global_config_changed {
            writeln!(f, "  ~ global configuration")?;
        }
        Ok(())
    }
}
