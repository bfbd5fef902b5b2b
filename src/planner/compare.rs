//! Snapshot comparison.
//!
//! Applies the keyed differ to every collection of two snapshots and gathers
//! the results into three snapshot-shaped aggregates.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::diff::find_differences;
use crate::config::{ClusterConfig, EntityKind};
use crate::error::{CompareError, Result};

/// Result of comparing an old snapshot with a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterComparison {
    /// True iff nothing differs between the two snapshots.
    pub is_same: bool,
    /// True if the global configuration differs.
    pub global_config_changed: bool,
    /// Records present only in the new snapshot.
    pub diff_added: ClusterConfig,
    /// New versions of changed records, and the new global configuration
    /// when it changed.
    pub diff_modified: ClusterConfig,
    /// Records present only in the old snapshot.
    pub diff_removed: ClusterConfig,
}

impl ClusterComparison {
    /// Returns the number of entities added, modified and removed.
    #[must_use]
    pub fn change_counts(&self) -> (usize, usize, usize) {
        (
            self.diff_added.entity_count(),
            self.diff_modified.entity_count(),
            self.diff_removed.entity_count(),
        )
    }

    fn has_no_changes(&self) -> bool {
        !self.global_config_changed
            && self.diff_added.is_empty()
            && self.diff_modified.is_empty()
            && self.diff_removed.is_empty()
    }
}

/// Compares two snapshots collection by collection.
///
/// The cluster environment is informational and never compared.
///
/// # Errors
///
/// Returns an error naming the collection if a record key cannot be
/// extracted. No partial comparison is returned.
pub fn compare(old: &ClusterConfig, new: &ClusterConfig) -> Result<ClusterComparison> {
    let mut comparison = ClusterComparison::default();

    for kind in EntityKind::CREATION_ORDER {
        let diff = find_differences(&old.records(kind), &new.records(kind)).map_err(|source| {
            CompareError::Collection {
                collection: kind.collection(),
                source,
            }
        })?;

        if !diff.is_empty() {
            debug!(
                "{}: {} added, {} modified, {} removed",
                kind.collection(),
                diff.added.len(),
                diff.modified.len(),
                diff.removed.len()
            );
        }

        diff.added.into_iter().for_each(|r| comparison.diff_added.push(r));
        diff.modified.into_iter().for_each(|r| comparison.diff_modified.push(r));
        diff.removed.into_iter().for_each(|r| comparison.diff_removed.push(r));
    }

    if old.global_config != new.global_config {
        debug!("global configuration changed");
        comparison.global_config_changed = true;
        comparison.diff_modified.global_config.clone_from(&new.global_config);
    }

    comparison.is_same = comparison.has_no_changes();

    let (added, modified, removed) = comparison.change_counts();
    info!(
        "Compared snapshots: {added} added, {modified} modified, {removed} removed, \
         global config changed: {}",
        comparison.global_config_changed
    );

    Ok(comparison)
}
