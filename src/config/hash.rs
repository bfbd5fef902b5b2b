//! Snapshot hashing for change detection.
//!
//! This module computes a deterministic fingerprint of a snapshot. Record
//! order inside a collection does not change the fingerprint.

use sha2::{Digest, Sha256};

use super::entity::EntityKind;
use super::spec::ClusterConfig;
use crate::error::{ConfigError, Result};
use crate::planner::Keyed;

/// Hasher for computing snapshot hashes.
#[derive(Debug, Default)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new snapshot hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of the compared parts of a snapshot.
    ///
    /// The cluster environment is left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized.
    pub fn hash_config(&self, config: &ClusterConfig) -> Result<String> {
        let canonical = canonicalize(config);
        let bytes = serde_json::to_vec(&canonical).map_err(|e| ConfigError::SerializeError {
            message: e.to_string(),
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

/// Rebuilds a snapshot with every collection sorted by key.
fn canonicalize(config: &ClusterConfig) -> ClusterConfig {
    let mut canonical = ClusterConfig {
        global_config: config.global_config.clone(),
        ..ClusterConfig::default()
    };

    for kind in EntityKind::CREATION_ORDER {
        let mut records = config.records(kind);
        records.sort_by(|a, b| a.key().cmp(b.key()));
        records.into_iter().for_each(|r| canonical.push(r));
    }

    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::{ClusterEnvironment, ProjectConfig};

    fn create_test_config() -> ClusterConfig {
        ClusterConfig {
            managers: vec![String::from("root"), String::from("admin")],
            projects: vec![
                ProjectConfig {
                    name: String::from("alpha"),
                    ..ProjectConfig::default()
                },
                ProjectConfig {
                    name: String::from("beta"),
                    ..ProjectConfig::default()
                },
            ],
            ..ClusterConfig::default()
        }
    }

    #[test]
    fn test_hash_deterministic() {
        let hasher = ConfigHasher::new();
        let config = create_test_config();

        let hash1 = hasher.hash_config(&config).expect("hashable");
        let hash2 = hasher.hash_config(&config).expect("hashable");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_hash_ignores_record_order() {
        let hasher = ConfigHasher::new();
        let config = create_test_config();
        let mut permuted = config.clone();
        permuted.managers.reverse();
        permuted.projects.reverse();

        assert_eq!(
            hasher.hash_config(&config).expect("hashable"),
            hasher.hash_config(&permuted).expect("hashable")
        );
    }

    #[test]
    fn test_hash_ignores_cluster_environment() {
        let hasher = ConfigHasher::new();
        let config = create_test_config();
        let mut annotated = config.clone();
        annotated.cluster_environment = Some(ClusterEnvironment::default());

        assert_eq!(
            hasher.hash_config(&config).expect("hashable"),
            hasher.hash_config(&annotated).expect("hashable")
        );
    }

    #[test]
    fn test_different_configs_different_hash() {
        let hasher = ConfigHasher::new();
        let config = create_test_config();
        let mut changed = config.clone();
        changed.projects[0].fshare = 1;

        assert_ne!(
            hasher.hash_config(&config).expect("hashable"),
            hasher.hash_config(&changed).expect("hashable")
        );
    }

    #[test]
    fn test_short_hash() {
        let hasher = ConfigHasher::new();
        let full_hash = "abcdef1234567890abcdef1234567890";
        let short = hasher.short_hash(full_hash);

        assert_eq!(short, "abcdef12");
        assert_eq!(short.len(), 8);
    }
}
