//! Live snapshot reader.
//!
//! Assembles a full [`ClusterConfig`] from the live cluster, one collection
//! at a time.

use tracing::{debug, info};

use crate::config::{ClusterConfig, EntityKind, EntityRecord};
use crate::error::ReadError;

use super::plane::ControlPlane;

/// Reads the live cluster into a snapshot.
pub struct SnapshotReader<'a> {
    plane: &'a dyn ControlPlane,
}

impl<'a> SnapshotReader<'a> {
    /// Creates a new reader over the given control plane.
    #[must_use]
    pub fn new(plane: &'a dyn ControlPlane) -> Self {
        Self { plane }
    }

    /// Reads every collection and the global configuration.
    ///
    /// Flat name lists need only the key listing; structured kinds are read
    /// record by record.
    ///
    /// # Errors
    ///
    /// Returns an error naming the collection or record that could not be
    /// read. No partial snapshot is returned.
    pub async fn read(&self) -> Result<ClusterConfig, ReadError> {
        info!("Reading live configuration from {} backend", self.plane.backend_type());

        let mut config = ClusterConfig {
            global_config: self
                .plane
                .show_global_config()
                .await
                .map_err(|source| ReadError::GlobalConfig { source })?,
            ..ClusterConfig::default()
        };

        for kind in EntityKind::CREATION_ORDER {
            for record in self.read_collection(kind).await? {
                config.push(record);
            }
        }

        debug!("Read {} live entities", config.entity_count());
        Ok(config)
    }

    /// Reads all records of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if listing or reading any record fails.
    pub async fn read_collection(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, ReadError> {
        let keys = self.plane.list(kind).await.map_err(|source| ReadError::List {
            collection: kind.collection(),
            source,
        })?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let record = match kind {
                EntityKind::Manager => EntityRecord::Manager(key),
                EntityKind::Operator => EntityRecord::Operator(key),
                EntityKind::AdminHost => EntityRecord::AdminHost(key),
                EntityKind::SubmitHost => EntityRecord::SubmitHost(key),
                _ => self
                    .plane
                    .read(kind, &key)
                    .await
                    .map_err(|source| ReadError::Record { kind, key, source })?,
            };
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GlobalConfig, UserConfig};
    use crate::control::plane::MockControlPlane;
    use crate::control::LocalControlPlane;
    use crate::error::ControlPlaneError;

    #[test]
    fn test_read_round_trips_local_state() {
        let config = ClusterConfig {
            global_config: Some(GlobalConfig::default()),
            managers: vec![String::from("root")],
            users: vec![UserConfig {
                name: String::from("alice"),
                fshare: 5,
                ..UserConfig::default()
            }],
            ..ClusterConfig::default()
        };
        let plane = LocalControlPlane::in_memory(config.clone());

        let read = tokio_test::block_on(SnapshotReader::new(&plane).read()).expect("readable");
        assert_eq!(read, config);
    }

    #[tokio::test]
    async fn test_list_failure_names_collection() {
        let mut plane = MockControlPlane::new();
        plane.expect_backend_type().return_const("mock");
        plane.expect_show_global_config().returning(|| Ok(None));
        plane.expect_list().returning(|kind| {
            if kind == EntityKind::Project {
                Err(ControlPlaneError::backend("connection refused"))
            } else {
                Ok(Vec::new())
            }
        });

        let err = SnapshotReader::new(&plane).read().await.expect_err("list fails");
        assert!(matches!(err, ReadError::List { collection: "projects", .. }));
        assert_eq!(
            err.to_string(),
            "failed to list projects: backend failure: connection refused"
        );
    }

    #[tokio::test]
    async fn test_flat_kinds_are_not_read_individually() {
        let mut plane = MockControlPlane::new();
        plane.expect_backend_type().return_const("mock");
        plane.expect_show_global_config().returning(|| Ok(None));
        plane.expect_list().returning(|kind| {
            if kind == EntityKind::AdminHost {
                Ok(vec![String::from("master")])
            } else {
                Ok(Vec::new())
            }
        });
        plane.expect_read().never();

        let config = SnapshotReader::new(&plane).read().await.expect("readable");
        assert_eq!(config.admin_hosts, vec!["master"]);
    }

    #[tokio::test]
    async fn test_global_config_failure() {
        let mut plane = MockControlPlane::new();
        plane.expect_backend_type().return_const("mock");
        plane
            .expect_show_global_config()
            .returning(|| Err(ControlPlaneError::rejected("permission denied")));

        let err = SnapshotReader::new(&plane).read().await.expect_err("global fails");
        assert!(matches!(err, ReadError::GlobalConfig { .. }));
    }
}
