//! Non-mutating control plane wrapper.
//!
//! Reads go to the wrapped plane; every mutation is only logged.

use async_trait::async_trait;
use tracing::info;

use crate::config::{EntityKind, EntityRecord, GlobalConfig};
use crate::error::PlaneResult;

use super::plane::ControlPlane;

/// Control plane that reports mutations instead of performing them.
pub struct DryRunControlPlane<'a> {
    inner: &'a dyn ControlPlane,
}

impl<'a> DryRunControlPlane<'a> {
    /// Wraps the given control plane.
    #[must_use]
    pub fn new(inner: &'a dyn ControlPlane) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ControlPlane for DryRunControlPlane<'_> {
    async fn create(&self, record: &EntityRecord) -> PlaneResult<()> {
        info!("Executing: create {} {}", record.kind(), record.name());
        Ok(())
    }

    async fn update(&self, key: &str, record: &EntityRecord) -> PlaneResult<()> {
        info!("Executing: modify {} {key}", record.kind());
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, key: &str) -> PlaneResult<()> {
        info!("Executing: delete {kind} {key}");
        Ok(())
    }

    async fn list(&self, kind: EntityKind) -> PlaneResult<Vec<String>> {
        self.inner.list(kind).await
    }

    async fn read(&self, kind: EntityKind, key: &str) -> PlaneResult<EntityRecord> {
        self.inner.read(kind, key).await
    }

    async fn show_global_config(&self) -> PlaneResult<Option<GlobalConfig>> {
        self.inner.show_global_config().await
    }

    async fn modify_global_config(&self, _config: &GlobalConfig) -> PlaneResult<()> {
        info!("Executing: modify global configuration");
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterConfig, ProjectConfig};
    use crate::control::LocalControlPlane;

    #[tokio::test]
    async fn test_mutations_leave_inner_untouched() {
        let config = ClusterConfig {
            managers: vec![String::from("root")],
            ..ClusterConfig::default()
        };
        let inner = LocalControlPlane::in_memory(config.clone());
        let plane = DryRunControlPlane::new(&inner);

        let project = EntityRecord::Project(ProjectConfig {
            name: String::from("physics"),
            ..ProjectConfig::default()
        });
        plane.create(&project).await.expect("dry create");
        plane.update("physics", &project).await.expect("dry update");
        plane.delete(EntityKind::Manager, "root").await.expect("dry delete");
        plane
            .modify_global_config(&GlobalConfig::default())
            .await
            .expect("dry modify");

        assert_eq!(inner.snapshot().await, config);
        assert_eq!(plane.backend_type(), "dry-run");
    }

    #[tokio::test]
    async fn test_reads_are_delegated() {
        let config = ClusterConfig {
            managers: vec![String::from("root")],
            ..ClusterConfig::default()
        };
        let inner = LocalControlPlane::in_memory(config);
        let plane = DryRunControlPlane::new(&inner);

        assert_eq!(
            plane.list(EntityKind::Manager).await.expect("listed"),
            vec!["root"]
        );
        assert!(plane.show_global_config().await.expect("read").is_none());
    }
}
