//! Local file-backed control plane.
//!
//! This module keeps the live cluster configuration in a JSON file, or in
//! memory only. It enforces the same existence rules a real control plane
//! does: creating an existing entity fails, updating or deleting a missing
//! one fails.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{ClusterConfig, EntityKind, EntityRecord, GlobalConfig};
use crate::error::{ControlPlaneError, GridconfError, PlaneResult, Result, StateError};

use super::lock::LockFile;
use super::plane::ControlPlane;

/// Default state directory name.
pub const STATE_DIR: &str = ".gridconf";

/// Default state file name.
pub const STATE_FILE: &str = "cluster.json";

/// Control plane backed by a local snapshot.
#[derive(Debug)]
pub struct LocalControlPlane {
    /// Path of the state file, `None` for a memory-only plane.
    state_path: Option<PathBuf>,
    /// Current live configuration.
    state: Mutex<ClusterConfig>,
}

impl LocalControlPlane {
    /// Creates a memory-only plane holding `config`.
    #[must_use]
    pub fn in_memory(config: ClusterConfig) -> Self {
        Self {
            state_path: None,
            state: Mutex::new(config),
        }
    }

    /// Opens the state file at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let state_path = path.into();

        let config = if state_path.exists() {
            info!("Loading live state from: {}", state_path.display());

            let content = fs::read_to_string(&state_path).await.map_err(|e| {
                GridconfError::State(StateError::Corrupted {
                    message: format!("Failed to read state file: {e}"),
                })
            })?;

            serde_json::from_str(&content).map_err(|e| {
                GridconfError::State(StateError::Corrupted {
                    message: format!("Failed to parse state file: {e}"),
                })
            })?
        } else {
            debug!("State file does not exist yet: {}", state_path.display());
            ClusterConfig::default()
        };

        Ok(Self {
            state_path: Some(state_path),
            state: Mutex::new(config),
        })
    }

    /// Returns the default state file path below `base_dir`.
    #[must_use]
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join(STATE_DIR).join(STATE_FILE)
    }

    /// Returns the state file path, if any.
    #[must_use]
    pub fn state_path(&self) -> Option<&Path> {
        self.state_path.as_deref()
    }

    /// Returns the lock file guarding the state file, if any.
    #[must_use]
    pub fn lock_file(&self) -> Option<LockFile> {
        self.state_path
            .as_ref()
            .map(|path| LockFile::new(path.with_extension("lock")))
    }

    /// Returns a copy of the current live configuration.
    pub async fn snapshot(&self) -> ClusterConfig {
        self.state.lock().await.clone()
    }

    /// Applies `change` to a copy of the state, persists it, then commits it.
    async fn mutate<F>(&self, change: F) -> PlaneResult<()>
    where
        F: FnOnce(&mut ClusterConfig) -> PlaneResult<()> + Send,
    {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        change(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    /// Writes the state file atomically.
    async fn persist(&self, config: &ClusterConfig) -> PlaneResult<()> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                ControlPlaneError::backend(format!("Failed to create state directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ControlPlaneError::backend(format!("Failed to serialize state: {e}")))?;

        // Write to a temporary file first, then rename over the state file.
        let temp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            ControlPlaneError::backend(format!("Failed to create temp state file: {e}"))
        })?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| ControlPlaneError::backend(format!("Failed to write state file: {e}")))?;

        file.sync_all()
            .await
            .map_err(|e| ControlPlaneError::backend(format!("Failed to sync state file: {e}")))?;

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| ControlPlaneError::backend(format!("Failed to rename state file: {e}")))?;

        debug!("State saved to {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for LocalControlPlane {
    async fn create(&self, record: &EntityRecord) -> PlaneResult<()> {
        let record = record.clone();
        self.mutate(move |state| {
            if state.get(record.kind(), record.name()).is_some() {
                return Err(ControlPlaneError::AlreadyExists {
                    kind: record.kind(),
                    key: record.name().to_string(),
                });
            }
            state.push(record);
            Ok(())
        })
        .await
    }

    async fn update(&self, key: &str, record: &EntityRecord) -> PlaneResult<()> {
        if record.name() != key {
            return Err(ControlPlaneError::rejected(format!(
                "cannot rename {} '{key}' to '{}'",
                record.kind(),
                record.name()
            )));
        }

        let record = record.clone();
        self.mutate(move |state| {
            let kind = record.kind();
            let key = record.name().to_string();
            if state.replace(record) {
                Ok(())
            } else {
                Err(ControlPlaneError::NotFound { kind, key })
            }
        })
        .await
    }

    async fn delete(&self, kind: EntityKind, key: &str) -> PlaneResult<()> {
        self.mutate(|state| {
            state
                .remove(kind, key)
                .map(|_| ())
                .ok_or_else(|| ControlPlaneError::NotFound {
                    kind,
                    key: key.to_string(),
                })
        })
        .await
    }

    async fn list(&self, kind: EntityKind) -> PlaneResult<Vec<String>> {
        Ok(self.state.lock().await.keys(kind))
    }

    async fn read(&self, kind: EntityKind, key: &str) -> PlaneResult<EntityRecord> {
        self.state
            .lock()
            .await
            .get(kind, key)
            .ok_or_else(|| ControlPlaneError::NotFound {
                kind,
                key: key.to_string(),
            })
    }

    async fn show_global_config(&self) -> PlaneResult<Option<GlobalConfig>> {
        Ok(self.state.lock().await.global_config.clone())
    }

    async fn modify_global_config(&self, config: &GlobalConfig) -> PlaneResult<()> {
        let config = config.clone();
        self.mutate(move |state| {
            state.global_config = Some(config);
            Ok(())
        })
        .await
    }

    fn backend_type(&self) -> &'static str {
        if self.state_path.is_some() {
            "local"
        } else {
            "memory"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterQueueConfig, ProjectConfig};
    use tempfile::TempDir;

    fn project(name: &str, fshare: i64) -> EntityRecord {
        EntityRecord::Project(ProjectConfig {
            name: name.to_string(),
            fshare,
            ..ProjectConfig::default()
        })
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let plane = LocalControlPlane::in_memory(ClusterConfig::default());

        plane.create(&project("physics", 10)).await.expect("created");

        assert_eq!(
            plane.list(EntityKind::Project).await.expect("listed"),
            vec!["physics"]
        );
        assert_eq!(
            plane.read(EntityKind::Project, "physics").await.expect("read"),
            project("physics", 10)
        );
        assert_eq!(plane.backend_type(), "memory");
    }

    #[tokio::test]
    async fn test_create_existing_fails() {
        let plane = LocalControlPlane::in_memory(ClusterConfig::default());
        plane.create(&project("physics", 10)).await.expect("created");

        let err = plane.create(&project("physics", 20)).await.expect_err("duplicate");
        assert!(matches!(err, ControlPlaneError::AlreadyExists { kind: EntityKind::Project, .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_fail() {
        let plane = LocalControlPlane::in_memory(ClusterConfig::default());

        let err = plane.update("physics", &project("physics", 1)).await.expect_err("missing");
        assert!(matches!(err, ControlPlaneError::NotFound { .. }));

        let err = plane.delete(EntityKind::Project, "physics").await.expect_err("missing");
        assert!(matches!(err, ControlPlaneError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_rejects_rename() {
        let plane = LocalControlPlane::in_memory(ClusterConfig::default());
        plane.create(&project("physics", 10)).await.expect("created");

        let err = plane.update("physics", &project("chemistry", 10)).await.expect_err("rename");
        assert!(matches!(err, ControlPlaneError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_global_config() {
        let plane = LocalControlPlane::in_memory(ClusterConfig::default());
        assert!(plane.show_global_config().await.expect("read").is_none());

        let global = GlobalConfig {
            max_jobs: 100,
            ..GlobalConfig::default()
        };
        plane.modify_global_config(&global).await.expect("modified");

        assert_eq!(plane.show_global_config().await.expect("read"), Some(global));
    }

    #[tokio::test]
    async fn test_state_persists_across_opens() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = LocalControlPlane::default_path(temp.path());

        let plane = LocalControlPlane::open(&path).await.expect("opened");
        assert_eq!(plane.backend_type(), "local");
        plane
            .create(&EntityRecord::ClusterQueue(ClusterQueueConfig::named("all.q")))
            .await
            .expect("created");
        plane
            .update("physics", &project("physics", 1))
            .await
            .expect_err("missing project");

        let reopened = LocalControlPlane::open(&path).await.expect("reopened");
        let snapshot = reopened.snapshot().await;
        assert_eq!(snapshot.queue_names(), vec!["all.q"]);
        assert!(snapshot.projects.is_empty());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupted_state_file() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("cluster.json");
        std::fs::write(&path, "{ not json").expect("write");

        let result = LocalControlPlane::open(&path).await;
        assert!(matches!(
            result,
            Err(GridconfError::State(StateError::Corrupted { .. }))
        ));
    }

    #[tokio::test]
    async fn test_lock_file_next_to_state() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("cluster.json");
        let plane = LocalControlPlane::open(&path).await.expect("opened");

        let lock = plane.lock_file().expect("file-backed plane has a lock");
        assert_eq!(lock.path(), temp.path().join("cluster.lock"));
        assert!(LocalControlPlane::in_memory(ClusterConfig::default()).lock_file().is_none());
    }
}
