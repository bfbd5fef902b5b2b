//! Call-recording control plane used by tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::config::{ClusterConfig, EntityKind, EntityRecord, GlobalConfig};
use crate::error::{ControlPlaneError, PlaneResult};

use super::local::LocalControlPlane;
use super::plane::ControlPlane;

/// In-memory plane that journals every call and fails on chosen keys.
pub struct RecordingControlPlane {
    inner: LocalControlPlane,
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl RecordingControlPlane {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            inner: LocalControlPlane::in_memory(config),
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
        }
    }

    /// Makes every mutation of the given keys fail.
    pub fn failing_on(mut self, keys: &[&str]) -> Self {
        self.failing.extend(keys.iter().map(|k| (*k).to_string()));
        self
    }

    /// Returns the mutations issued so far, e.g. `create cluster queue q1`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("journal lock").clone()
    }

    pub async fn snapshot(&self) -> ClusterConfig {
        self.inner.snapshot().await
    }

    fn record(&self, call: String, key: &str) -> PlaneResult<()> {
        self.calls.lock().expect("journal lock").push(call);
        if self.failing.contains(key) {
            return Err(ControlPlaneError::rejected(format!("injected failure for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for RecordingControlPlane {
    async fn create(&self, record: &EntityRecord) -> PlaneResult<()> {
        self.record(format!("create {} {}", record.kind(), record.name()), record.name())?;
        self.inner.create(record).await
    }

    async fn update(&self, key: &str, record: &EntityRecord) -> PlaneResult<()> {
        self.record(format!("update {} {key}", record.kind()), key)?;
        self.inner.update(key, record).await
    }

    async fn delete(&self, kind: EntityKind, key: &str) -> PlaneResult<()> {
        self.record(format!("delete {kind} {key}"), key)?;
        self.inner.delete(kind, key).await
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

    async fn modify_global_config(&self, config: &GlobalConfig) -> PlaneResult<()> {
        self.record(String::from("update global configuration"), "global")?;
        self.inner.modify_global_config(config).await
    }

    fn backend_type(&self) -> &'static str {
        "recording"
    }
}
