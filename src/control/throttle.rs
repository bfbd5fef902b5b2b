//! Delay-after-call control plane wrapper.
//!
//! Some control plane tools misbehave when invoked in rapid succession. This
//! wrapper sleeps for a fixed delay after every call it forwards.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{EntityKind, EntityRecord, GlobalConfig};
use crate::error::PlaneResult;

use super::plane::ControlPlane;

/// Control plane that pauses after every call.
pub struct ThrottledControlPlane<P> {
    inner: P,
    delay: Duration,
}

impl<P: ControlPlane> ThrottledControlPlane<P> {
    /// Wraps `inner`, pausing `delay` after each call.
    #[must_use]
    pub const fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Returns the configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl<P: ControlPlane> ControlPlane for ThrottledControlPlane<P> {
    async fn create(&self, record: &EntityRecord) -> PlaneResult<()> {
        let result = self.inner.create(record).await;
        self.pause().await;
        result
    }

    async fn update(&self, key: &str, record: &EntityRecord) -> PlaneResult<()> {
        let result = self.inner.update(key, record).await;
        self.pause().await;
        result
    }

    async fn delete(&self, kind: EntityKind, key: &str) -> PlaneResult<()> {
        let result = self.inner.delete(kind, key).await;
        self.pause().await;
        result
    }

    async fn list(&self, kind: EntityKind) -> PlaneResult<Vec<String>> {
        let result = self.inner.list(kind).await;
        self.pause().await;
        result
    }

    async fn read(&self, kind: EntityKind, key: &str) -> PlaneResult<EntityRecord> {
        let result = self.inner.read(kind, key).await;
        self.pause().await;
        result
    }

    async fn show_global_config(&self) -> PlaneResult<Option<GlobalConfig>> {
        let result = self.inner.show_global_config().await;
        self.pause().await;
        result
    }

    async fn modify_global_config(&self, config: &GlobalConfig) -> PlaneResult<()> {
        let result = self.inner.modify_global_config(config).await;
        self.pause().await;
        result
    }

    fn backend_type(&self) -> &'static str {
        self.inner.backend_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::control::LocalControlPlane;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delay_after_each_call() {
        let inner = LocalControlPlane::in_memory(ClusterConfig::default());
        let plane = ThrottledControlPlane::new(inner, Duration::from_millis(20));

        let started = Instant::now();
        plane
            .create(&EntityRecord::Manager(String::from("root")))
            .await
            .expect("created");
        plane.list(EntityKind::Manager).await.expect("listed");

        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(plane.backend_type(), "memory");
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let inner = LocalControlPlane::in_memory(ClusterConfig::default());
        let plane = ThrottledControlPlane::new(inner, Duration::ZERO);

        assert!(plane.delete(EntityKind::Manager, "nobody").await.is_err());
        assert_eq!(plane.delay(), Duration::ZERO);
    }
}
