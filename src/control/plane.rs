//! Control plane trait definition.
//!
//! This module defines the capability set the reconciler needs from the live
//! cluster: per-entity create, update, delete, list and read, plus access to
//! the global configuration.

use async_trait::async_trait;

use crate::config::{EntityKind, EntityRecord, GlobalConfig};
use crate::error::PlaneResult;

/// Interface to the live cluster configuration.
///
/// Every call is one round trip to the control plane and either fully
/// succeeds or fails for that single record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Creates a new entity.
    async fn create(&self, record: &EntityRecord) -> PlaneResult<()>;

    /// Replaces the entity identified by `key` with `record`.
    async fn update(&self, key: &str, record: &EntityRecord) -> PlaneResult<()>;

    /// Deletes the entity of the given kind identified by `key`.
    async fn delete(&self, kind: EntityKind, key: &str) -> PlaneResult<()>;

    /// Lists the keys of every entity of one kind.
    async fn list(&self, kind: EntityKind) -> PlaneResult<Vec<String>>;

    /// Reads one entity.
    async fn read(&self, kind: EntityKind, key: &str) -> PlaneResult<EntityRecord>;

    /// Reads the global configuration, `None` if the cluster has none.
    async fn show_global_config(&self) -> PlaneResult<Option<GlobalConfig>>;

    /// Replaces the global configuration.
    async fn modify_global_config(&self, config: &GlobalConfig) -> PlaneResult<()>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}
