//! Configuration module for the gridconf system.
//!
//! This module handles everything about cluster snapshots:
//! - The snapshot data model and its ordered entity table
//! - Loading and writing snapshots as YAML or JSON
//! - Validation of snapshot contents
//! - Computing snapshot hashes for change detection

mod entity;
mod spec;
mod parser;
mod validator;
mod hash;

pub use entity::{EntityKind, EntityRecord};
pub use spec::{
    CalendarConfig, CkptInterfaceConfig, ClusterConfig, ClusterEnvironment, ClusterQueueConfig,
    ComplexEntryConfig, GlobalConfig, HostConfiguration, HostExecConfig, HostGroupConfig,
    ParallelEnvironmentConfig, ProjectConfig, ResourceQuotaSetConfig, UserConfig,
    UserSetListConfig,
};
pub use parser::{find_config_file, SnapshotFormat, SnapshotParser, DEFAULT_CONFIG_FILES};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
pub use hash::ConfigHasher;
