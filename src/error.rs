//! Error types for the gridconf reconciliation system.
//!
//! This module provides the error hierarchy for every stage of a
//! reconciliation: loading a snapshot, reading the live cluster, comparing
//! snapshots and mutating the live cluster.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{ClusterConfig, EntityKind};

/// The main error type for the gridconf system.
#[derive(Debug, Error)]
pub enum GridconfError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local state file and lock errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// A single control plane call failed outside of an apply phase.
    #[error("Control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),

    /// The live cluster could not be read.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Two snapshots could not be compared.
    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    /// Mutating the live cluster failed.
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// The snapshot could not be serialized.
    #[error("Failed to serialize configuration: {message}")]
    SerializeError {
        /// Description of the serialization error.
        message: String,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Duplicate entity definition.
    #[error("Duplicate {resource_type} name: {name}")]
    DuplicateName {
        /// Kind of entity (cluster queue, project, etc.).
        resource_type: String,
        /// The duplicated name.
        name: String,
    },
}

/// Local state file and lock errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// State is corrupted.
    #[error("State is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// State lock acquisition failed.
    #[error("Failed to acquire state lock: {message}")]
    LockFailed {
        /// Description of the lock failure.
        message: String,
    },

    /// State lock is held by another process.
    #[error("State is locked by another process (lock holder: {holder}, since: {since})")]
    LockedByOther {
        /// Identifier of the lock holder.
        holder: String,
        /// When the lock was acquired.
        since: String,
    },

    /// Serialization error.
    #[error("State serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },
}

/// Errors returned by a single control plane call.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The entity to create already exists.
    #[error("{kind} '{key}' already exists")]
    AlreadyExists {
        /// Kind of the entity.
        kind: EntityKind,
        /// Key of the entity.
        key: String,
    },

    /// The entity to update, read or delete does not exist.
    #[error("{kind} '{key}' does not exist")]
    NotFound {
        /// Kind of the entity.
        kind: EntityKind,
        /// Key of the entity.
        key: String,
    },

    /// The control plane refused the call.
    #[error("rejected by control plane: {message}")]
    Rejected {
        /// Message reported by the control plane.
        message: String,
    },

    /// The backend storing the live configuration failed.
    #[error("backend failure: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

/// Failures while reading the live cluster into a snapshot.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Listing the keys of a collection failed.
    #[error("failed to list {collection}: {source}")]
    List {
        /// Name of the collection.
        collection: &'static str,
        /// Underlying control plane error.
        #[source]
        source: ControlPlaneError,
    },

    /// Reading one record failed.
    #[error("failed to read {kind} '{key}': {source}")]
    Record {
        /// Kind of the entity.
        kind: EntityKind,
        /// Key of the entity.
        key: String,
        /// Underlying control plane error.
        #[source]
        source: ControlPlaneError,
    },

    /// Reading the global configuration failed.
    #[error("failed to read global configuration: {source}")]
    GlobalConfig {
        /// Underlying control plane error.
        #[source]
        source: ControlPlaneError,
    },
}

/// Key extraction failures inside one collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    /// A record has an empty key.
    #[error("record with empty {}", .field.unwrap_or("value"))]
    EmptyKey {
        /// Key field, `None` for flat value lists.
        field: Option<&'static str>,
    },

    /// Two records in the same input share a key.
    #[error("key '{key}' appears more than once")]
    DuplicateKey {
        /// The duplicated key.
        key: String,
    },
}

/// Snapshot comparison errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    /// Finding differences for one collection failed.
    #[error("error finding differences for {collection}: {source}")]
    Collection {
        /// Name of the collection.
        collection: &'static str,
        /// Key extraction failure.
        #[source]
        source: DiffError,
    },
}

/// The kind of mutation issued to the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a new entity.
    Create,
    /// Update an existing entity.
    Update,
    /// Delete an existing entity.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "add"),
            Self::Update => write!(f, "modify"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Errors raised while mutating the live cluster.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// One control plane call failed.
    #[error("failed to {operation} {kind} {key}: {source}")]
    Mutation {
        /// Operation that failed.
        operation: Operation,
        /// Kind of the entity.
        kind: EntityKind,
        /// Key of the entity.
        key: String,
        /// Underlying control plane error.
        #[source]
        source: ControlPlaneError,
    },

    /// Updating the global configuration failed.
    #[error("failed to modify global configuration: {source}")]
    GlobalConfig {
        /// Underlying control plane error.
        #[source]
        source: ControlPlaneError,
    },

    /// Several deletions failed under the continue-on-error policy.
    #[error("error deleting multiple objects: {}", join_failures(.0))]
    Aggregate(Vec<ApplyError>),

    /// One phase of a top-level apply failed.
    #[error("failed to {operation} elements: {source}")]
    Phase {
        /// Operation performed by the failing phase.
        operation: Operation,
        /// Entities the failing phase changed before it stopped.
        completed: Box<ClusterConfig>,
        /// The phase failure.
        #[source]
        source: Box<ApplyError>,
    },
}

fn join_failures(failures: &[ApplyError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for gridconf operations.
pub type Result<T> = std::result::Result<T, GridconfError>;

/// Result type alias for control plane calls.
pub type PlaneResult<T> = std::result::Result<T, ControlPlaneError>;

impl StateError {
    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

impl ControlPlaneError {
    /// Creates a rejection error with the given message.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates a backend error with the given message.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

impl ApplyError {
    /// Returns the keys of every entity whose mutation failed.
    #[must_use]
    pub fn failed_keys(&self) -> Vec<&str> {
        match self {
            Self::Mutation { key, .. } => vec![key.as_str()],
            Self::GlobalConfig { .. } => vec!["global"],
            Self::Aggregate(failures) => failures.iter().flat_map(Self::failed_keys).collect(),
            Self::Phase { source, .. } => source.failed_keys(),
        }
    }
}
