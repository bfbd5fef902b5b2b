//! Control plane module.
//!
//! This module defines how gridconf talks to the live cluster:
//! - The `ControlPlane` capability trait
//! - A local file-backed plane with locking
//! - Dry-run and throttling wrappers
//! - Reading a full live snapshot

mod dry_run;
mod local;
mod lock;
mod observer;
mod plane;
mod throttle;

#[cfg(test)]
pub(crate) mod recording;

pub use dry_run::DryRunControlPlane;
pub use local::{LocalControlPlane, STATE_DIR, STATE_FILE};
pub use lock::{generate_holder_id, LockFile, LockInfo, LOCK_EXPIRY_SECS};
pub use observer::SnapshotReader;
pub use plane::ControlPlane;
#[cfg(test)]
pub(crate) use plane::MockControlPlane;
pub use throttle::ThrottledControlPlane;
