//! Core identifier and capacity types shared across entity records.

use serde::{Deserialize, Serialize};

/// NodeID: opaque identifier of a storage node, assigned at creation
pub type NodeID = String;

/// ClusterID: identifier of the cluster owning a node
pub type ClusterID = String;

/// DeviceID: identifier of a block device attached to a node
pub type DeviceID = String;

/// Capacity triple in bytes.
///
/// Callers keep `total == used + free`; the counters themselves never check it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSize {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl StorageSize {
    /// A fully free capacity of `size` bytes.
    pub fn with_total(size: u64) -> Self {
        StorageSize {
            total: size,
            used: 0,
            free: size,
        }
    }

    /// True when `total == used + free` without overflow.
    pub fn is_balanced(&self) -> bool {
        self.used.checked_add(self.free) == Some(self.total)
    }
}

/// Generate a fresh entity identifier (32 lowercase hex characters).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
