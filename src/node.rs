//! Node Records
//!
//! A [`NodeRecord`] is one host participating in the storage pool. It owns the
//! list of devices attached to the host and the aggregate capacity counters
//! for those devices. All persistence goes through a caller supplied
//! [`Transaction`]; nothing here commits, retries or locks.
//!
//! The device list is kept sorted ascending with no duplicates between calls.

use crate::device::{DeviceInfoResponse, DeviceRecord};
use crate::error::StorageError;
use crate::store::{Bucket, Transaction, BUCKET_NODE};
use crate::types::{generate_id, ClusterID, DeviceID, NodeID, StorageSize};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error, warn};

/// Request to register a new node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddRequest {
    pub cluster_id: ClusterID,
    pub hostnames: Vec<String>,
    pub zone: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeID,
    pub cluster_id: ClusterID,
    pub hostnames: Vec<String>,
    pub zone: i32,
    pub storage: StorageSize,
}

/// Externally visible view of a node, with its devices resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfoResponse {
    pub cluster_id: ClusterID,
    pub hostnames: Vec<String>,
    pub id: NodeID,
    pub storage: StorageSize,
    pub zone: i32,
    pub devices_info: Vec<DeviceInfoResponse>,
}

/// Persisted node entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub info: NodeInfo,
    #[serde(default, deserialize_with = "nullable_ids")]
    devices: Vec<DeviceID>,
}

// Older encodings may store nil or omit the list entirely.
fn nullable_ids<'de, D>(deserializer: D) -> Result<Vec<DeviceID>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<DeviceID>>::deserialize(deserializer)?.unwrap_or_default())
}

impl NodeRecord {
    /// Empty record with no id and no devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh node with a newly generated id and zeroed storage.
    ///
    /// # Panics
    ///
    /// If the request carries no cluster id.
    pub fn from_request(req: &NodeAddRequest) -> Self {
        assert!(
            !req.cluster_id.is_empty(),
            "node add request must name a cluster"
        );

        let mut node = Self::new();
        node.info.id = generate_id();
        node.info.cluster_id = req.cluster_id.clone();
        node.info.hostnames = req.hostnames.clone();
        node.info.zone = req.zone;
        node
    }

    /// Load the node stored under `id`.
    pub fn load(txn: &dyn Transaction, id: &str) -> Result<Self, StorageError> {
        let bucket = node_bucket(txn)?;
        let value = bucket
            .get(id.as_bytes())?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        Self::from_bytes(&value).map_err(|e| {
            error!(node_id = id, error = %e, "Unable to decode node");
            e
        })
    }

    /// Write the whole record under its id.
    ///
    /// # Panics
    ///
    /// If the record has no id.
    pub fn save(&self, txn: &dyn Transaction) -> Result<(), StorageError> {
        assert!(!self.info.id.is_empty(), "node id must be set before save");

        let bucket = node_bucket(txn)?;
        let buffer = self.to_bytes().map_err(|e| {
            error!(node_id = %self.info.id, error = %e, "Unable to encode node");
            e
        })?;
        bucket.put(self.info.id.as_bytes(), &buffer)?;
        debug!(node_id = %self.info.id, devices = self.devices.len(), "saved node");
        Ok(())
    }

    /// Remove the record from the store.
    ///
    /// Fails with [`StorageError::Conflict`] while any device is attached.
    pub fn delete(&self, txn: &dyn Transaction) -> Result<(), StorageError> {
        if !self.devices.is_empty() {
            warn!(
                node_id = %self.info.id,
                devices = self.devices.len(),
                "Unable to delete node because it contains devices"
            );
            return Err(StorageError::Conflict(self.info.id.clone()));
        }

        let bucket = node_bucket(txn)?;
        bucket.delete(self.info.id.as_bytes()).map_err(|e| {
            error!(node_id = %self.info.id, error = %e, "Unable to delete node key");
            e
        })?;
        debug!(node_id = %self.info.id, "deleted node");
        Ok(())
    }

    /// Build the info response, resolving every attached device in order.
    ///
    /// The first device that fails to resolve aborts the whole response.
    pub fn info_response(&self, txn: &dyn Transaction) -> Result<NodeInfoResponse, StorageError> {
        let mut devices_info = Vec::with_capacity(self.devices.len());
        for device_id in &self.devices {
            let device = DeviceRecord::load(txn, device_id)?;
            devices_info.push(device.info_response(txn)?);
        }

        Ok(NodeInfoResponse {
            cluster_id: self.info.cluster_id.clone(),
            hostnames: self.info.hostnames.clone(),
            id: self.info.id.clone(),
            storage: self.info.storage,
            zone: self.info.zone,
            devices_info,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let mut node: NodeRecord = rmp_serde::from_slice(bytes)?;
        node.devices.sort();
        node.devices.dedup();
        Ok(node)
    }

    /// Attached device ids, sorted ascending.
    pub fn devices(&self) -> &[DeviceID] {
        &self.devices
    }

    pub fn has_device(&self, id: &str) -> bool {
        self.position(id).is_ok()
    }

    /// Attach a device.
    ///
    /// # Panics
    ///
    /// If `id` is already attached. Callers check with [`has_device`](Self::has_device) first.
    pub fn add_device(&mut self, id: &str) {
        match self.position(id) {
            Ok(_) => panic!("device {} already attached to node {}", id, self.info.id),
            Err(pos) => self.devices.insert(pos, id.to_string()),
        }
        debug!(node_id = %self.info.id, device_id = id, "attached device");
    }

    /// Detach a device. Unknown ids are ignored.
    pub fn remove_device(&mut self, id: &str) {
        if let Ok(pos) = self.position(id) {
            self.devices.remove(pos);
            debug!(node_id = %self.info.id, device_id = id, "detached device");
        }
    }

    fn position(&self, id: &str) -> Result<usize, usize> {
        self.devices.binary_search_by(|d| d.as_str().cmp(id))
    }

    /// Register newly provisioned capacity.
    pub fn add_capacity(&mut self, amount: u64) {
        let s = self.info.storage;
        self.info.storage.free = self.grow("free", s.free, amount);
        self.info.storage.total = self.grow("total", s.total, amount);
    }

    /// Reserve free capacity for a volume.
    pub fn allocate_capacity(&mut self, amount: u64) {
        let s = self.info.storage;
        self.info.storage.free = self.shrink("free", s.free, amount);
        self.info.storage.used = self.grow("used", s.used, amount);
    }

    /// Release previously allocated capacity.
    pub fn free_capacity(&mut self, amount: u64) {
        let s = self.info.storage;
        self.info.storage.used = self.shrink("used", s.used, amount);
        self.info.storage.free = self.grow("free", s.free, amount);
    }

    /// Retire provisioned capacity, e.g. when a device goes away.
    pub fn remove_capacity(&mut self, amount: u64) {
        let s = self.info.storage;
        self.info.storage.total = self.shrink("total", s.total, amount);
        self.info.storage.free = self.shrink("free", s.free, amount);
    }

    // Counters wrap on misuse; sequencing is the caller's job.
    fn grow(&self, counter: &'static str, value: u64, amount: u64) -> u64 {
        let (result, overflowed) = value.overflowing_add(amount);
        if overflowed {
            warn!(node_id = %self.info.id, counter, value, amount, "storage counter overflow");
        }
        result
    }

    fn shrink(&self, counter: &'static str, value: u64, amount: u64) -> u64 {
        let (result, underflowed) = value.overflowing_sub(amount);
        if underflowed {
            warn!(node_id = %self.info.id, counter, value, amount, "storage counter underflow");
        }
        result
    }
}

fn node_bucket(txn: &dyn Transaction) -> Result<&dyn Bucket, StorageError> {
    txn.bucket(BUCKET_NODE).ok_or_else(|| {
        error!("Unable to access node bucket");
        StorageError::BucketAccess(BUCKET_NODE.to_string())
    })
}
