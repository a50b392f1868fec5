//! Device Records
//!
//! A block device attached to a node. Nodes refer to devices only by id and
//! resolve them through this module when building their info response.

use crate::error::StorageError;
use crate::store::{Bucket, Transaction, BUCKET_DEVICE};
use crate::types::{generate_id, DeviceID, NodeID, StorageSize};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: DeviceID,
    pub name: String,
    pub storage: StorageSize,
}

/// Externally visible view of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfoResponse {
    pub id: DeviceID,
    pub name: String,
    pub storage: StorageSize,
}

/// Persisted device entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub info: DeviceInfo,
    pub node_id: NodeID,
}

impl DeviceRecord {
    /// New device on `node_id` with `size` bytes of free capacity.
    pub fn new(name: &str, node_id: &str, size: u64) -> Self {
        DeviceRecord {
            info: DeviceInfo {
                id: generate_id(),
                name: name.to_string(),
                storage: StorageSize::with_total(size),
            },
            node_id: node_id.to_string(),
        }
    }

    pub fn load(txn: &dyn Transaction, id: &str) -> Result<Self, StorageError> {
        let bucket = device_bucket(txn)?;
        let value = bucket
            .get(id.as_bytes())?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        Self::from_bytes(&value).map_err(|e| {
            error!(device_id = id, error = %e, "Unable to decode device");
            e
        })
    }

    pub fn save(&self, txn: &dyn Transaction) -> Result<(), StorageError> {
        assert!(!self.info.id.is_empty(), "device id must be set before save");

        let bucket = device_bucket(txn)?;
        let buffer = self.to_bytes()?;
        bucket.put(self.info.id.as_bytes(), &buffer)?;
        debug!(device_id = %self.info.id, node_id = %self.node_id, "saved device");
        Ok(())
    }

    pub fn delete(&self, txn: &dyn Transaction) -> Result<(), StorageError> {
        let bucket = device_bucket(txn)?;
        bucket.delete(self.info.id.as_bytes())?;
        debug!(device_id = %self.info.id, "deleted device");
        Ok(())
    }

    pub fn info_response(&self, _txn: &dyn Transaction) -> Result<DeviceInfoResponse, StorageError> {
        Ok(DeviceInfoResponse {
            id: self.info.id.clone(),
            name: self.info.name.clone(),
            storage: self.info.storage,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

fn device_bucket(txn: &dyn Transaction) -> Result<&dyn Bucket, StorageError> {
    txn.bucket(BUCKET_DEVICE).ok_or_else(|| {
        error!("Unable to access device bucket");
        StorageError::BucketAccess(BUCKET_DEVICE.to_string())
    })
}
