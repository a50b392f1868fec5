//! Transactional Store
//!
//! The record types never talk to the engine directly. They receive a
//! [`Transaction`] handle from the caller and address their data through
//! named buckets inside it, so everything a caller does between opening and
//! committing a transaction lands atomically.

pub mod persistence;

use crate::error::StorageError;

pub use persistence::SledStore;

/// Bucket holding serialized node records, keyed by node id.
pub const BUCKET_NODE: &str = "NODE";

/// Bucket holding serialized device records, keyed by device id.
pub const BUCKET_DEVICE: &str = "DEVICE";

/// Buckets opened by default when a store is created.
pub const DEFAULT_BUCKETS: &[&str] = &[BUCKET_NODE, BUCKET_DEVICE];

/// A key partition inside a transaction.
pub trait Bucket {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;
    fn delete(&self, key: &[u8]) -> Result<(), StorageError>;
}

/// A caller-owned transaction scope.
pub trait Transaction {
    /// Look up a bucket by name. `None` means the namespace does not exist.
    fn bucket(&self, name: &str) -> Option<&dyn Bucket>;
}
