//! Poolnode: Storage Node Records
//!
//! Transactional persistence for the nodes of a storage pool. A node record
//! tracks the block devices attached to a host and the aggregate capacity of
//! those devices, and is loaded, mutated and saved inside a caller supplied
//! store transaction.

pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod node;
pub mod store;
pub mod tooling;
pub mod types;

pub use device::{DeviceInfoResponse, DeviceRecord};
pub use error::{ApiError, StorageError};
pub use node::{NodeAddRequest, NodeInfoResponse, NodeRecord};
pub use store::{Bucket, SledStore, Transaction};
pub use types::StorageSize;
