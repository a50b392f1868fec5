//! Sled-backed implementation of the transactional store.

use super::{Bucket, Transaction, DEFAULT_BUCKETS};
use crate::error::StorageError;
use sled::transaction::{
    ConflictableTransactionError, TransactionError, TransactionalTree, UnabortableTransactionError,
};
use sled::{Db, Transactional, Tree};
use std::path::Path;

/// Store with one sled tree per registered bucket.
pub struct SledStore {
    db: Db,
    names: Vec<String>,
    trees: Vec<Tree>,
}

impl SledStore {
    /// Open (or create) a persistent store at `path` with the default buckets.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::with_buckets(db, DEFAULT_BUCKETS)
    }

    /// Open a store that is removed when dropped.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_buckets(db, DEFAULT_BUCKETS)
    }

    /// Wrap an existing database, registering only the given buckets.
    pub fn with_buckets(db: Db, names: &[&str]) -> Result<Self, StorageError> {
        let mut trees = Vec::with_capacity(names.len());
        for name in names {
            trees.push(db.open_tree(name)?);
        }
        Ok(Self {
            db,
            names: names.iter().map(|n| n.to_string()).collect(),
            trees,
        })
    }

    /// Run `f` inside a single transaction spanning every registered bucket.
    ///
    /// Commits when `f` returns `Ok`, aborts and returns the error otherwise.
    /// The engine may call `f` more than once if it detects a write conflict,
    /// so `f` must not have side effects outside the transaction.
    pub fn transaction<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: Fn(&dyn Transaction) -> Result<T, StorageError>,
    {
        let result = self.trees[..].transaction(|views: &Vec<TransactionalTree>| {
            let txn = SledTransaction {
                names: &self.names,
                views,
            };
            f(&txn).map_err(|err| match err {
                StorageError::TransactionConflict => ConflictableTransactionError::Conflict,
                StorageError::Store(e) => ConflictableTransactionError::Storage(e),
                other => ConflictableTransactionError::Abort(other),
            })
        });

        result.map_err(|err| match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StorageError::Store(e),
        })
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

struct SledTransaction<'a> {
    names: &'a [String],
    views: &'a [TransactionalTree],
}

impl Transaction for SledTransaction<'_> {
    fn bucket(&self, name: &str) -> Option<&dyn Bucket> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.views[i] as &dyn Bucket)
    }
}

fn unabortable(err: UnabortableTransactionError) -> StorageError {
    match err {
        UnabortableTransactionError::Conflict => StorageError::TransactionConflict,
        UnabortableTransactionError::Storage(e) => StorageError::Store(e),
    }
}

impl Bucket for TransactionalTree {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let value = TransactionalTree::get(self, key).map_err(unabortable)?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.insert(key, value).map_err(unabortable)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.remove(key).map_err(unabortable)?;
        Ok(())
    }
}
