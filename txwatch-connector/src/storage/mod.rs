mod memory;

use crate::model::{Address, Transaction};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryStorage;

/// Errors reported by a [`Storage`] backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// A trait defining the subscription set and per-address transaction logs.
/// This allows for different backend implementations.
///
/// Every method must be safe to call concurrently from any number of tasks.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Marks `address` as subscribed. Idempotent.
    async fn add_address(&self, address: &Address) -> Result<(), StorageError>;

    /// Returns whether `address` is subscribed. Unknown addresses are not subscribed.
    async fn is_subscribed(&self, address: &Address) -> Result<bool, StorageError>;

    /// Appends `tx` to the log of `address`.
    async fn add_transaction(&self, address: &Address, tx: Transaction) -> Result<(), StorageError>;

    /// Returns the log of `address` in insertion order, empty if nothing was recorded.
    async fn get_transactions(&self, address: &Address) -> Result<Vec<Transaction>, StorageError>;

    /// Returns every subscribed address, in no particular order.
    async fn subscribed_addresses(&self) -> Result<Vec<Address>, StorageError>;
}
