use super::{Storage, StorageError};
use crate::model::{Address, Transaction};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

/// A process-lifetime, in-memory implementation of the [`Storage`] trait.
///
/// The subscription set and the transaction logs live in two independent
/// concurrent maps, so subscription checks on the scanning path never wait
/// behind a reader copying out a long log.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    subscriptions: DashSet<Address>,
    transactions: DashMap<Address, Vec<Transaction>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn add_address(&self, address: &Address) -> Result<(), StorageError> {
        self.subscriptions.insert(address.clone());
        Ok(())
    }

    async fn is_subscribed(&self, address: &Address) -> Result<bool, StorageError> {
        Ok(self.subscriptions.contains(address))
    }

    async fn add_transaction(&self, address: &Address, tx: Transaction) -> Result<(), StorageError> {
        // The entry guard holds the shard lock for the whole push.
        self.transactions
            .entry(address.clone())
            .or_default()
            .push(tx);
        Ok(())
    }

    async fn get_transactions(&self, address: &Address) -> Result<Vec<Transaction>, StorageError> {
        Ok(self
            .transactions
            .get(address)
            .map(|log| log.value().clone())
            .unwrap_or_default())
    }

    async fn subscribed_addresses(&self) -> Result<Vec<Address>, StorageError> {
        Ok(self.subscriptions.iter().map(|a| a.key().clone()).collect())
    }
}
