//! # Block Scanner
//!
//! The [`Scanner`] owns the progress cursor and walks every block between the
//! cursor and the chain tip, recording transfers that touch a subscribed
//! address into the [`Storage`] backend.
//!
//! The cursor only moves forward, and only after all transactions of a block
//! have been filtered and recorded. A failed fetch aborts the cycle and leaves
//! the cursor at the last completed block, so the next cycle resumes right
//! after it.

use crate::{
    client::{ChainClient, ClientError},
    config,
    model::{Address, BlockHeight, Transaction},
    storage::Storage,
};
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};
use tokio::sync::Mutex;

/// What a call to [`Scanner::run_cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cursor was uninitialized and has been set to the chain tip. No block was scanned.
    Baselined { height: BlockHeight },
    /// The chain tip was not ahead of the cursor.
    UpToDate { height: BlockHeight },
    /// Blocks `from..=to` were scanned and `matched` log entries were recorded.
    Scanned {
        from: BlockHeight,
        to: BlockHeight,
        matched: usize,
    },
    /// Another cycle was already running; nothing was done.
    Skipped,
}

pub struct Scanner {
    cursor: AtomicI64,
    /// Held for the duration of a cycle. Only the holder writes the cursor.
    cycle_guard: Mutex<()>,
    max_blocks_per_cycle: Option<u64>,
    client: Arc<dyn ChainClient>,
    storage: Arc<dyn Storage>,
}

impl Scanner {
    /// Creates a scanner positioned at `start_block`. `0` means "not yet
    /// baselined": the first cycle adopts the chain tip without scanning history.
    pub fn new(
        start_block: BlockHeight,
        client: Arc<dyn ChainClient>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            cursor: AtomicI64::new(start_block),
            cycle_guard: Mutex::new(()),
            max_blocks_per_cycle: None,
            client,
            storage,
        }
    }

    pub fn from_config(
        config: &config::Scanner,
        client: Arc<dyn ChainClient>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self::new(config.start_block, client, storage)
            .with_max_blocks_per_cycle(config.max_blocks_per_cycle)
    }

    /// Caps the number of blocks a single cycle walks.
    pub fn with_max_blocks_per_cycle(mut self, limit: Option<u64>) -> Self {
        self.max_blocks_per_cycle = limit;
        self
    }

    /// Returns the last block whose transactions are fully recorded.
    pub fn current_block(&self) -> BlockHeight {
        self.cursor.load(Ordering::Acquire)
    }

    /// Subscribes `address`. Blocks already scanned are not revisited.
    pub async fn subscribe(&self, address: &Address) -> bool {
        match self.storage.add_address(address).await {
            Ok(()) => {
                tracing::info!(%address, "Subscribed to address");
                true
            }
            Err(e) => {
                tracing::error!(%address, error = %e, "Failed to subscribe to address");
                false
            }
        }
    }

    /// Returns the recorded transactions of `address`. A storage failure is
    /// logged and reported as an empty log.
    pub async fn get_transactions(&self, address: &Address) -> Vec<Transaction> {
        self.storage
            .get_transactions(address)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(%address, error = %e, "Failed to read transactions from storage");
                Vec::new()
            })
    }

    /// Returns the subscribed addresses, or none if the storage lookup fails.
    pub async fn subscriptions(&self) -> Vec<Address> {
        self.storage.subscribed_addresses().await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to list subscriptions");
            Vec::new()
        })
    }

    /// Runs one scan cycle from `cursor + 1` up to the current chain tip.
    ///
    /// Returns the first client error encountered. Blocks completed before the
    /// failure keep their recorded transactions and the cursor stays on the
    /// last of them.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, ClientError> {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            tracing::debug!("Previous scan cycle still running, skipping tick.");
            return Ok(CycleOutcome::Skipped);
        };

        let latest = self.client.latest_block_number().await?;
        let cursor = self.current_block();

        if cursor == 0 {
            self.cursor.store(latest, Ordering::Release);
            tracing::info!(height = latest, "Cursor baselined at chain tip.");
            return Ok(CycleOutcome::Baselined { height: latest });
        }

        if latest <= cursor {
            return Ok(CycleOutcome::UpToDate { height: cursor });
        }

        let target = match self.max_blocks_per_cycle {
            Some(limit) => {
                let limit = BlockHeight::try_from(limit).unwrap_or(BlockHeight::MAX).max(1);
                latest.min(cursor.saturating_add(limit))
            }
            None => latest,
        };

        let from = cursor + 1;
        let mut matched = 0;
        for height in from..=target {
            matched += self.scan_block(height).await.inspect_err(|e| {
                tracing::warn!(height, error = %e, "Aborting cycle on block fetch failure");
            })?;
            self.cursor.store(height, Ordering::Release);
        }

        tracing::debug!(from, to = target, latest, matched, "Scan cycle complete.");
        Ok(CycleOutcome::Scanned {
            from,
            to: target,
            matched,
        })
    }

    /// Fetches one block and records its matching transactions. Returns the
    /// number of log entries written.
    async fn scan_block(&self, height: BlockHeight) -> Result<usize, ClientError> {
        let transactions = self.client.transactions_by_block_number(height).await?;
        let mut matched = 0;

        for tx in transactions {
            let from_subscribed = self.is_subscribed(&tx.from).await;
            let to_subscribed = self.is_subscribed(&tx.to).await;

            // A self-transfer is recorded once per role.
            if from_subscribed && self.record(&tx.from, tx.clone()).await {
                matched += 1;
            }
            if to_subscribed && self.record(&tx.to, tx.clone()).await {
                matched += 1;
            }
        }

        if matched > 0 {
            tracing::info!(height, matched, "Recorded transactions for subscribed addresses");
        }
        Ok(matched)
    }

    async fn is_subscribed(&self, address: &Address) -> bool {
        if address.is_empty() {
            return false;
        }
        self.storage.is_subscribed(address).await.unwrap_or_else(|e| {
            tracing::warn!(%address, error = %e, "Subscription lookup failed, treating as unsubscribed");
            false
        })
    }

    async fn record(&self, address: &Address, tx: Transaction) -> bool {
        let hash = tx.hash.clone();
        match self.storage.add_transaction(address, tx).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(%address, tx = %hash, error = %e, "Failed to add transaction");
                false
            }
        }
    }
}
