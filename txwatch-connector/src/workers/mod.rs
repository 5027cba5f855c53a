//! # Scan Manager & Background Worker
//!
//! This module defines the `ScanManager`, which owns the background poll worker,
//! and the `ScanHandle` through which the rest of the application talks to it.
//!
//! ## Core Components
//!
//! - [`ScanManager`]: Owns and runs the poll worker. It is consumed when its
//!   `run` method is called.
//! - [`ScanHandle`]: A clonable, thread-safe handle that provides the public API
//!   (subscribing, querying, reading progress, shutting down).
//! - **Workers**:
//!   - `PollWorker`: Runs one scan cycle per tick and retries transient chain
//!     failures with exponential backoff.
//!

mod backoff;
mod poller;

use crate::{
    client::ChainClient,
    config::ConnectorConfig,
    model::{Address, BlockHeight, Transaction},
    scanner::Scanner,
    storage::Storage,
    workers::poller::PollWorker,
};
use std::sync::Arc;
use tokio::sync::watch;

/// A clonable, thread-safe handle for interacting with the running scanner.
///
/// Dropping every handle has the same effect as calling [`ScanHandle::stop`].
#[derive(Clone)]
pub struct ScanHandle {
    scanner: Arc<Scanner>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl ScanHandle {
    /// Subscribes `address` for all blocks scanned from now on.
    pub async fn subscribe(&self, address: &Address) -> bool {
        self.scanner.subscribe(address).await
    }

    /// Returns the transactions recorded for `address` so far.
    pub async fn get_transactions(&self, address: &Address) -> Vec<Transaction> {
        self.scanner.get_transactions(address).await
    }

    /// Returns every subscribed address.
    pub async fn subscriptions(&self) -> Vec<Address> {
        self.scanner.subscriptions().await
    }

    /// Returns the last fully processed block height.
    pub fn current_block(&self) -> BlockHeight {
        self.scanner.current_block()
    }

    /// Asks the worker to stop. An in-flight cycle is allowed to finish first.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}

/// The background service manager for the scanner.
///
/// It is created once, its [`run()`](ScanManager::run) method is spawned as a
/// background task, and it is then consumed, leaving the [`ScanHandle`] as the
/// only way to interact with the running service.
pub struct ScanManager {
    worker: PollWorker,
}

impl ScanManager {
    /// Creates a new `ScanManager` and its associated [`ScanHandle`].
    ///
    /// # Arguments
    ///
    /// * `config` - The shared connector configuration.
    /// * `client` - The chain client the scanner reads blocks from.
    /// * `storage` - The subscription and transaction store.
    pub fn new(
        config: Arc<ConnectorConfig>,
        client: Arc<dyn ChainClient>,
        storage: Arc<dyn Storage>,
    ) -> (Self, ScanHandle) {
        let scanner = Arc::new(Scanner::from_config(&config.scanner, client, storage));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = PollWorker::new(scanner.clone(), config, shutdown_rx);
        let handle = ScanHandle {
            scanner,
            shutdown: Arc::new(shutdown_tx),
        };

        (Self { worker }, handle)
    }

    /// Runs the poll worker until shutdown is requested or scanning fails
    /// permanently. The error of a permanent failure is returned.
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("Scan manager is running the poll worker.");

        let res = self.worker.run().await;
        match &res {
            Ok(()) => tracing::info!("Poll worker has shut down."),
            Err(e) => tracing::error!("Poll worker exited with an error: {:#}", e),
        }
        res
    }
}
