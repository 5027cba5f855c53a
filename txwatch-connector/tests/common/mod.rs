#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::Notify;
use txwatch_connector::{
    client::{ChainClient, ClientError},
    model::{BlockHeight, Transaction},
};

pub fn tx(hash: &str, from: &str, to: &str, block: BlockHeight) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        from: from.into(),
        to: to.into(),
        value: "0x1".to_string(),
        block_number: format!("{block:#x}"),
    }
}

struct Failure {
    remaining: usize,
    make: fn() -> ClientError,
}

/// Blocks `latest_block_number` until released, so a test can hold a cycle open.
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// A scripted, in-memory chain.
#[derive(Default)]
pub struct StubChain {
    latest: Mutex<BlockHeight>,
    blocks: Mutex<HashMap<BlockHeight, Vec<Transaction>>>,
    block_failures: Mutex<HashMap<BlockHeight, Failure>>,
    latest_failure: Mutex<Option<Failure>>,
    fetched: Mutex<Vec<BlockHeight>>,
    gate: Mutex<Option<Gate>>,
}

impl StubChain {
    pub fn new(latest: BlockHeight) -> Self {
        Self {
            latest: Mutex::new(latest),
            ..Default::default()
        }
    }

    pub fn set_latest(&self, latest: BlockHeight) {
        *self.latest.lock().unwrap() = latest;
    }

    pub fn with_block(self, height: BlockHeight, txs: Vec<Transaction>) -> Self {
        self.blocks.lock().unwrap().insert(height, txs);
        self
    }

    /// Fails the next `times` fetches of `height`.
    pub fn fail_block(&self, height: BlockHeight, times: usize, make: fn() -> ClientError) {
        self.block_failures
            .lock()
            .unwrap()
            .insert(height, Failure { remaining: times, make });
    }

    pub fn fail_latest(&self, times: usize, make: fn() -> ClientError) {
        *self.latest_failure.lock().unwrap() = Some(Failure { remaining: times, make });
    }

    pub fn install_gate(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Gate {
            entered: entered.clone(),
            release: release.clone(),
        });
        (entered, release)
    }

    pub fn fetched(&self) -> Vec<BlockHeight> {
        self.fetched.lock().unwrap().clone()
    }

    fn take_failure(slot: &mut Option<Failure>) -> Option<ClientError> {
        let failure = slot.as_mut()?;
        if failure.remaining == 0 {
            return None;
        }
        failure.remaining -= 1;
        Some((failure.make)())
    }
}

#[async_trait]
impl ChainClient for StubChain {
    async fn latest_block_number(&self) -> Result<BlockHeight, ClientError> {
        let gate = self
            .gate
            .lock()
            .unwrap()
            .take()
            .map(|g| (g.entered, g.release));
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }

        if let Some(err) = Self::take_failure(&mut self.latest_failure.lock().unwrap()) {
            return Err(err);
        }
        Ok(*self.latest.lock().unwrap())
    }

    async fn transactions_by_block_number(
        &self,
        height: BlockHeight,
    ) -> Result<Vec<Transaction>, ClientError> {
        {
            let mut failures = self.block_failures.lock().unwrap();
            let mut slot = failures.remove(&height);
            let err = Self::take_failure(&mut slot);
            if let Some(failure) = slot {
                failures.insert(height, failure);
            }
            if let Some(err) = err {
                return Err(err);
            }
        }

        self.fetched.lock().unwrap().push(height);
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .unwrap_or_default())
    }
}
