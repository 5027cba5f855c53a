use crate::{
    config::ConnectorConfig,
    scanner::{CycleOutcome, Scanner},
    workers::backoff::Backoff,
};
use anyhow::{anyhow, Result};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    time::{interval, sleep, MissedTickBehavior},
};

/// Drives the [`Scanner`] on a fixed interval.
///
/// A cycle always runs to completion; shutdown is only observed while waiting
/// for the next tick or sitting out a backoff delay. Ticks that fire while a
/// cycle is still running are dropped rather than queued.
pub struct PollWorker {
    scanner: Arc<Scanner>,
    config: Arc<ConnectorConfig>,
    shutdown: watch::Receiver<bool>,
}

impl PollWorker {
    pub fn new(
        scanner: Arc<Scanner>,
        config: Arc<ConnectorConfig>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            scanner,
            config,
            shutdown,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let period = Duration::from_secs(self.config.scanner.poll_interval_secs.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut backoff = Backoff::new(&self.config.retry);

        tracing::info!(
            cursor = self.scanner.current_block(),
            interval_secs = period.as_secs(),
            "Poll worker started."
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => {
                    tracing::info!("PollWorker: shutdown signal received, exiting.");
                    return Ok(());
                }
                _ = ticker.tick() => {},
            }

            match self.scanner.run_cycle().await {
                Ok(outcome) => {
                    if backoff.attempts() > 0 {
                        tracing::info!(cursor = self.scanner.current_block(), "Scanning recovered.");
                    }
                    backoff.reset();
                    log_outcome(outcome);
                }
                Err(e) if e.is_transient() => {
                    let cursor = self.scanner.current_block();
                    let Some(delay) = backoff.next_delay() else {
                        tracing::error!(cursor, error = %e, "Retry budget exhausted, stopping scanner.");
                        return Err(anyhow!(e).context(format!(
                            "retry budget of {} exhausted at block {}",
                            backoff.attempts(),
                            cursor
                        )));
                    };
                    tracing::warn!(
                        cursor,
                        attempt = backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient scan failure, backing off."
                    );
                    tokio::select! {
                        _ = sleep(delay) => {},
                        _ = shutdown_requested(&mut self.shutdown) => {
                            tracing::info!("PollWorker: shutdown signal received during backoff, exiting.");
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    let cursor = self.scanner.current_block();
                    tracing::error!(cursor, error = %e, "Permanent scan failure, stopping scanner.");
                    return Err(anyhow!(e).context(format!("scan halted at block {cursor}")));
                }
            }
        }
    }
}

/// Resolves once a stop is requested or every handle has been dropped.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

fn log_outcome(outcome: CycleOutcome) {
    match outcome {
        CycleOutcome::Baselined { height } => {
            tracing::info!(height, "Starting from the current chain tip.")
        }
        CycleOutcome::Scanned { from, to, matched } => {
            tracing::debug!(from, to, matched, "Blocks scanned.")
        }
        CycleOutcome::UpToDate { height } => tracing::trace!(height, "No new blocks."),
        CycleOutcome::Skipped => tracing::debug!("Cycle skipped, another one is in flight."),
    }
}
