pub mod cli;
pub mod config;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use crate::config::{load_config, DaemonConfig};
use std::{collections::HashMap, future::Future, io, sync::Arc, time::Duration};
use tokio::{signal, task::JoinHandle, time::MissedTickBehavior};
use txwatch_connector::{
    client::JsonRpcClient,
    model::Address,
    storage::InMemoryStorage,
    workers::{ScanHandle, ScanManager},
};

/// The main entry point for running the daemon.
/// This function handles CLI parsing, configuration, and service startup.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Commands::Run(run_cmd) = cli.command;
    let watch_extra = run_cmd.watch.clone();
    let mut config = load_config_from_cli(run_cmd)?;
    config.daemon.watch.addresses.extend(watch_extra);

    txwatch_logger::init(&config.daemon.log)?;
    tracing::info!("Configuration loaded: {:#?}", &config);
    run_service(config).await
}

/// Loads the daemon configuration based on the provided CLI command.
fn load_config_from_cli(run_cmd: cli::RunCmd) -> Result<DaemonConfig> {
    if let Some(config_path) = run_cmd.config {
        println!("Loading configuration from '{}'", &config_path);
        load_config(&config_path)
    } else {
        println!("No config file provided, using default settings.");
        Ok(DaemonConfig::default())
    }
}

/// Starts the scanner and the reporter, and handles graceful shutdown.
///
/// Returns the scanner's error if it stops on its own.
async fn run_service(config: DaemonConfig) -> Result<()> {
    let connector = Arc::new(config.connector.clone());
    let client = JsonRpcClient::from_config(&connector.chain)
        .context("Failed to build the JSON-RPC client")?;
    tracing::info!(rpc_url = client.url(), "Using chain endpoint.");

    let (manager, handle) =
        ScanManager::new(connector, Arc::new(client), Arc::new(InMemoryStorage::new()));

    let watched = subscribe_all(&handle, &config.daemon.watch.addresses).await;
    let reporter = tokio::spawn(report_loop(
        handle.clone(),
        watched,
        Duration::from_secs(config.daemon.watch.report_interval_secs.max(1)),
    ));
    let scanner = tokio::spawn(manager.run());

    let result = supervise(scanner, &handle, signal::ctrl_c()).await;

    reporter.abort();
    tracing::info!(cursor = handle.current_block(), "Shutdown complete.");
    result
}

/// Waits for the scanner task to finish, stopping it gracefully once
/// `shutdown_signal` fires. If the signal cannot be listened for, the error is
/// logged and the scanner keeps running.
pub async fn supervise<F>(
    mut scanner: JoinHandle<Result<()>>,
    handle: &ScanHandle,
    shutdown_signal: F,
) -> Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    tokio::select! {
        res = &mut scanner => return res.context("Scan manager task failed")?,
        sig = shutdown_signal => match sig {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
                handle.stop();
            }
            Err(err) => tracing::error!(error = %err, "Failed to listen for shutdown signal."),
        },
    }
    scanner.await.context("Scan manager task failed")?
}

/// Subscribes every configured address and returns those that succeeded.
pub async fn subscribe_all(handle: &ScanHandle, addresses: &[String]) -> Vec<Address> {
    let mut watched = Vec::with_capacity(addresses.len());
    for raw in addresses {
        let address = Address::new(raw);
        if address.is_empty() {
            tracing::warn!("Ignoring empty watch address.");
            continue;
        }
        if handle.subscribe(&address).await && !watched.contains(&address) {
            watched.push(address);
        }
    }
    watched
}

async fn report_loop(handle: ScanHandle, watched: Vec<Address>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut reported = HashMap::new();

    loop {
        ticker.tick().await;
        let fresh = report_new_transactions(&handle, &watched, &mut reported).await;
        let cursor = handle.current_block();
        let subscriptions = handle.subscriptions().await.len();
        tracing::debug!(
            cursor,
            subscriptions,
            fresh,
            "Watch report."
        );
    }
}

/// Logs the transactions recorded since the previous report for each address.
/// `reported` tracks how many entries of each log were already logged.
pub async fn report_new_transactions(
    handle: &ScanHandle,
    watched: &[Address],
    reported: &mut HashMap<Address, usize>,
) -> usize {
    let mut fresh = 0;
    for address in watched {
        let log = handle.get_transactions(address).await;
        let seen = reported.entry(address.clone()).or_insert(0);
        for tx in log.iter().skip(*seen) {
            tracing::info!(
                %address,
                hash = %tx.hash,
                from = %tx.from,
                to = %tx.to,
                value = %tx.value,
                block = %tx.block_number,
                "Transaction recorded."
            );
        }
        fresh += log.len().saturating_sub(*seen);
        *seen = (*seen).max(log.len());
    }
    fresh
}
