use serde::{Deserialize, Serialize};

use crate::model::BlockHeight;

/// The top-level configuration for the `txwatch-connector` library.
///
/// This struct aggregates the chain endpoint, the scanner behavior and the
/// retry policy of the poll worker. It is typically deserialized from a
/// configuration file and passed to the `ScanManager` upon initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectorConfig {
    #[serde(default)]
    pub chain: Chain,
    #[serde(default)]
    pub scanner: Scanner,
    #[serde(default)]
    pub retry: Retry,
}

/// Defines the connection settings for the chain's JSON-RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Chain {
    pub rpc_url: String,
    /// Upper bound on a single HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

/// Defines how the scanner walks the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Scanner {
    /// The initial cursor. `0` adopts the chain tip on the first cycle and skips
    /// all earlier history; a positive value resumes scanning at `start_block + 1`.
    pub start_block: BlockHeight,
    /// The interval in seconds between two scan cycles.
    pub poll_interval_secs: u64,
    /// The maximum number of blocks a single cycle may walk. `None` means no limit.
    pub max_blocks_per_cycle: Option<u64>,
}

/// Defines the backoff applied by the poll worker after a transient failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Retry {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
    /// Consecutive failed cycles tolerated before giving up. `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            rpc_url: "https://ethereum-rpc.publicnode.com".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            start_block: 0,
            poll_interval_secs: 1,
            max_blocks_per_cycle: None,
        }
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            multiplier: 2.0,
            max_retries: None,
        }
    }
}
