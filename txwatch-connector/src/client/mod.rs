//! # Chain Client
//!
//! The scanner talks to the chain only through the two-operation [`ChainClient`]
//! contract, so any capability-compatible implementation can be plugged in: the
//! bundled [`JsonRpcClient`], a stub in tests, or a recorded fixture.

mod dto;
mod rpc;

use crate::model::{BlockHeight, Transaction};
use async_trait::async_trait;
use thiserror::Error;

pub use dto::{Block, RpcErrorObject, RpcRequest, RpcResponse};
pub use rpc::{format_hex_height, parse_hex_height, JsonRpcClient};

/// A read-only view of the chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetches the height of the most recent block.
    async fn latest_block_number(&self) -> Result<BlockHeight, ClientError>;

    /// Fetches every transaction of the block at `height`, in the block's own order.
    async fn transactions_by_block_number(
        &self,
        height: BlockHeight,
    ) -> Result<Vec<Transaction>, ClientError>;
}

/// Failures surfaced by a [`ChainClient`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced an HTTP response (connect, timeout, TLS, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a non-success HTTP status.
    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    /// The response could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The node reported a method-level failure.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node returned no block for a height it had already reported.
    #[error("block {0} is not available yet")]
    MissingBlock(BlockHeight),
}

impl ClientError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::MissingBlock(_) => true,
            ClientError::Status(status) => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            ClientError::Protocol(_) | ClientError::Rpc { .. } => false,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Protocol(err.to_string())
    }
}
