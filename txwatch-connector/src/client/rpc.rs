use super::{
    dto::{Block, RpcRequest, RpcResponse},
    ChainClient, ClientError,
};
use crate::{
    config::Chain,
    model::{BlockHeight, Transaction},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::time::Duration;

/// A [`ChainClient`] speaking Ethereum JSON-RPC 2.0 over HTTP POST.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    url: String,
    http: reqwest::Client,
}

impl JsonRpcClient {
    /// Creates a client whose requests are bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(url, http))
    }

    /// Creates a client on top of an already configured `reqwest::Client`.
    pub fn with_http_client(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    pub fn from_config(config: &Chain) -> Result<Self, ClientError> {
        Self::new(
            config.rpc_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs one JSON-RPC call and returns the raw `result` member, which is
    /// `None` when the node answered with `null`.
    async fn call<P: Serialize>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<serde_json::Value>, ClientError> {
        let request = RpcRequest::new(method, params);
        tracing::trace!(method, url = %self.url, "Sending JSON-RPC request");

        let response = self.http.post(&self.url).json(&request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        let decoded = serde_json::from_slice::<RpcResponse>(&body);
        if !status.is_success() {
            // Some nodes pair an error status with a proper JSON-RPC error object.
            return match decoded {
                Ok(RpcResponse {
                    error: Some(err), ..
                }) => Err(ClientError::Rpc {
                    code: err.code,
                    message: err.message,
                }),
                _ => Err(ClientError::Status(status)),
            };
        }

        let response = decoded?;
        if let Some(err) = response.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(response.result.filter(|value| !value.is_null()))
    }

    async fn call_for<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<T>, ClientError> {
        match self.call(method, params).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn latest_block_number(&self) -> Result<BlockHeight, ClientError> {
        let hex: String = self
            .call_for("eth_blockNumber", json!([]))
            .await?
            .ok_or_else(|| ClientError::Protocol("eth_blockNumber returned no result".into()))?;
        parse_hex_height(&hex)
    }

    async fn transactions_by_block_number(
        &self,
        height: BlockHeight,
    ) -> Result<Vec<Transaction>, ClientError> {
        let block: Block = self
            .call_for(
                "eth_getBlockByNumber",
                json!([format_hex_height(height), true]),
            )
            .await?
            .ok_or(ClientError::MissingBlock(height))?;
        tracing::trace!(height, hash = %block.hash, count = block.transactions.len(), "Fetched block");
        Ok(block.transactions)
    }
}

/// Parses a `0x`-prefixed base-16 quantity into a block height.
pub fn parse_hex_height(hex: &str) -> Result<BlockHeight, ClientError> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .ok_or_else(|| ClientError::Protocol(format!("quantity {hex:?} lacks the 0x prefix")))?;
    if digits.is_empty() {
        return Err(ClientError::Protocol(format!("quantity {hex:?} has no digits")));
    }
    // `from_str_radix` would accept a leading sign.
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ClientError::Protocol(format!("quantity {hex:?} is not unsigned hex")));
    }
    BlockHeight::from_str_radix(digits, 16)
        .map_err(|e| ClientError::Protocol(format!("invalid quantity {hex:?}: {e}")))
}

/// Formats a block height as a `0x`-prefixed base-16 quantity.
pub fn format_hex_height(height: BlockHeight) -> String {
    format!("{height:#x}")
}
