//! JSON-RPC client for fetching transaction receipts.

use super::models::TxReceipt;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the blockchain RPC endpoint.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for fetching transaction receipts.
///
/// Object-safe so the mint recorder can be exercised against stub chains.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch the receipt for a transaction hash.
    ///
    /// Returns `Ok(None)` when the node knows no such transaction (pending
    /// or nonexistent).
    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ChainError>;
}

/// `eth_getTransactionReceipt` over plain JSON-RPC 2.0.
pub struct JsonRpcChainClient {
    client: Client,
    url: String,
}

impl JsonRpcChainClient {
    /// Create a new RPC client.
    ///
    /// # Arguments
    /// * `url` - Full RPC endpoint URL, including any API key path segment.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ChainError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_getTransactionReceipt",
            params: vec![tx_hash.to_string()],
        };

        debug!(tx_hash = %tx_hash, "Fetching transaction receipt");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .timeout(RPC_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Timeout
                } else {
                    ChainError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::InvalidResponse(format!(
                "RPC endpoint returned status {}: {}",
                status, body
            )));
        }

        let rpc_response: JsonRpcResponse<TxReceipt> = response.json().await.map_err(|e| {
            ChainError::InvalidResponse(format!("Failed to parse RPC response: {}", e))
        })?;

        if let Some(error) = rpc_response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(rpc_response.result)
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}
