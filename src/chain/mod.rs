//! Blockchain RPC plumbing for mint verification.

mod client;
mod models;

pub use client::{ChainClient, ChainError, JsonRpcChainClient};
pub use models::{same_address, TxReceipt};
