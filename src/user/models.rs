use serde::{Deserialize, Serialize};

/// A durably recorded on-chain mint, keyed uniquely by transaction hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRecord {
    pub id: i64,
    pub user_id: i64,
    pub transaction_hash: String,
    pub contract_address: String,
    pub token_id: Option<String>,
    /// Unix timestamp (seconds) assigned by the database on insert.
    pub created: i64,
}
