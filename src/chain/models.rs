use serde::{Deserialize, Serialize};

/// The subset of an EVM transaction receipt needed for mint verification.
///
/// `status` is the post-Byzantium hex status flag. `to` is absent for
/// contract-creation transactions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub status: String,
    pub from: String,
    pub to: Option<String>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_str(), "0x1" | "0x01")
    }
}

/// Hex addresses compare case-insensitively: checksummed and lowercased
/// spellings of the same address must match.
pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
