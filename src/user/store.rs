use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials};
use super::models::MintRecord;
use anyhow::Result;

/// Outcome of a mint-record insertion.
///
/// Duplicates are an expected outcome, not an error: concurrent submissions
/// of the same transaction hash are serialized by the database's uniqueness
/// constraint, and the loser must be told apart from a real failure.
#[derive(Debug)]
pub enum MintInsertOutcome {
    Recorded(MintRecord),
    Duplicate,
}

pub trait UserStore: Send + Sync {
    fn create_user(&self, handle: &str) -> Result<i64>;
    fn get_user_id(&self, handle: &str) -> Option<i64>;
    fn get_user_handle(&self, user_id: i64) -> Option<String>;
    fn get_all_user_handles(&self) -> Vec<String>;

    fn get_password_credentials(&self, handle: &str) -> Option<PasswordCredentials>;
    fn upsert_password_credentials(&self, credentials: PasswordCredentials) -> Result<()>;

    fn add_auth_token(&self, token: AuthToken) -> Result<()>;
    fn get_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken>;
    /// Returns true if a token was deleted.
    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<bool>;
    fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()>;

    fn get_wallet_address(&self, user_id: i64) -> Option<String>;
    /// Links a wallet to a user, replacing any previously linked address.
    fn set_wallet_address(&self, user_id: i64, address: &str) -> Result<()>;

    fn insert_mint_record(
        &self,
        user_id: i64,
        transaction_hash: &str,
        contract_address: &str,
        token_id: Option<&str>,
    ) -> Result<MintInsertOutcome>;
    fn get_user_mint_records(&self, user_id: i64) -> Result<Vec<MintRecord>>;
}
