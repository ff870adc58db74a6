use super::{
    auth::{AuthToken, AuthTokenValue, CredentialsHasher, PasswordCredentials},
    models::MintRecord,
    store::{MintInsertOutcome, UserStore},
};
use anyhow::{bail, Context, Result};
use std::{sync::Arc, time::SystemTime};

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub fn add_user<T: AsRef<str>>(&self, handle: T) -> Result<i64> {
        if handle.as_ref().is_empty() {
            bail!("The user handle cannot be empty.")
        }

        if self.user_store.get_user_id(handle.as_ref()).is_some() {
            bail!("User handle already exists.");
        }

        self.user_store.create_user(handle.as_ref())
    }

    pub fn get_all_user_handles(&self) -> Vec<String> {
        self.user_store.get_all_user_handles()
    }

    fn create_hashed_password(user_id: i64, password: &str) -> Result<PasswordCredentials> {
        let hasher = CredentialsHasher::default_hasher();
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok(PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher,
            created: SystemTime::now(),
            last_used: None,
        })
    }

    pub fn set_password_credentials(&self, handle: &str, password: &str) -> Result<()> {
        let user_id = self
            .user_store
            .get_user_id(handle)
            .with_context(|| format!("User with handle {} not found.", handle))?;
        let credentials = Self::create_hashed_password(user_id, password)?;
        self.user_store.upsert_password_credentials(credentials)
    }

    /// Verifies a handle/password pair and issues a fresh bearer token.
    ///
    /// Returns `None` when the handle is unknown, has no password
    /// credentials, or the password does not match.
    pub fn login(&self, handle: &str, password: &str) -> Result<Option<AuthToken>> {
        let credentials = match self.user_store.get_password_credentials(handle) {
            Some(credentials) => credentials,
            None => return Ok(None),
        };

        if !credentials
            .hasher
            .verify(password, &credentials.hash, &credentials.salt)?
        {
            return Ok(None);
        }

        let token = AuthToken {
            user_id: credentials.user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_auth_token(token.clone())?;
        Ok(Some(token))
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken> {
        self.user_store.get_auth_token(value)
    }

    pub fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store.touch_auth_token(value)
    }

    pub fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<bool> {
        self.user_store.delete_auth_token(value)
    }

    pub fn wallet_address(&self, user_id: i64) -> Option<String> {
        self.user_store.get_wallet_address(user_id)
    }

    pub fn link_wallet(&self, user_id: i64, address: &str) -> Result<()> {
        self.user_store.set_wallet_address(user_id, address)
    }

    pub fn record_mint(
        &self,
        user_id: i64,
        transaction_hash: &str,
        contract_address: &str,
        token_id: Option<&str>,
    ) -> Result<MintInsertOutcome> {
        self.user_store
            .insert_mint_record(user_id, transaction_hash, contract_address, token_id)
    }

    pub fn mint_records(&self, user_id: i64) -> Result<Vec<MintRecord>> {
        self.user_store.get_user_mint_records(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::SqliteUserStore;
    use tempfile::TempDir;

    fn manager() -> (TempDir, UserManager) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteUserStore::new(temp_dir.path().join("user.db")).unwrap();
        (temp_dir, UserManager::new(Arc::new(store)))
    }

    #[test]
    fn rejects_empty_and_duplicate_handles() {
        let (_tmp, manager) = manager();
        assert!(manager.add_user("").is_err());
        manager.add_user("artist").unwrap();
        assert!(manager.add_user("artist").is_err());
    }

    #[test]
    fn login_issues_token_only_for_valid_credentials() {
        let (_tmp, manager) = manager();
        manager.add_user("artist").unwrap();
        manager.set_password_credentials("artist", "s3cret").unwrap();

        assert!(manager.login("artist", "wrong").unwrap().is_none());
        assert!(manager.login("nobody", "s3cret").unwrap().is_none());

        let token = manager.login("artist", "s3cret").unwrap().unwrap();
        let loaded = manager.get_auth_token(&token.value).unwrap();
        assert_eq!(loaded.user_id, token.user_id);

        assert!(manager.delete_auth_token(&token.value).unwrap());
        assert!(manager.get_auth_token(&token.value).is_none());
    }
}
