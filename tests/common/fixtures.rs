//! Test database fixtures.

use super::constants::*;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use vibezmaster_studio::user::{SqliteUserStore, UserManager, UserStore};

/// Creates a temporary user database pre-provisioned with the test users.
pub fn create_test_db_with_users() -> Result<(TempDir, PathBuf, Arc<SqliteUserStore>)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("user.db");

    let store = Arc::new(SqliteUserStore::new(&db_path)?);
    let manager = UserManager::new(store.clone() as Arc<dyn UserStore>);

    for (handle, password) in [(TEST_USER, TEST_PASS), (OTHER_USER, OTHER_PASS)] {
        manager.add_user(handle)?;
        manager.set_password_credentials(handle, password)?;
    }

    Ok((temp_dir, db_path, store))
}
