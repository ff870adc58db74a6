pub mod auth;
mod manager;
mod models;
mod sqlite_store;
mod store;

pub use auth::{AuthToken, AuthTokenValue, CredentialsHasher, PasswordCredentials};
pub use manager::UserManager;
pub use models::MintRecord;
pub use sqlite_store::SqliteUserStore;
pub use store::{MintInsertOutcome, UserStore};
