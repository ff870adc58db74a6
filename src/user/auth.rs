//! Authentication primitives: bearer tokens and password hashing.

use anyhow::{bail, Result};

use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use std::str::FromStr;
use std::time::SystemTime;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct AuthTokenValue(pub String);

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthToken {
    pub user_id: i64,
    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
    pub value: AuthTokenValue,
}

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        AuthTokenValue(random_string)
    }
}

mod vibez_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

// Keccak-based hasher for tests only, orders of magnitude faster than argon2.
#[cfg(feature = "test-fast-hasher")]
mod fast_hasher {
    use sha3::{Digest, Keccak256};

    pub fn hash(plain: &[u8], b64_salt: &str) -> String {
        let mut hasher = Keccak256::new();
        hasher.update(b64_salt.as_bytes());
        hasher.update(plain);
        hex::encode(hasher.finalize())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub enum CredentialsHasher {
    Argon2,
    #[cfg(feature = "test-fast-hasher")]
    FastInsecure,
}

impl FromStr for CredentialsHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(CredentialsHasher::Argon2),
            #[cfg(feature = "test-fast-hasher")]
            "fast-insecure" => Ok(CredentialsHasher::FastInsecure),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl std::fmt::Display for CredentialsHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialsHasher::Argon2 => write!(f, "argon2"),
            #[cfg(feature = "test-fast-hasher")]
            CredentialsHasher::FastInsecure => write!(f, "fast-insecure"),
        }
    }
}

impl CredentialsHasher {
    /// The hasher new credentials should use.
    pub fn default_hasher() -> CredentialsHasher {
        #[cfg(feature = "test-fast-hasher")]
        return CredentialsHasher::FastInsecure;

        #[cfg(not(feature = "test-fast-hasher"))]
        CredentialsHasher::Argon2
    }

    pub fn generate_b64_salt(&self) -> String {
        match self {
            CredentialsHasher::Argon2 => vibez_argon2::generate_b64_salt(),
            #[cfg(feature = "test-fast-hasher")]
            CredentialsHasher::FastInsecure => vibez_argon2::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            CredentialsHasher::Argon2 => vibez_argon2::hash(plain, b64_salt),
            #[cfg(feature = "test-fast-hasher")]
            CredentialsHasher::FastInsecure => Ok(fast_hasher::hash(plain, b64_salt.as_ref())),
        }
    }

    pub fn verify(&self, plain_pw: &str, target_hash: &str, salt: &str) -> Result<bool> {
        match self {
            CredentialsHasher::Argon2 => {
                let _ = salt; // argon2 hash strings embed the salt
                vibez_argon2::verify(plain_pw.as_bytes(), target_hash)
            }
            #[cfg(feature = "test-fast-hasher")]
            CredentialsHasher::FastInsecure => {
                Ok(fast_hasher::hash(plain_pw.as_bytes(), salt) == target_hash)
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PasswordCredentials {
    pub user_id: i64,
    pub salt: String,
    pub hash: String,
    pub hasher: CredentialsHasher,

    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
}
