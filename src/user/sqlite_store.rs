use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
use crate::user::auth::{AuthToken, AuthTokenValue, CredentialsHasher, PasswordCredentials};
use crate::user::models::MintRecord;
use crate::user::store::{MintInsertOutcome, UserStore};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::info;

/// V 0
const USER_TABLE: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};

const PASSWORD_CREDENTIALS_TABLE: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

const AUTH_TOKEN_TABLE: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};

const WALLET_LINK_TABLE: Table = Table {
    name: "wallet_link",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[],
};

const MINT_RECORD_TABLE: Table = Table {
    name: "mint_record",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "transaction_hash",
            &SqlType::Text,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!("contract_address", &SqlType::Text, non_null = true),
        sqlite_column!("token_id", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_mint_record_user_id", "user_id")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE,
        PASSWORD_CREDENTIALS_TABLE,
        AUTH_TOKEN_TABLE,
        WALLET_LINK_TABLE,
        MINT_RECORD_TABLE,
    ],
    migration: None,
}];

fn unix_secs(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn from_unix_secs(secs: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64)
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
            conn
        };

        // Read the database version
        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!(
                "Database version {} is too old, does not contain base db version {}",
                db_version,
                BASE_DB_VERSION
            );
        }
        let version = db_version as usize;

        if db_version >= VERSIONED_SCHEMAS.len() as i64 {
            bail!("Database version {} is too new", db_version);
        } else {
            VERSIONED_SCHEMAS
                .get(version)
                .context("Failed to get schema")?
                .validate(&conn)?;
        }

        Self::migrate_if_needed(&conn, version)?;

        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;

        Ok(())
    }
}

fn mint_record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MintRecord> {
    Ok(MintRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        transaction_hash: row.get(2)?,
        contract_address: row.get(3)?,
        token_id: row.get(4)?,
        created: row.get(5)?,
    })
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, handle: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO user (handle) VALUES (?1)", params![handle])
            .with_context(|| format!("Failed to create user {}", handle))?;
        Ok(conn.last_insert_rowid())
    }

    fn get_user_id(&self, handle: &str) -> Option<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id FROM user WHERE handle = ?1",
            params![handle],
            |row| row.get(0),
        )
        .ok()
    }

    fn get_user_handle(&self, user_id: i64) -> Option<String> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT handle FROM user WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .ok()
    }

    fn get_all_user_handles(&self) -> Vec<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = match conn.prepare("SELECT handle FROM user ORDER BY id") {
            Ok(stmt) => stmt,
            Err(_) => return Vec::new(),
        };
        stmt.query_map([], |row| row.get(0))
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    fn get_password_credentials(&self, handle: &str) -> Option<PasswordCredentials> {
        let conn = self.conn.lock().unwrap();
        let (user_id, salt, hash, hasher, created, last_used): (
            i64,
            String,
            String,
            String,
            i64,
            Option<i64>,
        ) = conn
            .query_row(
                "SELECT c.user_id, c.salt, c.hash, c.hasher, c.created, c.last_used \
                 FROM user_password_credentials c \
                 JOIN user u ON u.id = c.user_id \
                 WHERE u.handle = ?1",
                params![handle],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .ok()?;

        Some(PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher: CredentialsHasher::from_str(&hasher).ok()?,
            created: from_unix_secs(created),
            last_used: last_used.map(from_unix_secs),
        })
    }

    fn upsert_password_credentials(&self, credentials: PasswordCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher, created, last_used) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(user_id) DO UPDATE SET \
             salt = excluded.salt, hash = excluded.hash, hasher = excluded.hasher, \
             created = excluded.created, last_used = excluded.last_used",
            params![
                credentials.user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
                unix_secs(credentials.created),
                credentials.last_used.map(unix_secs),
            ],
        )?;
        Ok(())
    }

    fn add_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (user_id, value, created, last_used) VALUES (?1, ?2, ?3, ?4)",
            params![
                token.user_id,
                token.value.0,
                unix_secs(token.created),
                token.last_used.map(unix_secs),
            ],
        )?;
        Ok(())
    }

    fn get_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT user_id, created, last_used, value FROM auth_token WHERE value = ?1",
            params![value.0],
            |row| {
                Ok(AuthToken {
                    user_id: row.get(0)?,
                    created: from_unix_secs(row.get(1)?),
                    last_used: row.get::<_, Option<i64>>(2)?.map(from_unix_secs),
                    value: AuthTokenValue(row.get(3)?),
                })
            },
        )
        .ok()
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM auth_token WHERE value = ?1",
            params![value.0],
        )?;
        Ok(deleted > 0)
    }

    fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![unix_secs(SystemTime::now()), value.0],
        )?;
        Ok(())
    }

    fn get_wallet_address(&self, user_id: i64) -> Option<String> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT address FROM wallet_link WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .ok()
    }

    fn set_wallet_address(&self, user_id: i64, address: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO wallet_link (user_id, address) VALUES (?1, ?2) \
             ON CONFLICT(user_id) DO UPDATE SET address = excluded.address",
            params![user_id, address],
        )?;
        Ok(())
    }

    fn insert_mint_record(
        &self,
        user_id: i64,
        transaction_hash: &str,
        contract_address: &str,
        token_id: Option<&str>,
    ) -> Result<MintInsertOutcome> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT INTO mint_record (user_id, transaction_hash, contract_address, token_id) \
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, transaction_hash, contract_address, token_id],
        );

        match inserted {
            Ok(_) => {
                let record = conn.query_row(
                    "SELECT id, user_id, transaction_hash, contract_address, token_id, created \
                     FROM mint_record WHERE id = ?1",
                    params![conn.last_insert_rowid()],
                    mint_record_from_row,
                )?;
                Ok(MintInsertOutcome::Recorded(record))
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Ok(MintInsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_user_mint_records(&self, user_id: i64) -> Result<Vec<MintRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, transaction_hash, contract_address, token_id, created \
             FROM mint_record WHERE user_id = ?1 ORDER BY id",
        )?;
        let records = stmt
            .query_map(params![user_id], mint_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
