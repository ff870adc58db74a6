//! Admin CLI for managing user accounts directly against the user database.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use vibezmaster_studio::user::{SqliteUserStore, UserManager};

#[derive(Parser, Debug)]
struct Cli {
    /// Path to the SQLite user database file.
    pub user_db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user and set its password.
    AddUser { handle: String, password: String },
    /// Set (or replace) a user's password.
    SetPassword { handle: String, password: String },
    /// List all user handles.
    ListUsers,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = Arc::new(SqliteUserStore::new(&cli.user_db)?);
    let manager = UserManager::new(store);

    match cli.command {
        Command::AddUser { handle, password } => {
            let user_id = manager.add_user(&handle)?;
            manager.set_password_credentials(&handle, &password)?;
            println!("Created user {} with id {}", handle, user_id);
        }
        Command::SetPassword { handle, password } => {
            manager.set_password_credentials(&handle, &password)?;
            println!("Updated password for {}", handle);
        }
        Command::ListUsers => {
            for handle in manager.get_all_user_handles() {
                println!("{}", handle);
            }
        }
    }

    Ok(())
}
