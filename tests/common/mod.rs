//! Shared end-to-end test infrastructure.
//!
//! Each test spawns an isolated server on a random port with its own
//! temporary database, a scripted generative model, and a stub blockchain
//! client, then drives it over real HTTP.
#![allow(dead_code)] // Not every test binary uses every helper

mod client;
mod constants;
mod fixtures;
mod server;
mod stubs;

pub use client::TestClient;
pub use constants::*;
pub use fixtures::create_test_db_with_users;
pub use server::TestServer;
pub use stubs::{ModelScript, ScriptedModel, StubChainClient};
