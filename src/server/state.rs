use axum::extract::FromRef;

use crate::chain::ChainClient;
use crate::evaluation::SongEvaluator;
use crate::user::UserManager;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserManager = Arc<Mutex<UserManager>>;
pub type GuardedEvaluator = Arc<SongEvaluator>;
pub type GuardedChainClient = Arc<dyn ChainClient>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_manager: GuardedUserManager,
    pub evaluator: GuardedEvaluator,
    pub chain: GuardedChainClient,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedEvaluator {
    fn from_ref(input: &ServerState) -> Self {
        input.evaluator.clone()
    }
}

impl FromRef<ServerState> for GuardedChainClient {
    fn from_ref(input: &ServerState) -> Self {
        input.chain.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
