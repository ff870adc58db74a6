//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own database and stubbed
//! external services.

use super::constants::*;
use super::fixtures::create_test_db_with_users;
use super::stubs::{ModelScript, ScriptedModel, StubChainClient};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use vibezmaster_studio::evaluation::SongEvaluator;
use vibezmaster_studio::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use vibezmaster_studio::user::{SqliteUserStore, UserStore};

/// Test server instance with isolated database and stubbed dependencies.
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// User store for direct database access in tests
    pub user_store: Arc<SqliteUserStore>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server whose model always fails and whose chain knows no
    /// transactions. Enough for auth flows and negative paths.
    pub async fn spawn() -> Self {
        Self::spawn_with(ModelScript::Fail, StubChainClient::empty()).await
    }

    /// Spawns a server with a scripted model response and a stub chain.
    pub async fn spawn_with(model: ModelScript, chain: StubChainClient) -> Self {
        let (temp_db_dir, _db_path, user_store) =
            create_test_db_with_users().expect("Failed to create test database");
        let user_store_for_test = user_store.clone();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            max_upload_bytes: 1024 * 1024,
        };

        let evaluator = Arc::new(SongEvaluator::new(Arc::new(ScriptedModel::new(model))));

        let app = make_app(
            config,
            user_store as Arc<dyn UserStore>,
            evaluator,
            Arc::new(chain),
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            user_store: user_store_for_test,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the stats endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
