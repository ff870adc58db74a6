//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with methods for every server endpoint. When API routes
//! or request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management.
///
/// After a successful `login` the bearer token is also captured so tests
/// can exercise the `Authorization` header path explicitly.
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Bearer token captured from the last successful login
    pub token: Option<String>,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Creates a client pre-authenticated as the regular test user.
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let mut client = Self::new(base_url);

        let status = client.login(TEST_USER, TEST_PASS).await;
        assert_eq!(
            status,
            reqwest::StatusCode::CREATED,
            "Test user authentication failed"
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    ///
    /// On success the issued bearer token is captured into `self.token`.
    pub async fn login(&mut self, handle: &str, password: &str) -> reqwest::StatusCode {
        let response = self
            .client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "user_handle": handle,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed");

        let status = response.status();
        if status == reqwest::StatusCode::CREATED {
            let body: serde_json::Value = response.json().await.expect("Login body not JSON");
            self.token = body
                .get("token")
                .and_then(|t| t.as_str())
                .map(str::to_string);
        }
        status
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.get("/v1/auth/logout").await
    }

    /// GET /v1/auth/nonce
    pub async fn nonce(&self) -> Response {
        self.get("/v1/auth/nonce").await
    }

    // ========================================================================
    // Song Evaluation
    // ========================================================================

    /// POST /v1/song/evaluate with a multipart `songFile` field
    pub async fn evaluate_song(&self, bytes: &[u8], mime: Option<&str>) -> Response {
        let mut part = Part::bytes(bytes.to_vec()).file_name("song.mp3");
        if let Some(mime) = mime {
            part = part.mime_str(mime).expect("Invalid test MIME type");
        }
        let form = Form::new().part("songFile", part);

        self.client
            .post(format!("{}/v1/song/evaluate", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Evaluation request failed")
    }

    /// POST /v1/song/evaluate with an arbitrary multipart form
    pub async fn evaluate_with_form(&self, form: Form) -> Response {
        self.client
            .post(format!("{}/v1/song/evaluate", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Evaluation request failed")
    }

    // ========================================================================
    // Wallet & Mint Endpoints
    // ========================================================================

    /// POST /v1/wallet/verify
    pub async fn verify_wallet(&self, message: &str, signature: &str) -> Response {
        self.post_json(
            "/v1/wallet/verify",
            json!({ "message": message, "signature": signature }),
        )
        .await
    }

    /// POST /v1/mint/record
    pub async fn record_mint(&self, body: serde_json::Value) -> Response {
        self.post_json("/v1/mint/record", body).await
    }

    /// GET /v1/mint/records
    pub async fn mint_records(&self) -> Response {
        self.get("/v1/mint/records").await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("POST request failed")
    }
}
