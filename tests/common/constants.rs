//! Shared constants for end-to-end tests.

/// Pre-provisioned regular user.
pub const TEST_USER: &str = "test_artist";
pub const TEST_PASS: &str = "test_password_123";

/// A second pre-provisioned user for cross-user scenarios.
pub const OTHER_USER: &str = "other_artist";
pub const OTHER_PASS: &str = "other_password_456";

/// How long to wait for a spawned server to accept requests.
pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Per-request timeout for test clients.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
