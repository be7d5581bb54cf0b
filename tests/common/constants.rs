//! Shared constants for end-to-end tests
#![allow(dead_code)]

// ============================================================================
// Test User Credentials
// ============================================================================

pub const TEST_USER_EMAIL: &str = "testuser@example.com";
pub const TEST_PASS: &str = "testpass123";

/// A second account, used to check that deployments stay private.
pub const OTHER_USER_EMAIL: &str = "other@example.com";
pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Catalog Slugs (from the default catalog)
// ============================================================================

pub const POSTGRES_MCP_SLUG: &str = "postgresql-mcp";
pub const SLACK_MCP_SLUG: &str = "slack-mcp";
pub const GITHUB_MCP_SLUG: &str = "github-mcp";

pub const DEFAULT_CATALOG_SIZE: usize = 6;

// ============================================================================
// Server Settings
// ============================================================================

pub const TEST_DEPLOYMENT_DOMAIN: &str = "test.mcpmarket.dev";

/// Short enough to wait out in a test, long enough to observe `deploying`.
pub const TEST_PROVISIONING_DELAY_MS: u64 = 300;

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
