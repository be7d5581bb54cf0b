//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides one method per marketplace endpoint.
//! When API routes or request formats change, update only this file.
#![allow(dead_code)]

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as the main test user.
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER_EMAIL, TEST_PASS).await
    }

    /// Creates a client logged in as the second test user.
    pub async fn authenticated_other(base_url: String) -> Self {
        Self::authenticated_as(base_url, OTHER_USER_EMAIL, OTHER_PASS).await
    }

    async fn authenticated_as(base_url: String, email: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Authentication of {} failed: {:?}",
            email,
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /api/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /api/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(self.url("/api/auth/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /api/auth/user
    pub async fn current_user(&self) -> Response {
        self.client
            .get(self.url("/api/auth/user"))
            .send()
            .await
            .expect("Current user request failed")
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /api/mcps with the given query parameters
    pub async fn list_mcps(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/api/mcps"))
            .query(query)
            .send()
            .await
            .expect("List MCPs request failed")
    }

    /// GET /api/mcps/{slug}
    pub async fn get_mcp(&self, slug: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/mcps/{}", slug)))
            .send()
            .await
            .expect("Get MCP request failed")
    }

    /// POST /api/seed-mcps
    pub async fn seed_mcps(&self) -> Response {
        self.client
            .post(self.url("/api/seed-mcps"))
            .send()
            .await
            .expect("Seed request failed")
    }

    // ========================================================================
    // Deployment Endpoints
    // ========================================================================

    /// GET /api/deployments
    pub async fn list_deployments(&self) -> Response {
        self.client
            .get(self.url("/api/deployments"))
            .send()
            .await
            .expect("List deployments request failed")
    }

    /// GET /api/deployments/{id}
    pub async fn get_deployment(&self, id: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/deployments/{}", id)))
            .send()
            .await
            .expect("Get deployment request failed")
    }

    /// POST /api/deployments with a raw JSON body
    pub async fn create_deployment_raw(&self, body: Value) -> Response {
        self.client
            .post(self.url("/api/deployments"))
            .json(&body)
            .send()
            .await
            .expect("Create deployment request failed")
    }

    /// POST /api/deployments
    pub async fn create_deployment(&self, mcp_id: i64, env_vars: Value) -> Response {
        self.create_deployment_raw(json!({ "mcpId": mcp_id, "envVars": env_vars }))
            .await
    }

    /// Creates a deployment and returns its JSON, asserting success.
    pub async fn create_deployment_ok(&self, mcp_id: i64, env_vars: Value) -> Value {
        let response = self.create_deployment(mcp_id, env_vars).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Invalid deployment JSON")
    }

    /// PATCH /api/deployments/{id}/status
    pub async fn update_status(&self, id: &str, body: Value) -> Response {
        self.client
            .patch(self.url(&format!("/api/deployments/{}/status", id)))
            .json(&body)
            .send()
            .await
            .expect("Update status request failed")
    }

    /// PATCH /api/deployments/{id}/env-vars
    pub async fn update_env_vars(&self, id: &str, body: Value) -> Response {
        self.client
            .patch(self.url(&format!("/api/deployments/{}/env-vars", id)))
            .json(&body)
            .send()
            .await
            .expect("Update env vars request failed")
    }

    /// DELETE /api/deployments/{id}
    pub async fn delete_deployment(&self, id: &str) -> Response {
        self.client
            .delete(self.url(&format!("/api/deployments/{}", id)))
            .send()
            .await
            .expect("Delete deployment request failed")
    }
}
