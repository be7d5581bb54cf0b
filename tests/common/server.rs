//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database.

use super::constants::*;
use super::fixtures::create_test_db_with_users;
use mcp_marketplace_server::catalog_store::CatalogStore;
use mcp_marketplace_server::deployment::DeploymentStore;
use mcp_marketplace_server::{
    make_app, DeploymentManager, ProvisioningScheduler, RequestsLoggingLevel, ServerConfig,
    SqliteCatalogStore, SqliteDeploymentStore, SqliteUserStore, UserManager,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database.
///
/// When dropped, the server gracefully shuts down and the database is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    pub port: u16,

    /// Catalog store for direct database checks in tests
    pub catalog_store: Arc<dyn CatalogStore>,

    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with the default catalog seeded.
    pub async fn spawn() -> Self {
        Self::spawn_with_catalog(true).await
    }

    /// Spawns a server whose catalog is empty.
    #[allow(dead_code)]
    pub async fn spawn_empty() -> Self {
        Self::spawn_with_catalog(false).await
    }

    async fn spawn_with_catalog(seed: bool) -> Self {
        let (temp_db_dir, conn) =
            create_test_db_with_users(seed).expect("Failed to create test database");

        let catalog_store: Arc<dyn CatalogStore> =
            Arc::new(SqliteCatalogStore::new(conn.clone()));
        let deployment_store: Arc<dyn DeploymentStore> =
            Arc::new(SqliteDeploymentStore::new(conn.clone()));
        let scheduler = ProvisioningScheduler::new(
            deployment_store.clone(),
            Duration::from_millis(TEST_PROVISIONING_DELAY_MS),
        );
        let deployment_manager = Arc::new(DeploymentManager::new(
            catalog_store.clone(),
            deployment_store,
            scheduler,
            TEST_DEPLOYMENT_DOMAIN.to_string(),
        ));
        let user_manager = UserManager::new(Box::new(SqliteUserStore::new(conn)));

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
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let app = make_app(
            config,
            catalog_store.clone(),
            deployment_manager,
            user_manager,
        );

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
            catalog_store,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Polls `/` until the server answers.
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
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }

    /// Looks up a catalog entry id by slug, straight from the store.
    #[allow(dead_code)]
    pub fn mcp_id(&self, slug: &str) -> i64 {
        self.catalog_store
            .get_by_slug(slug)
            .expect("Failed to read catalog")
            .unwrap_or_else(|| panic!("No catalog entry {}", slug))
            .id
    }

    /// Time after which every pending deployment should be running.
    #[allow(dead_code)]
    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(TEST_PROVISIONING_DELAY_MS * 3)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
