//! MCP Marketplace Server Library
//!
//! This library exposes the internal modules for the binaries and the
//! end-to-end tests.

pub mod catalog_store;
pub mod config;
pub mod deployment;
pub mod error;
pub mod marketplace_db;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use deployment::{DeploymentManager, ProvisioningScheduler, SqliteDeploymentStore};
pub use error::{MarketplaceError, MarketplaceResult};
pub use marketplace_db::open_marketplace_db;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserManager};
