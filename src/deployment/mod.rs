//! Per-user deployments of catalog entries and their simulated lifecycle.

mod manager;
mod models;
mod scheduler;
mod schema;
mod store;
mod trait_def;

pub use manager::{
    DeploymentManager, DEFAULT_DEPLOYMENT_DOMAIN, DEPLOYMENT_NOT_FOUND, MCP_NOT_FOUND,
};
pub use models::*;
pub use scheduler::{ProvisioningScheduler, DEFAULT_PROVISIONING_DELAY};
pub use schema::{DEPLOYMENT_TABLE_V_0, DEPLOYMENT_TABLE_V_1};
pub use store::SqliteDeploymentStore;
pub use trait_def::DeploymentStore;
