//! Deployment lifecycle: creation, owner-scoped mutations and listing.

use super::models::{Deployment, DeploymentStatus, DeploymentWithMcp, EnvVars, NewDeployment};
use super::scheduler::ProvisioningScheduler;
use super::trait_def::DeploymentStore;
use crate::catalog_store::{CatalogStore, McpServer};
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::server::metrics;
use anyhow::Context;
use rand::{rng, Rng};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_DEPLOYMENT_DOMAIN: &str = "mcpmarket.dev";
pub const DEPLOYMENT_NOT_FOUND: &str = "Deployment not found";
pub const MCP_NOT_FOUND: &str = "MCP not found";

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 6;
const MAX_URL_ATTEMPTS: usize = 3;

fn random_suffix() -> String {
    let mut rng = rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Keys the entry marks required that are absent or empty in `env_vars`.
fn missing_required_keys(mcp: &McpServer, env_vars: &EnvVars) -> Vec<String> {
    mcp.required_env_keys()
        .filter(|key| env_vars.get(*key).map_or(true, |value| value.is_empty()))
        .map(str::to_string)
        .collect()
}

/// Owner guard shared by every single-row operation. A row owned by someone
/// else is reported exactly like a missing one.
fn owned_by(deployment: Option<Deployment>, caller: &str) -> MarketplaceResult<Deployment> {
    match deployment {
        Some(deployment) if deployment.user_id == caller => Ok(deployment),
        _ => Err(MarketplaceError::not_found(DEPLOYMENT_NOT_FOUND)),
    }
}

pub struct DeploymentManager {
    catalog: Arc<dyn CatalogStore>,
    store: Arc<dyn DeploymentStore>,
    scheduler: ProvisioningScheduler,
    domain: String,
}

impl DeploymentManager {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        store: Arc<dyn DeploymentStore>,
        scheduler: ProvisioningScheduler,
        domain: String,
    ) -> Self {
        Self {
            catalog,
            store,
            scheduler,
            domain,
        }
    }

    fn compose(&self, mcp: &McpServer, suffix: &str) -> (String, String) {
        let name = format!("{} - {}", mcp.name, suffix);
        let url = format!("https://{}-{}.{}", mcp.slug, suffix, self.domain);
        (name, url)
    }

    /// Creates a deployment of catalog entry `mcp_id` for `owner`.
    ///
    /// Returns as soon as the row exists in the `deploying` state. The move to
    /// `running` happens later on the provisioning scheduler.
    pub fn create(
        &self,
        owner: &str,
        mcp_id: i64,
        env_vars: EnvVars,
    ) -> MarketplaceResult<Deployment> {
        let mcp = self
            .catalog
            .get_by_id(mcp_id)
            .context("Failed to create deployment")?
            .ok_or_else(|| MarketplaceError::not_found(MCP_NOT_FOUND))?;

        let missing = missing_required_keys(&mcp, &env_vars);
        if !missing.is_empty() {
            return Err(MarketplaceError::missing_keys(missing));
        }

        let mut attempt = 0;
        let deployment = loop {
            attempt += 1;
            let (name, url) = self.compose(&mcp, &random_suffix());
            let new_deployment = NewDeployment {
                user_id: owner.to_string(),
                mcp_id: mcp.id,
                name,
                url,
                env_vars: env_vars.clone(),
            };
            match self.store.insert(&new_deployment) {
                Ok(deployment) => break deployment,
                Err(MarketplaceError::Conflict(msg)) if attempt < MAX_URL_ATTEMPTS => {
                    warn!("{}, retrying with a new suffix", msg);
                }
                Err(MarketplaceError::Conflict(msg)) => {
                    return Err(anyhow::anyhow!(msg)
                        .context("Failed to create deployment")
                        .into())
                }
                Err(MarketplaceError::Internal(err)) => {
                    return Err(err.context("Failed to create deployment").into())
                }
                Err(err) => return Err(err),
            }
        };

        if !self
            .catalog
            .increment_deployment_count(mcp.id)
            .context("Failed to create deployment")?
        {
            warn!(
                "Catalog entry {} vanished while deployment {} was created",
                mcp.id, deployment.id
            );
        }

        self.scheduler.schedule(deployment.id);
        metrics::record_deployment_created(&mcp.slug);
        info!(
            "Created deployment {} ({}) for user {}",
            deployment.id, deployment.url, owner
        );
        Ok(deployment)
    }

    /// Sets the status of an owned deployment. `status` is validated before
    /// the row is looked up.
    pub fn set_status(&self, id: i64, caller: &str, status: &str) -> MarketplaceResult<()> {
        let status: DeploymentStatus = status
            .parse()
            .map_err(|_| MarketplaceError::invalid("Invalid status"))?;
        let context = "Failed to update deployment status";
        owned_by(self.store.get(id).context(context)?, caller)?;
        if !self
            .store
            .update_status(id, caller, status)
            .context(context)?
        {
            return Err(MarketplaceError::not_found(DEPLOYMENT_NOT_FOUND));
        }
        metrics::record_status_transition(status.as_str());
        info!("Deployment {} set to {}", id, status);
        Ok(())
    }

    /// Replaces the configuration map of an owned deployment.
    pub fn set_config(&self, id: i64, caller: &str, env_vars: &EnvVars) -> MarketplaceResult<()> {
        let context = "Failed to update environment variables";
        owned_by(self.store.get(id).context(context)?, caller)?;
        if !self
            .store
            .update_env_vars(id, caller, env_vars)
            .context(context)?
        {
            return Err(MarketplaceError::not_found(DEPLOYMENT_NOT_FOUND));
        }
        Ok(())
    }

    pub fn list_for_owner(&self, owner: &str) -> MarketplaceResult<Vec<DeploymentWithMcp>> {
        Ok(self
            .store
            .list_for_owner(owner)
            .context("Failed to fetch deployments")?)
    }

    pub fn get(&self, id: i64, caller: &str) -> MarketplaceResult<Deployment> {
        owned_by(
            self.store.get(id).context("Failed to fetch deployments")?,
            caller,
        )
    }

    pub fn delete(&self, id: i64, caller: &str) -> MarketplaceResult<()> {
        let context = "Failed to delete deployment";
        owned_by(self.store.get(id).context(context)?, caller)?;
        if !self.store.delete(id, caller).context(context)? {
            return Err(MarketplaceError::not_found(DEPLOYMENT_NOT_FOUND));
        }
        info!("Deleted deployment {}", id);
        Ok(())
    }

    pub fn count_by_status(&self) -> anyhow::Result<Vec<(DeploymentStatus, usize)>> {
        self.store.count_by_status()
    }
}
