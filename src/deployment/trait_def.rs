//! DeploymentStore trait definition.

use super::models::{Deployment, DeploymentStatus, DeploymentWithMcp, EnvVars, NewDeployment};
use crate::error::MarketplaceResult;
use anyhow::Result;

/// Trait for deployment storage backends.
///
/// Every owner-scoped mutation carries the caller's id into the statement
/// itself, so a row owned by someone else is never touched. Those methods
/// return false when nothing matched.
pub trait DeploymentStore: Send + Sync {
    /// Inserts a row in the `deploying` state.
    /// Fails with `MarketplaceError::Conflict` if the URL is taken.
    fn insert(&self, deployment: &NewDeployment) -> MarketplaceResult<Deployment>;

    fn get(&self, id: i64) -> Result<Option<Deployment>>;

    /// Deployments of `user_id` joined with their catalog entry, newest first.
    fn list_for_owner(&self, user_id: &str) -> Result<Vec<DeploymentWithMcp>>;

    fn update_status(&self, id: i64, user_id: &str, status: DeploymentStatus) -> Result<bool>;

    /// Replaces the whole configuration map.
    fn update_env_vars(&self, id: i64, user_id: &str, env_vars: &EnvVars) -> Result<bool>;

    fn delete(&self, id: i64, user_id: &str) -> Result<bool>;

    /// Moves a deployment to `running` only if it is still `deploying`.
    /// Returns false if the row is gone or its status changed meanwhile.
    fn mark_running_if_deploying(&self, id: i64) -> Result<bool>;

    /// Number of deployments per status, for every status present.
    fn count_by_status(&self) -> Result<Vec<(DeploymentStatus, usize)>>;
}
