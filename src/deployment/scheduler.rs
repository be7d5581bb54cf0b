//! Simulated provisioning: flips a fresh deployment to `running` after a
//! fixed delay.

use super::models::DeploymentStatus;
use super::trait_def::DeploymentStore;
use crate::server::metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub const DEFAULT_PROVISIONING_DELAY: Duration = Duration::from_millis(2000);

#[derive(Clone)]
pub struct ProvisioningScheduler {
    store: Arc<dyn DeploymentStore>,
    delay: Duration,
}

impl ProvisioningScheduler {
    pub fn new(store: Arc<dyn DeploymentStore>, delay: Duration) -> Self {
        Self { store, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Spawns the delayed `deploying -> running` transition for `deployment_id`.
    ///
    /// The task is not tracked. It performs a conditional update, so a row
    /// deleted or moved to another status in the meantime is left alone.
    pub fn schedule(&self, deployment_id: i64) -> JoinHandle<()> {
        let store = self.store.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result =
                tokio::task::spawn_blocking(move || store.mark_running_if_deploying(deployment_id))
                    .await;
            match result {
                Ok(Ok(true)) => {
                    info!("Deployment {} is now running", deployment_id);
                    metrics::record_status_transition(DeploymentStatus::Running.as_str());
                }
                Ok(Ok(false)) => {
                    debug!(
                        "Deployment {} was deleted or changed status before provisioning completed",
                        deployment_id
                    );
                }
                Ok(Err(err)) => {
                    error!(
                        "Failed to mark deployment {} as running: {:#}",
                        deployment_id, err
                    );
                }
                Err(err) => {
                    error!(
                        "Provisioning task for deployment {} panicked: {}",
                        deployment_id, err
                    );
                }
            }
        })
    }
}
