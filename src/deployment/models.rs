//! Deployment models.

use crate::catalog_store::McpSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Configuration supplied for a deployment, key to value.
pub type EnvVars = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Deploying,
    Running,
    Stopped,
    Error,
}

impl DeploymentStatus {
    pub const ALL: [DeploymentStatus; 4] = [
        DeploymentStatus::Deploying,
        DeploymentStatus::Running,
        DeploymentStatus::Stopped,
        DeploymentStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Stopped => "stopped",
            DeploymentStatus::Error => "error",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown deployment status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for DeploymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeploymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: i64,
    pub user_id: String,
    pub mcp_id: i64,
    pub name: String,
    pub url: String,
    pub status: DeploymentStatus,
    pub env_vars: EnvVars,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A deployment joined with the catalog entry it instantiates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentWithMcp {
    #[serde(flatten)]
    pub deployment: Deployment,
    pub mcp: McpSummary,
}

/// Row to insert, as produced by the lifecycle controller.
#[derive(Clone, Debug)]
pub struct NewDeployment {
    pub user_id: String,
    pub mcp_id: i64,
    pub name: String,
    pub url: String,
    pub env_vars: EnvVars,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_known_statuses() {
        for status in DeploymentStatus::ALL {
            assert_eq!(status.as_str().parse::<DeploymentStatus>(), Ok(status));
        }
        assert_eq!(
            "Running".parse::<DeploymentStatus>(),
            Err(UnknownStatus("Running".to_string()))
        );
        assert!("paused".parse::<DeploymentStatus>().is_err());
    }

    #[test]
    fn serializes_status_lowercase() {
        assert_eq!(
            serde_json::to_value(DeploymentStatus::Deploying).unwrap(),
            serde_json::json!("deploying")
        );
    }
}
