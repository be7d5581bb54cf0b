//! Catalog entry models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ICON_COLOR: &str = "#3B82F6";

/// Declaration of a configuration key a deployment of this entry may carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarSpec {
    pub key: String,
    pub required: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl EnvVarSpec {
    pub fn required<K: Into<String>, D: Into<String>>(key: K, description: D) -> Self {
        EnvVarSpec {
            key: key.into(),
            required: true,
            description: description.into(),
            default: None,
        }
    }

    pub fn optional<K: Into<String>, D: Into<String>, V: Into<String>>(
        key: K,
        description: D,
        default: V,
    ) -> Self {
        EnvVarSpec {
            key: key.into(),
            required: false,
            description: description.into(),
            default: Some(default.into()),
        }
    }
}

/// A deployable catalog entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServer {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub long_description: Option<String>,
    pub maintainer: String,
    pub maintainer_avatar: Option<String>,
    pub version: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Scaled by 10, so 47 is 4.7 stars.
    pub rating: i64,
    pub deployment_count: i64,
    pub icon: String,
    pub icon_color: String,
    pub featured: bool,
    pub documentation: Option<String>,
    pub screenshots: Vec<String>,
    pub env_vars: Vec<EnvVarSpec>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl McpServer {
    pub fn required_env_keys(&self) -> impl Iterator<Item = &str> {
        self.env_vars
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.key.as_str())
    }

    pub fn summary(&self) -> McpSummary {
        McpSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            maintainer: self.maintainer.clone(),
            version: self.version.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            rating: self.rating,
            deployment_count: self.deployment_count,
            icon: self.icon.clone(),
            icon_color: self.icon_color.clone(),
            featured: self.featured,
            env_vars: self.env_vars.clone(),
        }
    }
}

/// The subset of catalog fields shown next to a deployment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub maintainer: String,
    pub version: String,
    pub category: String,
    pub tags: Vec<String>,
    pub rating: i64,
    pub deployment_count: i64,
    pub icon: String,
    pub icon_color: String,
    pub featured: bool,
    pub env_vars: Vec<EnvVarSpec>,
}

/// Insert payload for a catalog entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMcpServer {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub long_description: Option<String>,
    pub maintainer: String,
    #[serde(default)]
    pub maintainer_avatar: Option<String>,
    pub version: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: i64,
    #[serde(default)]
    pub deployment_count: i64,
    pub icon: String,
    #[serde(default = "default_icon_color")]
    pub icon_color: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub env_vars: Vec<EnvVarSpec>,
}

fn default_icon_color() -> String {
    DEFAULT_ICON_COLOR.to_string()
}
