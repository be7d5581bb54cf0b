//! Default catalog contents, inserted when the catalog is empty.

use super::models::{EnvVarSpec, NewMcpServer};
use super::trait_def::CatalogStore;
use crate::error::MarketplaceResult;
use tracing::info;

#[derive(Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadySeeded,
    Seeded(usize),
}

impl SeedOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SeedOutcome::AlreadySeeded => "MCPs already exist",
            SeedOutcome::Seeded(_) => "Default MCPs created successfully",
        }
    }
}

struct Entry {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    long_description: Option<&'static str>,
    maintainer: &'static str,
    maintainer_avatar: Option<&'static str>,
    version: &'static str,
    category: &'static str,
    tags: &'static [&'static str],
    rating: i64,
    deployment_count: i64,
    icon: &'static str,
    icon_color: &'static str,
    featured: bool,
    documentation: Option<&'static str>,
    env_vars: Vec<EnvVarSpec>,
}

impl From<Entry> for NewMcpServer {
    fn from(e: Entry) -> Self {
        NewMcpServer {
            name: e.name.to_string(),
            slug: e.slug.to_string(),
            description: e.description.to_string(),
            long_description: e.long_description.map(str::to_string),
            maintainer: e.maintainer.to_string(),
            maintainer_avatar: e.maintainer_avatar.map(str::to_string),
            version: e.version.to_string(),
            category: e.category.to_string(),
            tags: e.tags.iter().map(|t| t.to_string()).collect(),
            rating: e.rating,
            deployment_count: e.deployment_count,
            icon: e.icon.to_string(),
            icon_color: e.icon_color.to_string(),
            featured: e.featured,
            documentation: e.documentation.map(str::to_string),
            screenshots: vec![],
            env_vars: e.env_vars,
        }
    }
}

pub fn default_catalog() -> Vec<NewMcpServer> {
    vec![
        Entry {
            name: "PostgreSQL MCP",
            slug: "postgresql-mcp",
            description: "Connect to PostgreSQL databases with full query support, schema introspection, and connection pooling.",
            long_description: Some("The PostgreSQL MCP provides comprehensive database connectivity for PostgreSQL instances. It supports executing SQL queries, exploring database schemas, managing connections efficiently through connection pooling, and handling transactions safely."),
            maintainer: "PostgreSQL Team",
            maintainer_avatar: Some("https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?ixlib=rb-4.0.3&w=40&h=40&fit=crop&crop=face"),
            version: "1.2.3",
            category: "Database",
            tags: &["database", "sql", "postgresql", "query"],
            rating: 49,
            deployment_count: 2145,
            icon: "DB",
            icon_color: "#0066CC",
            featured: true,
            documentation: Some("# PostgreSQL MCP Documentation\n\nThis MCP provides PostgreSQL database connectivity..."),
            env_vars: vec![
                EnvVarSpec::required("DATABASE_URL", "Connection string for your PostgreSQL database"),
                EnvVarSpec::optional("DB_POOL_SIZE", "Maximum number of database connections in the pool", "10"),
                EnvVarSpec::optional("DB_TIMEOUT", "Database connection timeout in milliseconds", "5000"),
            ],
        },
        Entry {
            name: "Filesystem MCP",
            slug: "filesystem-mcp",
            description: "Secure file system access with read/write operations, directory traversal, and file monitoring.",
            long_description: Some("The Filesystem MCP provides secure and controlled access to file systems with comprehensive file operations, directory management, and real-time file monitoring capabilities."),
            maintainer: "MCP Core",
            maintainer_avatar: None,
            version: "2.1.0",
            category: "File Systems",
            tags: &["filesystem", "files", "storage", "monitoring"],
            rating: 47,
            deployment_count: 1823,
            icon: "FS",
            icon_color: "#0891B2",
            featured: true,
            documentation: None,
            env_vars: vec![
                EnvVarSpec::required("ROOT_PATH", "Root directory for file operations"),
                EnvVarSpec::optional("READONLY_MODE", "Enable read-only mode", "false"),
            ],
        },
        Entry {
            name: "Slack MCP",
            slug: "slack-mcp",
            description: "Integrate with Slack workspaces, send messages, manage channels, and automate workflows.",
            long_description: Some("The Slack MCP enables comprehensive Slack workspace integration with message sending, channel management, user interactions, and workflow automation capabilities."),
            maintainer: "Slack Team",
            maintainer_avatar: None,
            version: "1.5.2",
            category: "Communication",
            tags: &["slack", "messaging", "communication", "automation"],
            rating: 48,
            deployment_count: 945,
            icon: "SL",
            icon_color: "#7C3AED",
            featured: true,
            documentation: None,
            env_vars: vec![
                EnvVarSpec::required("SLACK_BOT_TOKEN", "Slack bot token for API access"),
                EnvVarSpec::required("SLACK_SIGNING_SECRET", "Slack signing secret for webhook verification"),
            ],
        },
        Entry {
            name: "GitHub MCP",
            slug: "github-mcp",
            description: "GitHub repository management and issue tracking integration.",
            long_description: None,
            maintainer: "GitHub",
            maintainer_avatar: None,
            version: "2.0.1",
            category: "Development Tools",
            tags: &["github", "git", "repositories", "issues"],
            rating: 46,
            deployment_count: 756,
            icon: "GH",
            icon_color: "#EF4444",
            featured: false,
            documentation: None,
            env_vars: vec![EnvVarSpec::required("GITHUB_TOKEN", "GitHub personal access token")],
        },
        Entry {
            name: "MySQL MCP",
            slug: "mysql-mcp",
            description: "Connect to MySQL databases with query execution and management.",
            long_description: None,
            maintainer: "Oracle",
            maintainer_avatar: None,
            version: "1.8.5",
            category: "Database",
            tags: &["mysql", "database", "sql"],
            rating: 45,
            deployment_count: 623,
            icon: "MY",
            icon_color: "#3B82F6",
            featured: false,
            documentation: None,
            env_vars: vec![EnvVarSpec::required("MYSQL_CONNECTION_STRING", "MySQL connection string")],
        },
        Entry {
            name: "MongoDB MCP",
            slug: "mongodb-mcp",
            description: "NoSQL database operations with document management and queries.",
            long_description: None,
            maintainer: "MongoDB",
            maintainer_avatar: None,
            version: "1.3.7",
            category: "Database",
            tags: &["mongodb", "nosql", "documents"],
            rating: 44,
            deployment_count: 534,
            icon: "MG",
            icon_color: "#10B981",
            featured: false,
            documentation: None,
            env_vars: vec![EnvVarSpec::required("MONGODB_URI", "MongoDB connection URI")],
        },
    ]
    .into_iter()
    .map(NewMcpServer::from)
    .collect()
}

/// Inserts the default catalog unless the store already holds entries.
pub fn seed_default_catalog(store: &dyn CatalogStore) -> MarketplaceResult<SeedOutcome> {
    match store.create_all_if_empty(&default_catalog())? {
        Some(total) => {
            info!("Seeded catalog with {} default MCPs", total);
            Ok(SeedOutcome::Seeded(total))
        }
        None => Ok(SeedOutcome::AlreadySeeded),
    }
}
