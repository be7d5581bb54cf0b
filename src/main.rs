use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mcp_marketplace_server::catalog_store::{seed_default_catalog, CatalogStore};
use mcp_marketplace_server::config;
use mcp_marketplace_server::deployment::{DeploymentStore, DEFAULT_DEPLOYMENT_DOMAIN};
use mcp_marketplace_server::server::{metrics, ServerConfig};
use mcp_marketplace_server::{
    open_marketplace_db, run_server, DeploymentManager, ProvisioningScheduler,
    RequestsLoggingLevel, SqliteCatalogStore, SqliteDeploymentStore, SqliteUserStore, UserManager,
};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing the marketplace database.
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Domain under which deployment URLs are generated.
    #[clap(long, default_value = DEFAULT_DEPLOYMENT_DOMAIN)]
    pub deployment_domain: String,

    /// Milliseconds before a new deployment is marked as running.
    #[clap(long, default_value_t = 2000)]
    pub provisioning_delay_ms: u64,

    /// Insert the default catalog at startup if the catalog is empty.
    #[clap(long)]
    pub seed_catalog: bool,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            deployment_domain: args.deployment_domain.clone(),
            provisioning_delay_ms: args.provisioning_delay_ms,
            seed_catalog: args.seed_catalog,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  port: {}", app_config.port);
    info!("  deployment_domain: {}", app_config.deployment_domain);
    info!("  provisioning_delay: {:?}", app_config.provisioning_delay);

    if !app_config.db_path().exists() {
        info!("Creating new database at {:?}", app_config.db_path());
    }
    let conn = open_marketplace_db(app_config.db_path())?;

    let catalog_store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::new(conn.clone()));
    if app_config.seed_catalog {
        let outcome = seed_default_catalog(catalog_store.as_ref())?;
        info!("{}", outcome.message());
    }

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::set_catalog_entries(catalog_store.count()?);

    let deployment_store: Arc<dyn DeploymentStore> =
        Arc::new(SqliteDeploymentStore::new(conn.clone()));
    let scheduler =
        ProvisioningScheduler::new(deployment_store.clone(), app_config.provisioning_delay);
    let deployment_manager = Arc::new(DeploymentManager::new(
        catalog_store.clone(),
        deployment_store,
        scheduler,
        app_config.deployment_domain.clone(),
    ));

    let user_manager = UserManager::new(Box::new(SqliteUserStore::new(conn)));

    run_server(
        ServerConfig::from(&app_config),
        catalog_store,
        deployment_manager,
        user_manager,
    )
    .await
}
