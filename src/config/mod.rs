mod file_config;

pub use file_config::FileConfig;

use crate::deployment::{DEFAULT_DEPLOYMENT_DOMAIN, DEFAULT_PROVISIONING_DELAY};
use crate::marketplace_db::DB_FILE_NAME;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings as given on the command line, before the config file is applied.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub deployment_domain: String,
    pub provisioning_delay_ms: u64,
    pub seed_catalog: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            frontend_dir_path: None,
            deployment_domain: DEFAULT_DEPLOYMENT_DOMAIN.to_string(),
            provisioning_delay_ms: DEFAULT_PROVISIONING_DELAY.as_millis() as u64,
            seed_catalog: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,

    pub deployment_domain: String,
    pub provisioning_delay: Duration,
    pub seed_catalog: bool,
}

impl AppConfig {
    /// Merges command line settings with the optional config file. A value
    /// present in the file wins over the command line one.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = match file.db_dir.map(PathBuf::from) {
            Some(dir) => dir,
            None => cli
                .db_dir
                .clone()
                .context("db_dir must be specified via --db-dir or in config file")?,
        };
        check_db_dir(&db_dir)?;

        let deployment_domain = file
            .deployment_domain
            .as_deref()
            .unwrap_or(&cli.deployment_domain)
            .trim()
            .trim_matches('.')
            .to_string();
        if deployment_domain.is_empty() {
            bail!("deployment_domain cannot be empty");
        }

        let logging_level = match file.logging_level.as_deref() {
            Some(name) => parse_logging_level(name).with_context(|| {
                format!(
                    "Invalid logging_level {:?} in config file, expected one of none, path, headers, body",
                    name
                )
            })?,
            None => cli.logging_level.clone(),
        };

        Ok(Self {
            db_dir,
            port: file.port.unwrap_or(cli.port),
            metrics_port: file.metrics_port.unwrap_or(cli.metrics_port),
            logging_level,
            frontend_dir_path: file
                .frontend_dir_path
                .or_else(|| cli.frontend_dir_path.clone()),
            deployment_domain,
            provisioning_delay: Duration::from_millis(
                file.provisioning_delay_ms
                    .unwrap_or(cli.provisioning_delay_ms),
            ),
            seed_catalog: file.seed_catalog.unwrap_or(cli.seed_catalog),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join(DB_FILE_NAME)
    }
}

fn check_db_dir(db_dir: &Path) -> Result<()> {
    if !db_dir.exists() {
        bail!("Database directory does not exist: {:?}", db_dir);
    }
    if !db_dir.is_dir() {
        bail!("db_dir is not a directory: {:?}", db_dir);
    }
    Ok(())
}

/// Case-insensitive, same names as the `--logging-level` flag.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_for(dir: &TempDir) -> CliConfig {
        CliConfig {
            db_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    fn resolve_err(cli: &CliConfig, file: Option<FileConfig>) -> String {
        AppConfig::resolve(cli, file).unwrap_err().to_string()
    }

    #[test]
    fn logging_level_names_are_case_insensitive() {
        assert_eq!(parse_logging_level("none"), Some(RequestsLoggingLevel::None));
        assert_eq!(
            parse_logging_level("Headers"),
            Some(RequestsLoggingLevel::Headers)
        );
        assert_eq!(parse_logging_level("BODY"), Some(RequestsLoggingLevel::Body));
        assert_eq!(parse_logging_level("verbose"), None);
    }

    #[test]
    fn command_line_values_are_used_without_file() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            port: 8080,
            metrics_port: 9000,
            logging_level: RequestsLoggingLevel::Headers,
            frontend_dir_path: Some("/srv/www".to_string()),
            deployment_domain: "deploy.test".to_string(),
            provisioning_delay_ms: 10,
            seed_catalog: true,
            ..cli_for(&dir)
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_dir, dir.path());
        assert_eq!(config.port, 8080);
        assert_eq!(config.metrics_port, 9000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.frontend_dir_path.as_deref(), Some("/srv/www"));
        assert_eq!(config.deployment_domain, "deploy.test");
        assert_eq!(config.provisioning_delay, Duration::from_millis(10));
        assert!(config.seed_catalog);
    }

    #[test]
    fn defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_for(&dir), None).unwrap();

        assert_eq!(config.port, 3001);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Path);
        assert_eq!(config.deployment_domain, "mcpmarket.dev");
        assert_eq!(config.provisioning_delay, Duration::from_secs(2));
        assert!(!config.seed_catalog);
        assert_eq!(config.db_path(), dir.path().join("marketplace.db"));
    }

    #[test]
    fn file_values_win() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/not/used")),
            port: 5000,
            ..Default::default()
        };
        let file = FileConfig {
            db_dir: Some(dir.path().display().to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            deployment_domain: Some("toml.test.".to_string()),
            provisioning_delay_ms: Some(250),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();

        assert_eq!(config.db_dir, dir.path());
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.deployment_domain, "toml.test");
        assert_eq!(config.provisioning_delay, Duration::from_millis(250));
        // not in the file
        assert_eq!(config.metrics_port, 9091);
    }

    #[test]
    fn unknown_file_logging_level_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = FileConfig {
            logging_level: Some("loud".to_string()),
            ..Default::default()
        };

        let err = resolve_err(&cli_for(&dir), Some(file));
        assert!(err.contains("Invalid logging_level \"loud\""));
    }

    #[test]
    fn db_dir_errors() {
        assert!(resolve_err(&CliConfig::default(), None).contains("db_dir must be specified"));

        let missing = CliConfig {
            db_dir: Some(PathBuf::from("/definitely/not/a/real/dir")),
            ..Default::default()
        };
        assert!(resolve_err(&missing, None).contains("does not exist"));

        let file = tempfile::NamedTempFile::new().unwrap();
        let not_dir = CliConfig {
            db_dir: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(resolve_err(&not_dir, None).contains("not a directory"));
    }

    #[test]
    fn blank_domain_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = FileConfig {
            deployment_domain: Some(" . ".to_string()),
            ..Default::default()
        };
        assert!(resolve_err(&cli_for(&dir), Some(file)).contains("deployment_domain"));
    }
}
