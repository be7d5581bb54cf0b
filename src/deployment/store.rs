//! SQLite-backed deployment store.

use super::models::{Deployment, DeploymentStatus, DeploymentWithMcp, EnvVars, NewDeployment};
use super::schema::DEPLOYMENT_TABLE_V_0;
use super::trait_def::DeploymentStore;
use crate::catalog_store::{mcp_from_row_at, MCP_COLUMNS};
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::sqlite_persistence::{datetime_from_column_result, SharedConnection, DEFAULT_TIMESTAMP};
use anyhow::{Context, Result};
use rusqlite::{params, types::Type, OptionalExtension, Row};
use tracing::debug;

const DEPLOYMENT_COLUMNS: &str = "id, user_id, mcp_id, name, url, status, env_vars, created, updated";
const DEPLOYMENT_COLUMNS_COUNT: usize = 9;

fn prefixed_columns(prefix: &str, columns: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", prefix, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn status_column(row: &Row, idx: usize) -> rusqlite::Result<DeploymentStatus> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn env_vars_column(row: &Row, idx: usize) -> rusqlite::Result<EnvVars> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn deployment_from_row(row: &Row) -> rusqlite::Result<Deployment> {
    Ok(Deployment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        mcp_id: row.get(2)?,
        name: row.get(3)?,
        url: row.get(4)?,
        status: status_column(row, 5)?,
        env_vars: env_vars_column(row, 6)?,
        created_at: datetime_from_column_result(row.get(7)?),
        updated_at: datetime_from_column_result(row.get(8)?),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[derive(Clone)]
pub struct SqliteDeploymentStore {
    conn: SharedConnection,
}

impl SqliteDeploymentStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteDeploymentStore { conn }
    }
}

impl DeploymentStore for SqliteDeploymentStore {
    fn insert(&self, deployment: &NewDeployment) -> MarketplaceResult<Deployment> {
        let env_vars =
            serde_json::to_string(&deployment.env_vars).context("Failed to encode env vars")?;
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} (user_id, mcp_id, name, url, status, env_vars) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                DEPLOYMENT_TABLE_V_0.name
            ),
            params![
                deployment.user_id,
                deployment.mcp_id,
                deployment.name,
                deployment.url,
                DeploymentStatus::Deploying.as_str(),
                env_vars
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(MarketplaceError::Conflict(format!(
                    "Deployment URL {} already exists",
                    deployment.url
                )));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context("Failed to insert deployment")
                    .into())
            }
        }

        let id = conn.last_insert_rowid();
        debug!("Inserted deployment {} for user {}", id, deployment.user_id);
        let created = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    DEPLOYMENT_COLUMNS, DEPLOYMENT_TABLE_V_0.name
                ),
                params![id],
                deployment_from_row,
            )
            .context("Failed to read back inserted deployment")?;
        Ok(created)
    }

    fn get(&self, id: i64) -> Result<Option<Deployment>> {
        let conn = self.conn.lock().unwrap();
        let deployment = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    DEPLOYMENT_COLUMNS, DEPLOYMENT_TABLE_V_0.name
                ),
                params![id],
                deployment_from_row,
            )
            .optional()?;
        Ok(deployment)
    }

    fn list_for_owner(&self, user_id: &str) -> Result<Vec<DeploymentWithMcp>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {} FROM {} d JOIN mcp m ON m.id = d.mcp_id \
             WHERE d.user_id = ?1 ORDER BY d.created DESC, d.id DESC",
            prefixed_columns("d", DEPLOYMENT_COLUMNS),
            prefixed_columns("m", MCP_COLUMNS),
            DEPLOYMENT_TABLE_V_0.name
        ))?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                let deployment = deployment_from_row(row)?;
                let mcp = mcp_from_row_at(row, DEPLOYMENT_COLUMNS_COUNT)?;
                Ok(DeploymentWithMcp {
                    deployment,
                    mcp: mcp.summary(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn update_status(&self, id: i64, user_id: &str, status: DeploymentStatus) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET status = ?1, updated = {} WHERE id = ?2 AND user_id = ?3",
                DEPLOYMENT_TABLE_V_0.name, DEFAULT_TIMESTAMP
            ),
            params![status.as_str(), id, user_id],
        )?;
        Ok(updated > 0)
    }

    fn update_env_vars(&self, id: i64, user_id: &str, env_vars: &EnvVars) -> Result<bool> {
        let encoded = serde_json::to_string(env_vars)?;
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET env_vars = ?1, updated = {} WHERE id = ?2 AND user_id = ?3",
                DEPLOYMENT_TABLE_V_0.name, DEFAULT_TIMESTAMP
            ),
            params![encoded, id, user_id],
        )?;
        Ok(updated > 0)
    }

    fn delete(&self, id: i64, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE id = ?1 AND user_id = ?2",
                DEPLOYMENT_TABLE_V_0.name
            ),
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    fn mark_running_if_deploying(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET status = ?1, updated = {} WHERE id = ?2 AND status = ?3",
                DEPLOYMENT_TABLE_V_0.name, DEFAULT_TIMESTAMP
            ),
            params![
                DeploymentStatus::Running.as_str(),
                id,
                DeploymentStatus::Deploying.as_str()
            ],
        )?;
        Ok(updated > 0)
    }

    fn count_by_status(&self) -> Result<Vec<(DeploymentStatus, usize)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT status, COUNT(*) FROM {} GROUP BY status ORDER BY status",
            DEPLOYMENT_TABLE_V_0.name
        ))?;
        let counts = stmt
            .query_map([], |row| {
                Ok((status_column(row, 0)?, row.get::<usize, i64>(1)? as usize))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{seed_default_catalog, CatalogStore, SqliteCatalogStore};
    use crate::marketplace_db::open_temp_db;
    use crate::user::{NewUser, SqliteUserStore, UserStore};

    struct Fixture {
        store: SqliteDeploymentStore,
        catalog: SqliteCatalogStore,
        _dir: tempfile::TempDir,
    }

    fn create_fixture() -> Fixture {
        let (conn, dir) = open_temp_db();
        let users = SqliteUserStore::new(conn.clone());
        users
            .create_user("alice", &NewUser::with_email("alice@example.com"))
            .unwrap();
        users
            .create_user("bob", &NewUser::with_email("bob@example.com"))
            .unwrap();
        let catalog = SqliteCatalogStore::new(conn.clone());
        seed_default_catalog(&catalog).unwrap();
        Fixture {
            store: SqliteDeploymentStore::new(conn),
            catalog,
            _dir: dir,
        }
    }

    fn new_deployment(user_id: &str, mcp_id: i64, url: &str) -> NewDeployment {
        NewDeployment {
            user_id: user_id.to_string(),
            mcp_id,
            name: "Test - abc123".to_string(),
            url: url.to_string(),
            env_vars: EnvVars::from([("A".to_string(), "1".to_string())]),
        }
    }

    fn slack_id(catalog: &SqliteCatalogStore) -> i64 {
        catalog.get_by_slug("slack-mcp").unwrap().unwrap().id
    }

    #[test]
    fn deployment_columns_count_matches_table() {
        assert_eq!(DEPLOYMENT_COLUMNS.split(',').count(), DEPLOYMENT_COLUMNS_COUNT);
        assert_eq!(DEPLOYMENT_TABLE_V_0.columns.len(), DEPLOYMENT_COLUMNS_COUNT);
    }

    #[test]
    fn inserts_in_deploying_state() {
        let f = create_fixture();
        let mcp_id = slack_id(&f.catalog);
        let created = f
            .store
            .insert(&new_deployment("alice", mcp_id, "https://a.test"))
            .unwrap();
        assert_eq!(created.status, DeploymentStatus::Deploying);
        assert_eq!(created.env_vars.get("A").map(String::as_str), Some("1"));
        assert_eq!(f.store.get(created.id).unwrap(), Some(created));
    }

    #[test]
    fn duplicate_url_is_a_conflict() {
        let f = create_fixture();
        let mcp_id = slack_id(&f.catalog);
        f.store
            .insert(&new_deployment("alice", mcp_id, "https://a.test"))
            .unwrap();
        let result = f
            .store
            .insert(&new_deployment("bob", mcp_id, "https://a.test"));
        assert!(matches!(result, Err(MarketplaceError::Conflict(_))));
    }

    #[test]
    fn insert_requires_existing_owner_and_entry() {
        let f = create_fixture();
        let mcp_id = slack_id(&f.catalog);
        assert!(f
            .store
            .insert(&new_deployment("mallory", mcp_id, "https://a.test"))
            .is_err());
        assert!(f
            .store
            .insert(&new_deployment("alice", 9999, "https://b.test"))
            .is_err());
    }

    #[test]
    fn lists_only_owned_rows_newest_first_with_catalog_summary() {
        let f = create_fixture();
        let mcp_id = slack_id(&f.catalog);
        let first = f
            .store
            .insert(&new_deployment("alice", mcp_id, "https://1.test"))
            .unwrap();
        let second = f
            .store
            .insert(&new_deployment("alice", mcp_id, "https://2.test"))
            .unwrap();
        f.store
            .insert(&new_deployment("bob", mcp_id, "https://3.test"))
            .unwrap();

        let listed = f.store.list_for_owner("alice").unwrap();
        let ids: Vec<i64> = listed.iter().map(|d| d.deployment.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(listed.iter().all(|d| d.deployment.user_id == "alice"));
        assert_eq!(listed[0].mcp.slug, "slack-mcp");
        assert_eq!(listed[0].mcp.id, mcp_id);

        assert_eq!(f.store.list_for_owner("bob").unwrap().len(), 1);
        assert!(f.store.list_for_owner("nobody").unwrap().is_empty());
    }

    #[test]
    fn owner_scoped_mutations_ignore_other_users() {
        let f = create_fixture();
        let mcp_id = slack_id(&f.catalog);
        let created = f
            .store
            .insert(&new_deployment("alice", mcp_id, "https://a.test"))
            .unwrap();

        assert!(!f
            .store
            .update_status(created.id, "bob", DeploymentStatus::Stopped)
            .unwrap());
        assert!(!f
            .store
            .update_env_vars(created.id, "bob", &EnvVars::new())
            .unwrap());
        assert!(!f.store.delete(created.id, "bob").unwrap());
        assert_eq!(f.store.get(created.id).unwrap(), Some(created.clone()));

        assert!(f
            .store
            .update_status(created.id, "alice", DeploymentStatus::Stopped)
            .unwrap());
        let replaced = EnvVars::from([("B".to_string(), "2".to_string())]);
        assert!(f
            .store
            .update_env_vars(created.id, "alice", &replaced)
            .unwrap());
        let updated = f.store.get(created.id).unwrap().unwrap();
        assert_eq!(updated.status, DeploymentStatus::Stopped);
        assert_eq!(updated.env_vars, replaced);

        assert!(f.store.delete(created.id, "alice").unwrap());
        assert!(f.store.get(created.id).unwrap().is_none());
    }

    #[test]
    fn conditional_transition_only_applies_to_deploying_rows() {
        let f = create_fixture();
        let mcp_id = slack_id(&f.catalog);
        let a = f
            .store
            .insert(&new_deployment("alice", mcp_id, "https://a.test"))
            .unwrap();
        let b = f
            .store
            .insert(&new_deployment("alice", mcp_id, "https://b.test"))
            .unwrap();

        f.store
            .update_status(b.id, "alice", DeploymentStatus::Error)
            .unwrap();

        assert!(f.store.mark_running_if_deploying(a.id).unwrap());
        assert!(!f.store.mark_running_if_deploying(a.id).unwrap());
        assert!(!f.store.mark_running_if_deploying(b.id).unwrap());
        assert!(!f.store.mark_running_if_deploying(424242).unwrap());

        assert_eq!(
            f.store.get(b.id).unwrap().unwrap().status,
            DeploymentStatus::Error
        );
        assert_eq!(
            f.store.count_by_status().unwrap(),
            vec![(DeploymentStatus::Error, 1), (DeploymentStatus::Running, 1)]
        );
    }
}
