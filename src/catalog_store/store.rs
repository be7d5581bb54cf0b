//! SQLite-backed catalog store.

use super::models::{McpServer, NewMcpServer};
use super::schema::MCP_TABLE_V_0;
use super::trait_def::CatalogStore;
use super::validation::validate_new_mcp;
use super::FEATURED_LIMIT;
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::marketplace_db::UNICODE_LOWER_FN;
use crate::sqlite_persistence::{datetime_from_column_result, SharedConnection, DEFAULT_TIMESTAMP};
use anyhow::{Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Params, Row};
use serde::de::DeserializeOwned;
use tracing::debug;

pub(crate) const MCP_COLUMNS: &str = "id, name, slug, description, long_description, maintainer, \
     maintainer_avatar, version, category, tags, rating, deployment_count, icon, icon_color, \
     featured, documentation, screenshots, env_vars, created, updated";

const MCP_COLUMNS_COUNT: usize = 20;

const CATALOG_ORDER: &str = "ORDER BY featured DESC, deployment_count DESC, id ASC";

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Reads an `McpServer` from `row`, whose `MCP_COLUMNS` start at `offset`.
pub(crate) fn mcp_from_row_at(row: &Row, offset: usize) -> rusqlite::Result<McpServer> {
    Ok(McpServer {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        slug: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        long_description: row.get(offset + 4)?,
        maintainer: row.get(offset + 5)?,
        maintainer_avatar: row.get(offset + 6)?,
        version: row.get(offset + 7)?,
        category: row.get(offset + 8)?,
        tags: json_column(row, offset + 9)?,
        rating: row.get(offset + 10)?,
        deployment_count: row.get(offset + 11)?,
        icon: row.get(offset + 12)?,
        icon_color: row.get(offset + 13)?,
        featured: row.get(offset + 14)?,
        documentation: row.get(offset + 15)?,
        screenshots: json_column(row, offset + 16)?,
        env_vars: json_column(row, offset + 17)?,
        created_at: datetime_from_column_result(row.get(offset + 18)?),
        updated_at: datetime_from_column_result(row.get(offset + 19)?),
    })
}

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: SharedConnection,
}

impl SqliteCatalogStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteCatalogStore { conn }
    }

    fn query_many<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<McpServer>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| mcp_from_row_at(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn query_one<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Option<McpServer>> {
        Ok(conn
            .query_row(sql, params, |row| mcp_from_row_at(row, 0))
            .optional()?)
    }

    /// Inserts an already validated entry and returns its id.
    fn insert_entry(conn: &Connection, entry: &NewMcpServer) -> MarketplaceResult<i64> {
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} (name, slug, description, long_description, maintainer, \
                 maintainer_avatar, version, category, tags, rating, deployment_count, icon, \
                 icon_color, featured, documentation, screenshots, env_vars) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                MCP_TABLE_V_0.name
            ),
            params![
                entry.name,
                entry.slug,
                entry.description,
                entry.long_description,
                entry.maintainer,
                entry.maintainer_avatar,
                entry.version,
                entry.category,
                serde_json::to_string(&entry.tags).context("Failed to encode tags")?,
                entry.rating,
                entry.deployment_count,
                entry.icon,
                entry.icon_color,
                entry.featured,
                entry.documentation,
                serde_json::to_string(&entry.screenshots).context("Failed to encode screenshots")?,
                serde_json::to_string(&entry.env_vars).context("Failed to encode env vars")?,
            ],
        );
        match inserted {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(MarketplaceError::Conflict(format!(
                "MCP with slug '{}' already exists",
                entry.slug
            ))),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to insert MCP {}", entry.slug))
                .into()),
        }
    }

    fn count_entries(conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", MCP_TABLE_V_0.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl CatalogStore for SqliteCatalogStore {
    fn list_all(&self) -> Result<Vec<McpServer>> {
        let conn = self.conn.lock().unwrap();
        Self::query_many(
            &conn,
            &format!(
                "SELECT {} FROM {} {}",
                MCP_COLUMNS, MCP_TABLE_V_0.name, CATALOG_ORDER
            ),
            [],
        )
    }

    fn list_featured(&self) -> Result<Vec<McpServer>> {
        let conn = self.conn.lock().unwrap();
        Self::query_many(
            &conn,
            &format!(
                "SELECT {} FROM {} WHERE featured = 1 ORDER BY deployment_count DESC, id ASC LIMIT ?1",
                MCP_COLUMNS, MCP_TABLE_V_0.name
            ),
            params![FEATURED_LIMIT as i64],
        )
    }

    fn search(&self, query: &str) -> Result<Vec<McpServer>> {
        debug!("Searching catalog for {:?}", query);
        let conn = self.conn.lock().unwrap();
        Self::query_many(
            &conn,
            &format!(
                "SELECT {columns} FROM {table} \
                 WHERE instr({lower}(name), {lower}(?1)) > 0 \
                    OR instr({lower}(description), {lower}(?1)) > 0 \
                    OR EXISTS (SELECT 1 FROM json_each({table}.tags) WHERE json_each.value = ?1) \
                 {order}",
                columns = MCP_COLUMNS,
                table = MCP_TABLE_V_0.name,
                lower = UNICODE_LOWER_FN,
                order = CATALOG_ORDER
            ),
            params![query],
        )
    }

    fn get_by_slug(&self, slug: &str) -> Result<Option<McpServer>> {
        let conn = self.conn.lock().unwrap();
        Self::query_one(
            &conn,
            &format!(
                "SELECT {} FROM {} WHERE slug = ?1",
                MCP_COLUMNS, MCP_TABLE_V_0.name
            ),
            params![slug],
        )
    }

    fn get_by_id(&self, id: i64) -> Result<Option<McpServer>> {
        let conn = self.conn.lock().unwrap();
        Self::query_one(
            &conn,
            &format!("SELECT {} FROM {} WHERE id = ?1", MCP_COLUMNS, MCP_TABLE_V_0.name),
            params![id],
        )
    }

    fn create(&self, entry: &NewMcpServer) -> MarketplaceResult<McpServer> {
        validate_new_mcp(entry)?;

        let conn = self.conn.lock().unwrap();
        let id = Self::insert_entry(&conn, entry)?;
        Self::query_one(
            &conn,
            &format!("SELECT {} FROM {} WHERE id = ?1", MCP_COLUMNS, MCP_TABLE_V_0.name),
            params![id],
        )?
        .with_context(|| format!("Inserted MCP {} vanished", id))
        .map_err(MarketplaceError::from)
    }

    fn create_all_if_empty(&self, entries: &[NewMcpServer]) -> MarketplaceResult<Option<usize>> {
        for entry in entries {
            validate_new_mcp(entry)?;
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().context("Failed to start seeding")?;
        if Self::count_entries(&tx)? > 0 {
            return Ok(None);
        }
        for entry in entries {
            Self::insert_entry(&tx, entry)?;
        }
        tx.commit().context("Failed to commit seeded MCPs")?;
        Ok(Some(entries.len()))
    }

    fn increment_deployment_count(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET deployment_count = deployment_count + 1, updated = {} WHERE id = ?1",
                MCP_TABLE_V_0.name, DEFAULT_TIMESTAMP
            ),
            params![id],
        )?;
        Ok(updated > 0)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Self::count_entries(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::seed::default_catalog;
    use crate::catalog_store::EnvVarSpec;
    use crate::marketplace_db::open_temp_db;
    use std::sync::Arc;
    use std::thread;

    fn create_tmp_store() -> (SqliteCatalogStore, tempfile::TempDir) {
        let (conn, dir) = open_temp_db();
        (SqliteCatalogStore::new(conn), dir)
    }

    fn create_seeded_store() -> (SqliteCatalogStore, tempfile::TempDir) {
        let (store, dir) = create_tmp_store();
        for entry in default_catalog() {
            store.create(&entry).unwrap();
        }
        (store, dir)
    }

    fn slugs(entries: &[McpServer]) -> Vec<&str> {
        entries.iter().map(|e| e.slug.as_str()).collect()
    }

    #[test]
    fn mcp_columns_count_matches_table() {
        assert_eq!(MCP_TABLE_V_0.columns.len(), MCP_COLUMNS_COUNT);
        assert_eq!(MCP_COLUMNS.split(',').count(), MCP_COLUMNS_COUNT);
    }

    #[test]
    fn lists_featured_first_then_by_deployments() {
        let (store, _dir) = create_seeded_store();

        let all = store.list_all().unwrap();
        assert_eq!(
            slugs(&all),
            vec![
                "postgresql-mcp",
                "filesystem-mcp",
                "slack-mcp",
                "github-mcp",
                "mysql-mcp",
                "mongodb-mcp"
            ]
        );
    }

    #[test]
    fn featured_listing_is_capped() {
        let (store, _dir) = create_seeded_store();
        for i in 0..5 {
            let mut extra = default_catalog().remove(0);
            extra.slug = format!("extra-{}", i);
            extra.deployment_count = i;
            store.create(&extra).unwrap();
        }

        let featured = store.list_featured().unwrap();
        assert_eq!(featured.len(), FEATURED_LIMIT);
        assert!(featured.iter().all(|e| e.featured));
        assert!(featured
            .windows(2)
            .all(|w| w[0].deployment_count >= w[1].deployment_count));
    }

    #[test]
    fn search_matches_name_description_and_tags() {
        let (store, _dir) = create_seeded_store();

        assert_eq!(slugs(&store.search("slack").unwrap()), vec!["slack-mcp"]);
        assert_eq!(slugs(&store.search("SLACK").unwrap()), vec!["slack-mcp"]);
        assert!(store.search("zzz-no-match").unwrap().is_empty());

        // Tag match is exact and case-sensitive.
        assert_eq!(
            slugs(&store.search("automation").unwrap()),
            vec!["slack-mcp"]
        );
        assert!(store.search("AUTOMATION").unwrap().is_empty());

        let databases = store.search("database").unwrap();
        assert_eq!(
            slugs(&databases),
            vec!["postgresql-mcp", "mysql-mcp", "mongodb-mcp"]
        );

        let mut eclair = default_catalog().remove(0);
        eclair.slug = "eclair-mcp".to_string();
        eclair.name = "Éclair MCP".to_string();
        eclair.description = "Pâtisserie ÜBER service".to_string();
        store.create(&eclair).unwrap();
        assert_eq!(slugs(&store.search("éclair").unwrap()), vec!["eclair-mcp"]);
        assert_eq!(slugs(&store.search("ÉCLAIR").unwrap()), vec!["eclair-mcp"]);
        assert_eq!(slugs(&store.search("über").unwrap()), vec!["eclair-mcp"]);
    }

    #[test]
    fn gets_by_slug_and_id() {
        let (store, _dir) = create_seeded_store();

        let slack = store.get_by_slug("slack-mcp").unwrap().unwrap();
        assert_eq!(slack.name, "Slack MCP");
        assert_eq!(
            slack.required_env_keys().collect::<Vec<_>>(),
            vec!["SLACK_BOT_TOKEN", "SLACK_SIGNING_SECRET"]
        );

        let by_id = store.get_by_id(slack.id).unwrap().unwrap();
        assert_eq!(by_id.slug, "slack-mcp");

        assert!(store.get_by_slug("nope").unwrap().is_none());
        assert!(store.get_by_id(9999).unwrap().is_none());
    }

    #[test]
    fn create_round_trips_json_fields() {
        let (store, _dir) = create_tmp_store();
        let mut entry = default_catalog().remove(0);
        entry.screenshots = vec!["https://example.com/1.png".to_string()];

        let created = store.create(&entry).unwrap();
        assert_eq!(created.tags, entry.tags);
        assert_eq!(created.screenshots, entry.screenshots);
        assert_eq!(created.env_vars.len(), 3);
        assert_eq!(
            created.env_vars[1],
            EnvVarSpec::optional(
                "DB_POOL_SIZE",
                "Maximum number of database connections in the pool",
                "10"
            )
        );
        assert!(created.featured);
    }

    #[test]
    fn duplicate_slug_is_a_conflict() {
        let (store, _dir) = create_tmp_store();
        let entry = default_catalog().remove(0);
        store.create(&entry).unwrap();

        let result = store.create(&entry);
        assert!(matches!(result, Err(MarketplaceError::Conflict(_))));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn invalid_entry_is_rejected_before_insert() {
        let (store, _dir) = create_tmp_store();
        let mut entry = default_catalog().remove(0);
        entry.slug = "Not A Slug".to_string();

        assert!(matches!(
            store.create(&entry),
            Err(MarketplaceError::Validation { .. })
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let (store, _dir) = create_seeded_store();
        let store = Arc::new(store);
        let github = store.get_by_slug("github-mcp").unwrap().unwrap();

        let handles = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        assert!(store.increment_deployment_count(github.id).unwrap());
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let after = store.get_by_id(github.id).unwrap().unwrap();
        assert_eq!(after.deployment_count, github.deployment_count + 200);
    }

    #[test]
    fn increment_of_missing_entry_reports_false() {
        let (store, _dir) = create_tmp_store();
        assert!(!store.increment_deployment_count(42).unwrap());
    }
}
