//! Test fixtures: a temporary marketplace database with known users.

use super::constants::*;
use anyhow::Result;
use mcp_marketplace_server::catalog_store::{seed_default_catalog, SqliteCatalogStore};
use mcp_marketplace_server::marketplace_db::DB_FILE_NAME;
use mcp_marketplace_server::sqlite_persistence::SharedConnection;
use mcp_marketplace_server::user::NewUser;
use mcp_marketplace_server::{open_marketplace_db, SqliteUserStore, UserManager};
use tempfile::TempDir;

/// Creates a database holding the two test users, optionally with the
/// default catalog already seeded.
pub fn create_test_db_with_users(seed: bool) -> Result<(TempDir, SharedConnection)> {
    let temp_dir = TempDir::new()?;
    let conn = open_marketplace_db(temp_dir.path().join(DB_FILE_NAME))?;

    let user_manager = UserManager::new(Box::new(SqliteUserStore::new(conn.clone())));
    for (email, password) in [(TEST_USER_EMAIL, TEST_PASS), (OTHER_USER_EMAIL, OTHER_PASS)] {
        user_manager.add_user(NewUser {
            first_name: Some("Test".to_string()),
            ..NewUser::with_email(email)
        })?;
        user_manager.create_password_credentials(email, password)?;
    }

    if seed {
        seed_default_catalog(&SqliteCatalogStore::new(conn.clone()))?;
    }

    Ok((temp_dir, conn))
}
