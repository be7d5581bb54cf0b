//! Versioned schema of the marketplace database and its opener.

use crate::catalog_store::MCP_TABLE_V_0;
use crate::deployment::{DEPLOYMENT_TABLE_V_0, DEPLOYMENT_TABLE_V_1};
use crate::sqlite_persistence::{open_versioned_db, SharedConnection, VersionedSchema};
use crate::user::{AUTH_TOKEN_TABLE_V_0, USER_PASSWORD_CREDENTIALS_V_0, USER_TABLE_V_0};
use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const DB_FILE_NAME: &str = "marketplace.db";

pub const MARKETPLACE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            USER_TABLE_V_0,
            USER_PASSWORD_CREDENTIALS_V_0,
            AUTH_TOKEN_TABLE_V_0,
            MCP_TABLE_V_0,
            DEPLOYMENT_TABLE_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            USER_TABLE_V_0,
            USER_PASSWORD_CREDENTIALS_V_0,
            AUTH_TOKEN_TABLE_V_0,
            MCP_TABLE_V_0,
            DEPLOYMENT_TABLE_V_1,
        ],
        migration: Some(|conn: &Connection| {
            DEPLOYMENT_TABLE_V_1.create_index(conn, "idx_deployment_user_id", "user_id")
        }),
    },
];

/// SQL name of the Unicode-aware lowercase function. The builtin `lower()`
/// only folds ASCII.
pub const UNICODE_LOWER_FN: &str = "unicode_lower";

fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|s| s.to_lowercase()))
        },
    )
    .context("Failed to register SQL functions")
}

/// Opens the marketplace database, creating or migrating it as needed.
pub fn open_marketplace_db<T: AsRef<Path>>(db_path: T) -> Result<SharedConnection> {
    let conn = open_versioned_db(db_path, MARKETPLACE_VERSIONED_SCHEMAS)?;
    register_functions(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

#[cfg(test)]
pub fn open_temp_db() -> (SharedConnection, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let conn = open_marketplace_db(temp_dir.path().join(DB_FILE_NAME)).unwrap();
    (conn, temp_dir)
}
