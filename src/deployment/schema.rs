//! Deployment table definitions.

use crate::sqlite_column;
use crate::sqlite_persistence::{ForeignKey, ForeignKeyOnChange, SqlType, Table, DEFAULT_TIMESTAMP};

/// V 0
pub const DEPLOYMENT_TABLE_V_0: Table = Table {
    name: "deployment",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "mcp_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "mcp",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::NoAction,
            })
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'deploying'")
        ),
        sqlite_column!(
            "env_vars",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'{}'")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};

/// V 1: per-owner listing index.
pub const DEPLOYMENT_TABLE_V_1: Table = Table {
    name: DEPLOYMENT_TABLE_V_0.name,
    columns: DEPLOYMENT_TABLE_V_0.columns,
    indices: &[("idx_deployment_user_id", "user_id")],
};
