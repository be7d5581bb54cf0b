//! Catalog table definition.
//!
//! List-valued fields (tags, screenshots, env var declarations) are kept as
//! JSON text.

use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, DEFAULT_TIMESTAMP};

pub const MCP_TABLE_V_0: Table = Table {
    name: "mcp",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!("long_description", &SqlType::Text),
        sqlite_column!("maintainer", &SqlType::Text, non_null = true),
        sqlite_column!("maintainer_avatar", &SqlType::Text),
        sqlite_column!("version", &SqlType::Text, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!(
            "tags",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "rating",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "deployment_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("icon", &SqlType::Text, non_null = true),
        sqlite_column!(
            "icon_color",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'#3B82F6'")
        ),
        sqlite_column!(
            "featured",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("documentation", &SqlType::Text),
        sqlite_column!(
            "screenshots",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "env_vars",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
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
    indices: &[("idx_mcp_category", "category")],
};
