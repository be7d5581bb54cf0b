use crate::sqlite_column;
use crate::sqlite_persistence::{
    datetime_from_column_result, system_time_from_column_result, ForeignKey, ForeignKeyOnChange,
    SharedConnection, SqlType, Table, DEFAULT_TIMESTAMP,
};
use crate::user::*;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;
use tracing::debug;

use super::auth::MarketplaceHasher;

/// V 0
pub const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("first_name", &SqlType::Text),
        sqlite_column!("last_name", &SqlType::Text),
        sqlite_column!("profile_image_url", &SqlType::Text),
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
    indices: &[("idx_user_email", "email")],
};
pub const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
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
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[("idx_auth_token_value", "value")],
};
pub const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[],
};

/// User, credential and token storage on the shared marketplace database.
#[derive(Clone)]
pub struct SqliteUserStore {
    conn: SharedConnection,
}

impl SqliteUserStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteUserStore { conn }
    }
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        profile_image_url: row.get(4)?,
        created_at: datetime_from_column_result(row.get(5)?),
        updated_at: datetime_from_column_result(row.get(6)?),
    })
}

fn auth_token_from_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        user_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        created: system_time_from_column_result(row.get(2)?),
        last_used: row
            .get::<usize, Option<i64>>(3)?
            .map(system_time_from_column_result),
    })
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_id: &str, user: &NewUser) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (id, email, first_name, last_name, profile_image_url) VALUES (?1, ?2, ?3, ?4, ?5)",
                USER_TABLE_V_0.name
            ),
            params![
                user_id,
                user.email,
                user.first_name,
                user.last_name,
                user.profile_image_url
            ],
        )
        .with_context(|| format!("Failed to create user {}", user.email))?;
        Ok(())
    }

    fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                &format!(
                    "SELECT id, email, first_name, last_name, profile_image_url, created, updated FROM {} WHERE id = ?1",
                    USER_TABLE_V_0.name
                ),
                params![user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user_id(&self, email: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let user_id = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE email = ?1", USER_TABLE_V_0.name),
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    fn get_all_user_emails(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT email FROM {} ORDER BY email",
            USER_TABLE_V_0.name
        ))?;
        let emails = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(emails)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let token = conn
            .query_row(
                "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![value.0],
                auth_token_from_row,
            )
            .optional()?;
        Ok(token)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let Some(token) = self.get_user_auth_token(token)? else {
            return Ok(None);
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM auth_token WHERE value = ?1",
            params![token.value.0],
        )?;
        Ok(Some(token))
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE auth_token SET last_used = {} WHERE value = ?1",
                DEFAULT_TIMESTAMP
            ),
            params![token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (value, user_id) VALUES (?1, ?2)",
            params![token.value.0, token.user_id],
        )?;
        Ok(())
    }

    fn get_all_user_auth_tokens(&self, email: &str) -> Result<Vec<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, value, created, last_used FROM auth_token WHERE user_id = (SELECT id FROM user WHERE email = ?1)",
        )?;
        let tokens = stmt
            .query_map(params![email], auth_token_from_row)?
            .collect::<Result<Vec<AuthToken>, _>>()?;
        Ok(tokens)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, email: &str) -> Result<Option<UserAuthCredentials>> {
        let Some(user_id) = self.get_user_id(email)? else {
            return Ok(None);
        };
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                "SELECT user_id, salt, hash, hasher, created, last_tried, last_used FROM user_password_credentials WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<usize, String>(0)?,
                        row.get::<usize, String>(1)?,
                        row.get::<usize, String>(2)?,
                        row.get::<usize, String>(3)?,
                        row.get::<usize, i64>(4)?,
                        row.get::<usize, Option<i64>>(5)?,
                        row.get::<usize, Option<i64>>(6)?,
                    ))
                },
            )
            .optional()?;

        let username_password = match raw {
            Some((user_id, salt, hash, hasher, created, last_tried, last_used)) => {
                Some(UsernamePasswordCredentials {
                    user_id,
                    salt,
                    hash,
                    hasher: MarketplaceHasher::from_str(&hasher)?,
                    created: system_time_from_column_result(created),
                    last_tried: last_tried.map(system_time_from_column_result),
                    last_used: last_used.map(system_time_from_column_result),
                })
            }
            None => None,
        };

        Ok(Some(UserAuthCredentials {
            user_id,
            username_password,
        }))
    }

    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let user_id = credentials.user_id;
        match credentials.username_password.as_ref() {
            Some(password_credentials) => {
                let updated = conn.execute(
                    "UPDATE user_password_credentials SET salt = ?1, hash = ?2, hasher = ?3 WHERE user_id = ?4",
                    params![
                        password_credentials.salt,
                        password_credentials.hash,
                        password_credentials.hasher.to_string(),
                        user_id
                    ],
                )?;
                if updated == 0 {
                    conn.execute(
                        "INSERT INTO user_password_credentials (salt, hash, hasher, user_id) VALUES (?1, ?2, ?3, ?4)",
                        params![
                            password_credentials.salt,
                            password_credentials.hash,
                            password_credentials.hasher.to_string(),
                            user_id
                        ],
                    )?;
                }
            }
            None => {
                debug!("Removing password credentials of user {}", user_id);
                conn.execute(
                    "DELETE FROM user_password_credentials WHERE user_id = ?1",
                    params![user_id],
                )?;
            }
        };
        Ok(())
    }

    fn touch_password_credentials(&self, user_id: &str, success: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let column = if success { "last_used" } else { "last_tried" };
        conn.execute(
            &format!(
                "UPDATE user_password_credentials SET {} = {} WHERE user_id = ?1",
                column, DEFAULT_TIMESTAMP
            ),
            params![user_id],
        )?;
        Ok(())
    }
}
