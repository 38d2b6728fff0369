use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::error::Result;
use crate::models::UserRow;

const USER_COLUMNS: &str = "id, username, discriminator, email, password_hash, avatar, status, activity, last_seen, created_at";

/// Fields supplied by registration. Status starts `online`.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub discriminator: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub avatar: &'a str,
}

impl Database {
    /// Insert a user. Both the email and the (username, discriminator) pair
    /// are UNIQUE; a violation comes back as a constraint error.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO users (username, discriminator, email, password_hash, avatar, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'online')
                 RETURNING {USER_COLUMNS}"
            );
            let row = conn.query_row(
                &sql,
                params![
                    user.username,
                    user.discriminator,
                    user.email,
                    user.password_hash,
                    user.avatar
                ],
                user_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn discriminator_taken(&self, username: &str, discriminator: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1 AND discriminator = ?2",
                    params![username, discriminator],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            Ok(taken)
        })
    }

    pub fn email_registered(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn
                .query_row("SELECT 1 FROM users WHERE email = ?1", [email], |_| Ok(()))
                .optional()?
                .is_some();
            Ok(exists)
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", params![id]))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", params![email]))
    }

    /// Resolve a `username#discriminator` handle.
    pub fn get_user_by_handle(&self, username: &str, discriminator: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "username = ?1 AND discriminator = ?2",
                params![username, discriminator],
            )
        })
    }

    /// Set status `online` and refresh `last_seen`. Returns the updated row,
    /// or `None` if the user does not exist.
    pub fn mark_online(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE users
                 SET status = 'online', last_seen = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1
                 RETURNING {USER_COLUMNS}"
            );
            Ok(conn.query_row(&sql, [id], user_from_row).optional()?)
        })
    }
}

fn query_user(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt.query_row(params, user_from_row).optional()?)
}

/// Map the ten user columns starting at index 0, in `USER_COLUMNS` order.
pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        discriminator: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        avatar: row.get(5)?,
        status: row.get(6)?,
        activity: row.get(7)?,
        last_seen: row.get(8)?,
        created_at: row.get(9)?,
    })
}
