pub mod error;
pub mod friendships;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod reactions;
pub mod users;

pub use error::{Constraint, DbError, Result};
pub use reactions::MessageKind;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Handle to the shared relational store.
///
/// Every operation borrows the connection through [`Database::with_conn`] and
/// releases it when the closure returns. Statements commit individually; no
/// helper here wraps several statements in a transaction.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))?;
        f(&conn)
    }
}
