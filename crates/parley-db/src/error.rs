use rusqlite::ffi;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Which store-level constraint rejected a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// UNIQUE or PRIMARY KEY, with the offending `table.column` names.
    Unique(Vec<String>),
    ForeignKey,
    Check,
    Other,
}

impl Constraint {
    /// True when `column` (as `table.column`) is part of a unique violation.
    pub fn involves(&self, column: &str) -> bool {
        matches!(self, Constraint::Unique(columns) if columns.iter().any(|c| c == column))
    }
}

impl DbError {
    /// Classify a constraint violation, or `None` for any other failure.
    ///
    /// Concurrent writers that both pass an application-level pre-check end up
    /// here; callers translate the result into a domain error.
    pub fn constraint(&self) -> Option<Constraint> {
        let DbError::Sqlite(rusqlite::Error::SqliteFailure(err, message)) = self else {
            return None;
        };
        if err.code != rusqlite::ErrorCode::ConstraintViolation {
            return None;
        }

        let message = message.as_deref().unwrap_or_default();
        let constraint = match err.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                Constraint::Unique(unique_columns(message))
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Constraint::ForeignKey,
            ffi::SQLITE_CONSTRAINT_CHECK => Constraint::Check,
            _ => Constraint::Other,
        };
        Some(constraint)
    }
}

// SQLite reports "UNIQUE constraint failed: users.username, users.discriminator".
fn unique_columns(message: &str) -> Vec<String> {
    message
        .split_once(": ")
        .map(|(_, columns)| columns.split(", ").map(str::to_string).collect())
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, DbError>;
