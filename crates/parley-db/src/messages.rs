use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::error::{DbError, Result};
use crate::models::MessageRow;

const MESSAGE_SELECT: &str = "SELECT dm.id, dm.sender_id, dm.recipient_id, dm.content, dm.created_at, dm.read,
            u.username, u.discriminator, u.avatar
     FROM direct_messages dm
     JOIN users u ON u.id = dm.sender_id";

impl Database {
    /// Append an unread message and return it joined with the sender's
    /// profile. Sender and recipient need not be friends.
    pub fn insert_direct_message(
        &self,
        sender_id: i64,
        recipient_id: i64,
        content: &str,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO direct_messages (sender_id, recipient_id, content)
                 VALUES (?1, ?2, ?3)
                 RETURNING id",
                params![sender_id, recipient_id, content],
                |row| row.get(0),
            )?;
            query_message(conn, id)?
                .ok_or_else(|| DbError::from(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    /// Every message exchanged between the two users, oldest first.
    pub fn get_conversation(&self, user_id: i64, friend_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{MESSAGE_SELECT}
                 WHERE (dm.sender_id = ?1 AND dm.recipient_id = ?2)
                    OR (dm.sender_id = ?2 AND dm.recipient_id = ?1)
                 ORDER BY dm.created_at ASC, dm.id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, friend_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Flip unread messages from `sender_id` to `reader_id` to read, up to
    /// and including message `up_to`. This is the only transition the read
    /// flag ever takes.
    ///
    /// Ids are assigned in commit order, so bounding by the newest id a reader
    /// was shown leaves anything sent afterwards unread.
    pub fn mark_conversation_read(
        &self,
        reader_id: i64,
        sender_id: i64,
        up_to: i64,
    ) -> Result<usize> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE direct_messages SET read = 1
                 WHERE sender_id = ?1 AND recipient_id = ?2 AND read = 0 AND id <= ?3",
                params![sender_id, reader_id, up_to],
            )?;
            Ok(updated)
        })
    }
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let sql = format!("{MESSAGE_SELECT} WHERE dm.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt.query_row([id], message_from_row).optional()?)
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        read: row.get(5)?,
        sender_username: row.get(6)?,
        sender_discriminator: row.get(7)?,
        sender_avatar: row.get(8)?,
    })
}
