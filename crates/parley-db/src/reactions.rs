use rusqlite::{Row, params};

use crate::Database;
use crate::error::Result;
use crate::models::ReactionRow;

/// Namespace for `message_reactions.message_id`. Direct and channel messages
/// live in different tables, so their ids overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Direct,
    Channel,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Direct => "direct",
            MessageKind::Channel => "channel",
        }
    }
}

impl Database {
    /// Add a reaction. An identical reaction already present is left alone.
    /// Returns whether a row was written.
    pub fn add_reaction(
        &self,
        kind: MessageKind,
        message_id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO message_reactions (message_id, message_type, user_id, emoji)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (message_id, message_type, user_id, emoji) DO NOTHING",
                params![message_id, kind.as_str(), user_id, emoji],
            )?;
            Ok(inserted > 0)
        })
    }

    /// Returns whether a row was deleted.
    pub fn remove_reaction(
        &self,
        kind: MessageKind,
        message_id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM message_reactions
                 WHERE message_id = ?1 AND message_type = ?2 AND user_id = ?3 AND emoji = ?4",
                params![message_id, kind.as_str(), user_id, emoji],
            )?;
            Ok(deleted > 0)
        })
    }

    /// Reactions on every direct message exchanged between the two users,
    /// oldest first. The statement binds three parameters however long the
    /// conversation is.
    pub fn get_conversation_reactions(
        &self,
        user_id: i64,
        friend_id: i64,
    ) -> Result<Vec<ReactionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.message_id, r.user_id, r.emoji, r.created_at
                 FROM message_reactions r
                 WHERE r.message_type = ?3
                   AND r.message_id IN (
                       SELECT dm.id FROM direct_messages dm
                       WHERE (dm.sender_id = ?1 AND dm.recipient_id = ?2)
                          OR (dm.sender_id = ?2 AND dm.recipient_id = ?1))
                 ORDER BY r.id ASC",
            )?;

            let rows = stmt
                .query_map(
                    params![user_id, friend_id, MessageKind::Direct.as_str()],
                    reaction_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn reaction_from_row(row: &Row<'_>) -> rusqlite::Result<ReactionRow> {
    Ok(ReactionRow {
        id: row.get(0)?,
        message_id: row.get(1)?,
        user_id: row.get(2)?,
        emoji: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::tests::seed_user;

    fn emojis_for(db: &Database, kind: MessageKind, message_id: i64) -> Vec<String> {
        db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT emoji FROM message_reactions
                 WHERE message_type = ?1 AND message_id = ?2
                 ORDER BY id ASC",
            )?;
            let rows = stmt
                .query_map(params![kind.as_str(), message_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .unwrap()
    }

    #[test]
    fn duplicate_reaction_is_a_noop() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");
        let b = seed_user(&db, "bob", "0002");
        let msg = db.insert_direct_message(a.id, b.id, "hi").unwrap();

        assert!(db.add_reaction(MessageKind::Direct, msg.id, b.id, "👍").unwrap());
        assert!(!db.add_reaction(MessageKind::Direct, msg.id, b.id, "👍").unwrap());
        assert!(db.add_reaction(MessageKind::Direct, msg.id, b.id, "🎉").unwrap());

        assert_eq!(emojis_for(&db, MessageKind::Direct, msg.id), vec!["👍", "🎉"]);
    }

    #[test]
    fn remove_absent_reaction_is_fine() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");

        assert!(!db.remove_reaction(MessageKind::Direct, 99, a.id, "👍").unwrap());
    }

    #[test]
    fn kinds_do_not_share_message_ids() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");
        let b = seed_user(&db, "bob", "0002");
        let msg = db.insert_direct_message(a.id, b.id, "hi").unwrap();

        db.add_reaction(MessageKind::Channel, msg.id, a.id, "🔥").unwrap();
        assert!(db.add_reaction(MessageKind::Direct, msg.id, a.id, "🔥").unwrap());
        db.add_reaction(MessageKind::Channel, msg.id, b.id, "🎉").unwrap();
        db.remove_reaction(MessageKind::Channel, msg.id, a.id, "🔥").unwrap();

        let direct = db.get_conversation_reactions(a.id, b.id).unwrap();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].emoji, "🔥");
        assert_eq!(emojis_for(&db, MessageKind::Channel, msg.id), vec!["🎉"]);
    }

    #[test]
    fn conversation_reactions_cover_both_directions_only() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");
        let b = seed_user(&db, "bob", "0002");
        let c = seed_user(&db, "carol", "0003");
        let to_b = db.insert_direct_message(a.id, b.id, "1").unwrap();
        let to_a = db.insert_direct_message(b.id, a.id, "2").unwrap();
        let elsewhere = db.insert_direct_message(c.id, a.id, "3").unwrap();
        for msg in [&to_b, &to_a, &elsewhere] {
            db.add_reaction(MessageKind::Direct, msg.id, a.id, "👀").unwrap();
        }

        let ids: Vec<i64> = db
            .get_conversation_reactions(b.id, a.id)
            .unwrap()
            .iter()
            .map(|r| r.message_id)
            .collect();
        assert_eq!(ids, vec![to_b.id, to_a.id]);
        assert!(db.get_conversation_reactions(b.id, c.id).unwrap().is_empty());
    }

    #[test]
    fn long_conversation_is_fetched_in_one_statement() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");
        let b = seed_user(&db, "bob", "0002");
        db.with_conn(|conn| {
            conn.execute(
                "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 33000)
                 INSERT INTO direct_messages (sender_id, recipient_id, content)
                 SELECT ?1, ?2, 'm' || i FROM n",
                params![a.id, b.id],
            )?;
            Ok(())
        })
        .unwrap();
        let last: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT MAX(id) FROM direct_messages", [], |r| r.get(0))?)
            })
            .unwrap();
        db.add_reaction(MessageKind::Direct, last, b.id, "🎉").unwrap();

        let rows = db.get_conversation_reactions(b.id, a.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message_id, last);
    }
}
