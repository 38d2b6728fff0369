use rusqlite::params;

use crate::Database;
use crate::error::Result;
use crate::models::FriendRow;
use crate::users::user_from_row;

impl Database {
    /// Insert both directions of an accepted friendship in one statement.
    ///
    /// Rows that already exist are skipped, so repeating the call is a no-op.
    /// Returns how many rows were actually written (0, 1 or 2).
    pub fn insert_friendship_pair(&self, user_id: i64, friend_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO friendships (user_id, friend_id, status)
                 VALUES (?1, ?2, 'accepted'), (?2, ?1, 'accepted')
                 ON CONFLICT (user_id, friend_id) DO NOTHING",
                params![user_id, friend_id],
            )?;
            Ok(inserted)
        })
    }

    /// Delete both directions in one statement, whichever of them exist.
    pub fn delete_friendship_pair(&self, user_id: i64, friend_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM friendships
                 WHERE (user_id = ?1 AND friend_id = ?2)
                    OR (user_id = ?2 AND friend_id = ?1)",
                params![user_id, friend_id],
            )?;
            Ok(deleted)
        })
    }

    /// Accepted friends of `user_id`, each with the number of unread messages
    /// that friend sent to `user_id`. Online friends first, then by username.
    pub fn list_friends(&self, user_id: i64) -> Result<Vec<FriendRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.discriminator, u.email, u.password_hash, u.avatar,
                        u.status, u.activity, u.last_seen, u.created_at,
                        (SELECT COUNT(*) FROM direct_messages dm
                         WHERE dm.sender_id = u.id AND dm.recipient_id = ?1 AND dm.read = 0)
                 FROM friendships f
                 JOIN users u ON u.id = f.friend_id
                 WHERE f.user_id = ?1 AND f.status = 'accepted'
                 ORDER BY u.status DESC, u.username ASC, u.id ASC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(FriendRow {
                        user: user_from_row(row)?,
                        unread_count: row.get(10)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::tests::seed_user;
    use rusqlite::OptionalExtension;

    fn has_friend_edge(db: &Database, owner_id: i64, friend_id: i64) -> bool {
        db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT 1 FROM friendships WHERE user_id = ?1 AND friend_id = ?2",
                    params![owner_id, friend_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some())
        })
        .unwrap()
    }

    #[test]
    fn pair_insert_is_symmetric_and_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");
        let b = seed_user(&db, "bob", "0002");

        assert_eq!(db.insert_friendship_pair(a.id, b.id).unwrap(), 2);
        assert!(has_friend_edge(&db, a.id, b.id));
        assert!(has_friend_edge(&db, b.id, a.id));

        assert_eq!(db.insert_friendship_pair(a.id, b.id).unwrap(), 0);
        assert_eq!(db.insert_friendship_pair(b.id, a.id).unwrap(), 0);
        assert_eq!(db.list_friends(a.id).unwrap().len(), 1);
    }

    #[test]
    fn pair_insert_repairs_a_half_edge() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");
        let b = seed_user(&db, "bob", "0002");
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO friendships (user_id, friend_id) VALUES (?1, ?2)",
                params![a.id, b.id],
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.insert_friendship_pair(a.id, b.id).unwrap(), 1);
        assert!(has_friend_edge(&db, b.id, a.id));
    }

    #[test]
    fn self_edge_rejected_by_check() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");

        let err = db.insert_friendship_pair(a.id, a.id).unwrap_err();
        assert_eq!(err.constraint(), Some(crate::Constraint::Check));
        assert!(!has_friend_edge(&db, a.id, a.id));
    }

    #[test]
    fn delete_removes_either_orientation() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");
        let b = seed_user(&db, "bob", "0002");
        db.insert_friendship_pair(a.id, b.id).unwrap();

        assert_eq!(db.delete_friendship_pair(b.id, a.id).unwrap(), 2);
        assert!(!has_friend_edge(&db, a.id, b.id));
        assert!(!has_friend_edge(&db, b.id, a.id));
        assert_eq!(db.delete_friendship_pair(a.id, b.id).unwrap(), 0);
    }

    #[test]
    fn list_orders_online_first_then_username() {
        let db = Database::open_in_memory().unwrap();
        let me = seed_user(&db, "me", "0001");
        let zed = seed_user(&db, "zed", "0002");
        let amy = seed_user(&db, "amy", "0003");
        let bob = seed_user(&db, "bob", "0004");
        for friend in [&zed, &amy, &bob] {
            db.insert_friendship_pair(me.id, friend.id).unwrap();
        }
        db.with_conn(|conn| {
            conn.execute("UPDATE users SET status = 'offline' WHERE id = ?1", [amy.id])?;
            Ok(())
        })
        .unwrap();

        let names: Vec<String> = db
            .list_friends(me.id)
            .unwrap()
            .into_iter()
            .map(|f| f.user.username)
            .collect();
        assert_eq!(names, vec!["bob", "zed", "amy"]);
    }

    #[test]
    fn unread_count_only_counts_messages_to_owner() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db, "alice", "0001");
        let b = seed_user(&db, "bob", "0002");
        db.insert_friendship_pair(a.id, b.id).unwrap();

        db.insert_direct_message(b.id, a.id, "hi").unwrap();
        db.insert_direct_message(b.id, a.id, "there").unwrap();
        db.insert_direct_message(a.id, b.id, "yo").unwrap();

        assert_eq!(db.list_friends(a.id).unwrap()[0].unread_count, 2);
        assert_eq!(db.list_friends(b.id).unwrap()[0].unread_count, 1);
    }
}
