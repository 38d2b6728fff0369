use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL,
            discriminator   TEXT NOT NULL CHECK (length(discriminator) = 4),
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            avatar          TEXT NOT NULL DEFAULT '👤',
            status          TEXT NOT NULL DEFAULT 'offline',
            activity        TEXT,
            last_seen       TEXT,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            UNIQUE (username, discriminator)
        );

        -- One row per direction; a friendship is the pair (a, b) + (b, a).
        CREATE TABLE IF NOT EXISTS friendships (
            user_id     INTEGER NOT NULL REFERENCES users(id),
            friend_id   INTEGER NOT NULL REFERENCES users(id),
            status      TEXT NOT NULL DEFAULT 'accepted',
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (user_id, friend_id),
            CHECK (user_id <> friend_id)
        );

        CREATE INDEX IF NOT EXISTS idx_friendships_friend
            ON friendships(friend_id);

        CREATE TABLE IF NOT EXISTS direct_messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id       INTEGER NOT NULL REFERENCES users(id),
            recipient_id    INTEGER NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            read            INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_direct_messages_pair
            ON direct_messages(sender_id, recipient_id, created_at);

        -- Shared by every message kind; message_type namespaces message_id,
        -- so there is no foreign key on it.
        CREATE TABLE IF NOT EXISTS message_reactions (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id      INTEGER NOT NULL,
            message_type    TEXT NOT NULL,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            emoji           TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            UNIQUE (message_id, message_type, user_id, emoji)
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_message
            ON message_reactions(message_type, message_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
