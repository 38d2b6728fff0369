//! Database row types. These map directly to SQLite rows and stay distinct
//! from the parley-types API models; timestamps are left as stored text.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub discriminator: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub status: String,
    pub activity: Option<String>,
    pub last_seen: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct FriendRow {
    pub user: UserRow,
    pub unread_count: i64,
}

/// A direct message joined with its sender's public fields.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub content: String,
    pub created_at: String,
    pub read: bool,
    pub sender_username: String,
    pub sender_discriminator: String,
    pub sender_avatar: String,
}

#[derive(Debug, Clone)]
pub struct ReactionRow {
    pub id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub emoji: String,
    pub created_at: String,
}
