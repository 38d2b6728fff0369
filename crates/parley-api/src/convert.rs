use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use parley_db::models::{FriendRow, UserRow};
use parley_types::models::{Account, Friend, Presence, UserProfile};

/// Parse a stored timestamp. Rows written by the schema defaults are RFC 3339;
/// SQLite's bare `datetime('now')` format is accepted too.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| warn!("Corrupt timestamp '{}': {}", raw, e))
        .ok()
}

pub(crate) fn profile_from_row(row: &UserRow) -> UserProfile {
    UserProfile {
        id: row.id,
        username: row.username.clone(),
        discriminator: row.discriminator.clone(),
        avatar: row.avatar.clone(),
        status: row.status.parse().unwrap_or_else(|e| {
            warn!("Corrupt status on user {}: {}", row.id, e);
            Presence::Offline
        }),
        activity: row.activity.clone(),
        last_seen: row.last_seen.as_deref().and_then(parse_timestamp),
    }
}

pub(crate) fn account_from_row(row: &UserRow) -> Account {
    Account {
        profile: profile_from_row(row),
        email: row.email.clone(),
    }
}

pub(crate) fn friend_from_row(row: &FriendRow) -> Friend {
    Friend {
        profile: profile_from_row(&row.user),
        unread_count: row.unread_count,
    }
}
