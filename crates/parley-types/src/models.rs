use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presence shown next to a user in friend lists.
///
/// Stored as lowercase text. Friend lists sort on that text descending, which
/// puts `online` ahead of `offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
}

impl Presence {
    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Online => "online",
            Presence::Offline => "offline",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Presence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Presence::Online),
            "offline" => Ok(Presence::Offline),
            other => Err(format!("unknown presence '{}'", other)),
        }
    }
}

/// Public view of a user. Never carries the email or the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub discriminator: String,
    pub avatar: String,
    pub status: Presence,
    pub activity: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// The owner's own view of their account, returned on register and login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub email: String,
}

/// A friend list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Messages this friend sent that the list owner has not viewed yet.
    pub unread_count: i64,
}

/// Sender fields embedded in every direct message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub id: i64,
    pub username: String,
    pub discriminator: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub read: bool,
    pub sender: SenderProfile,
    pub reactions: Vec<ReactionGroup>,
}

/// All reactions of one emoji on one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionGroup {
    pub emoji: String,
    pub count: usize,
    pub user_ids: Vec<i64>,
}
