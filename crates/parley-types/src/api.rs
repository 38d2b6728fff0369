use serde::{Deserialize, Serialize};

use crate::models::{Account, DirectMessage, Friend, UserProfile};

// -- Tokens --

/// Claims of the signed token issued by the hardened credential scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: i64,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

// Write endpoints take a JSON body discriminated by `action`. An action this
// server does not know deserializes to `Unsupported` so it can be answered
// with 405 instead of a parse error. Fields are optional here and checked by
// the handlers, so a missing field and a blank one produce the same error.

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuthAction {
    Register(RegisterRequest),
    Login(LoginRequest),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: Account,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserProfile,
}

// -- Friends --

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FriendAction {
    Add(AddFriendRequest),
    Remove(RemoveFriendRequest),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddFriendRequest {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub friend_code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveFriendRequest {
    pub user_id: Option<i64>,
    pub friend_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AddFriendResponse {
    pub success: bool,
    pub friend_id: i64,
}

#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub success: bool,
    pub friends: Vec<Friend>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MessageAction {
    Send(SendMessageRequest),
    AddReaction(ReactionRequest),
    RemoveReaction(ReactionRequest),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: Option<i64>,
    pub recipient_id: Option<i64>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReactionRequest {
    pub message_id: Option<i64>,
    pub user_id: Option<i64>,
    #[serde(default)]
    pub emoji: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub user_id: Option<i64>,
    pub friend_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: DirectMessage,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub success: bool,
    pub messages: Vec<DirectMessage>,
}

// -- Shared --

/// Body of writes that return nothing beyond the success flag.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
