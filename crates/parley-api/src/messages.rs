use std::collections::HashMap;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use tracing::debug;

use parley_db::models::{MessageRow, ReactionRow};
use parley_db::{Constraint, Database};
use parley_types::api::{
    AckResponse, ConversationQuery, MessageAction, MessageResponse, MessagesResponse,
};
use parley_types::models::{DirectMessage, ReactionGroup, SenderProfile};

use crate::convert::parse_timestamp;
use crate::error::{ApiError, required_id, required_text};
use crate::reactions::{add_reaction, remove_reaction};
use crate::{AppState, blocking};

/// Store a message from `sender_id` to `recipient_id`. The two do not have to
/// be friends.
pub fn send_message(
    db: &Database,
    sender_id: i64,
    recipient_id: i64,
    content: &str,
) -> Result<DirectMessage, ApiError> {
    let content = required_text(content, "content")?;

    let row = db
        .insert_direct_message(sender_id, recipient_id, content)
        .map_err(|err| match err.constraint() {
            Some(Constraint::ForeignKey) => ApiError::validation("Unknown sender or recipient"),
            _ => err.into(),
        })?;

    debug!(
        "Message {} sent from {} to {}",
        row.id, row.sender_id, row.recipient_id
    );
    Ok(message_from_row(row, Vec::new()))
}

/// Both directions of the conversation between `user_id` and `friend_id`,
/// oldest first, with reaction summaries.
///
/// Viewing is what marks messages read: after the snapshot is taken, the
/// unread messages `friend_id` sent to `user_id` that the snapshot contains
/// are flipped. Anything sent after the snapshot stays unread. The snapshot
/// itself still shows pre-view state.
pub fn fetch_conversation(
    db: &Database,
    user_id: i64,
    friend_id: i64,
) -> Result<Vec<DirectMessage>, ApiError> {
    let rows = db.get_conversation(user_id, friend_id)?;
    let mut reactions = group_reactions(db.get_conversation_reactions(user_id, friend_id)?);

    if let Some(newest) = rows.iter().map(|r| r.id).max() {
        let marked = db.mark_conversation_read(user_id, friend_id, newest)?;
        if marked > 0 {
            debug!("User {} read {} message(s) from {}", user_id, marked, friend_id);
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let groups = reactions.remove(&row.id).unwrap_or_default();
            message_from_row(row, groups)
        })
        .collect())
}

/// Group reaction rows by message, then by emoji in order of first use.
fn group_reactions(rows: Vec<ReactionRow>) -> HashMap<i64, Vec<ReactionGroup>> {
    let mut by_message: HashMap<i64, Vec<ReactionGroup>> = HashMap::new();
    for r in rows {
        let groups = by_message.entry(r.message_id).or_default();
        match groups.iter_mut().find(|g| g.emoji == r.emoji) {
            Some(group) => {
                group.count += 1;
                group.user_ids.push(r.user_id);
            }
            None => groups.push(ReactionGroup {
                emoji: r.emoji,
                count: 1,
                user_ids: vec![r.user_id],
            }),
        }
    }
    by_message
}

fn message_from_row(row: MessageRow, reactions: Vec<ReactionGroup>) -> DirectMessage {
    DirectMessage {
        id: row.id,
        sender_id: row.sender_id,
        recipient_id: row.recipient_id,
        created_at: parse_timestamp(&row.created_at),
        content: row.content,
        read: row.read,
        sender: SenderProfile {
            id: row.sender_id,
            username: row.sender_username,
            discriminator: row.sender_discriminator,
            avatar: row.sender_avatar,
        },
        reactions,
    }
}

// -- Handlers --

pub async fn post_action(
    State(state): State<AppState>,
    body: Result<Json<MessageAction>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(action) = body?;

    match action {
        MessageAction::Send(req) => {
            let sender_id = required_id(req.sender_id, "sender_id")?;
            let recipient_id = required_id(req.recipient_id, "recipient_id")?;
            let message = blocking(&state, move |s| {
                send_message(&s.db, sender_id, recipient_id, &req.content)
            })
            .await?;
            Ok(Json(MessageResponse {
                success: true,
                message,
            })
            .into_response())
        }
        MessageAction::AddReaction(req) => {
            let message_id = required_id(req.message_id, "message_id")?;
            let user_id = required_id(req.user_id, "user_id")?;
            blocking(&state, move |s| {
                add_reaction(&s.db, message_id, user_id, &req.emoji)
            })
            .await?;
            Ok(Json(AckResponse::ok()).into_response())
        }
        MessageAction::RemoveReaction(req) => {
            let message_id = required_id(req.message_id, "message_id")?;
            let user_id = required_id(req.user_id, "user_id")?;
            blocking(&state, move |s| {
                remove_reaction(&s.db, message_id, user_id, &req.emoji)
            })
            .await?;
            Ok(Json(AckResponse::ok()).into_response())
        }
        MessageAction::Unsupported => Err(ApiError::UnsupportedOperation),
    }
}

pub async fn get_conversation(
    State(state): State<AppState>,
    query: Result<Query<ConversationQuery>, QueryRejection>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let Query(query) = query?;
    let user_id = required_id(query.user_id, "user_id")?;
    let friend_id = required_id(query.friend_id, "friend_id")?;

    let messages = blocking(&state, move |s| fetch_conversation(&s.db, user_id, friend_id)).await?;
    Ok(Json(MessagesResponse {
        success: true,
        messages,
    }))
}
