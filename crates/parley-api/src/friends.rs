use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use tracing::info;

use parley_db::{Constraint, Database, DbError};
use parley_types::api::{
    AckResponse, AddFriendResponse, FriendAction, FriendsResponse, UserQuery,
};
use parley_types::models::Friend;

use crate::convert::friend_from_row;
use crate::error::{ApiError, required_id, required_text};
use crate::{AppState, blocking};

/// Split `username#discriminator`. Exactly one `#` with text on both sides.
pub fn parse_friend_code(code: &str) -> Result<(&str, &str), ApiError> {
    let mut parts = code.split('#');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(username), Some(discriminator), None)
            if !username.is_empty() && !discriminator.is_empty() =>
        {
            Ok((username, discriminator))
        }
        _ => Err(ApiError::validation(
            "Invalid friend code format (Username#0000)",
        )),
    }
}

/// Befriend the user behind `friend_code`. Both directions are written by one
/// statement, and an existing friendship makes this a no-op.
pub fn add_friend(db: &Database, user_id: i64, friend_code: &str) -> Result<i64, ApiError> {
    let code = required_text(friend_code, "friend_code")?;
    let (username, discriminator) = parse_friend_code(code)?;

    let friend = db
        .get_user_by_handle(username, discriminator)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if friend.id == user_id {
        return Err(ApiError::validation("You cannot add yourself as a friend"));
    }

    let inserted = db
        .insert_friendship_pair(user_id, friend.id)
        .map_err(friendship_write_error)?;
    if inserted > 0 {
        info!("User {} and user {} are now friends", user_id, friend.id);
    }

    Ok(friend.id)
}

fn friendship_write_error(err: DbError) -> ApiError {
    match err.constraint() {
        Some(Constraint::ForeignKey) => ApiError::validation("Unknown user"),
        Some(Constraint::Check) => ApiError::validation("You cannot add yourself as a friend"),
        _ => err.into(),
    }
}

/// Remove the friendship in both directions. Removing a friendship that does
/// not exist succeeds.
pub fn remove_friend(db: &Database, user_id: i64, friend_id: i64) -> Result<(), ApiError> {
    let deleted = db.delete_friendship_pair(user_id, friend_id)?;
    if deleted > 0 {
        info!("User {} and user {} are no longer friends", user_id, friend_id);
    }
    Ok(())
}

pub fn list_friends(db: &Database, user_id: i64) -> Result<Vec<Friend>, ApiError> {
    let rows = db.list_friends(user_id)?;
    Ok(rows.iter().map(friend_from_row).collect())
}

// -- Handlers --

pub async fn post_action(
    State(state): State<AppState>,
    body: Result<Json<FriendAction>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(action) = body?;

    match action {
        FriendAction::Add(req) => {
            let user_id = required_id(req.user_id, "user_id")?;
            let friend_id =
                blocking(&state, move |s| add_friend(&s.db, user_id, &req.friend_code)).await?;
            Ok(Json(AddFriendResponse {
                success: true,
                friend_id,
            })
            .into_response())
        }
        FriendAction::Remove(req) => {
            let user_id = required_id(req.user_id, "user_id")?;
            let friend_id = required_id(req.friend_id, "friend_id")?;
            blocking(&state, move |s| remove_friend(&s.db, user_id, friend_id)).await?;
            Ok(Json(AckResponse::ok()).into_response())
        }
        FriendAction::Unsupported => Err(ApiError::UnsupportedOperation),
    }
}

pub async fn get_friends(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<FriendsResponse>, ApiError> {
    let Query(query) = query?;
    let user_id = required_id(query.user_id, "user_id")?;

    let friends = blocking(&state, move |s| list_friends(&s.db, user_id)).await?;
    Ok(Json(FriendsResponse {
        success: true,
        friends,
    }))
}
