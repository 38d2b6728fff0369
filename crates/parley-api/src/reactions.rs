use tracing::debug;

use parley_db::{Constraint, Database, MessageKind};

use crate::error::{ApiError, required_text};

/// React to a direct message. Repeating the same reaction is a no-op.
pub fn add_reaction(
    db: &Database,
    message_id: i64,
    user_id: i64,
    emoji: &str,
) -> Result<(), ApiError> {
    let emoji = required_text(emoji, "emoji")?;

    let added = db
        .add_reaction(MessageKind::Direct, message_id, user_id, emoji)
        .map_err(|err| match err.constraint() {
            Some(Constraint::ForeignKey) => ApiError::validation("Unknown user"),
            _ => err.into(),
        })?;
    if added {
        debug!("User {} reacted {} to message {}", user_id, emoji, message_id);
    }
    Ok(())
}

/// Withdraw a reaction. Withdrawing one that is not there is a no-op.
pub fn remove_reaction(
    db: &Database,
    message_id: i64,
    user_id: i64,
    emoji: &str,
) -> Result<(), ApiError> {
    let emoji = required_text(emoji, "emoji")?;

    if db.remove_reaction(MessageKind::Direct, message_id, user_id, emoji)? {
        debug!("User {} removed {} from message {}", user_id, emoji, message_id);
    }
    Ok(())
}
