use axum::{Router, routing::get};

use crate::error::ApiError;
use crate::{AppState, auth, friends, messages};

/// One resource per subsystem: GET reads by query parameters, POST writes
/// with an `action` field. Any other method is answered with 405.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/auth",
            get(auth::get_user)
                .post(auth::post_action)
                .fallback(unsupported_method),
        )
        .route(
            "/friends",
            get(friends::get_friends)
                .post(friends::post_action)
                .fallback(unsupported_method),
        )
        .route(
            "/messages",
            get(messages::get_conversation)
                .post(messages::post_action)
                .fallback(unsupported_method),
        )
        .with_state(state)
}

async fn unsupported_method() -> ApiError {
    ApiError::UnsupportedOperation
}
