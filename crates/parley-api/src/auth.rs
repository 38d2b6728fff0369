use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use rand::Rng;
use tracing::{info, warn};

use parley_db::models::UserRow;
use parley_db::users::NewUser;
use parley_db::{Constraint, Database};
use parley_types::api::{
    AuthAction, AuthResponse, LoginRequest, RegisterRequest, UserQuery, UserResponse,
};
use parley_types::models::{Account, UserProfile};

use crate::convert::{account_from_row, profile_from_row};
use crate::discriminator::allocate_discriminator;
use crate::error::{ApiError, required_id, required_text};
use crate::{AppState, AppStateInner, blocking};

pub const DEFAULT_AVATAR: &str = "👤";

/// Insert attempts when the store rejects the (username, discriminator) pair
/// chosen by a concurrent registration.
pub const MAX_INSERT_ATTEMPTS: usize = 3;

const EMAIL_TAKEN: &str = "Email already in use";

/// A freshly authenticated account and its token.
#[derive(Debug)]
pub struct Session {
    pub account: Account,
    pub token: String,
}

pub fn register(state: &AppStateInner, req: &RegisterRequest) -> Result<Session, ApiError> {
    register_with(state, req, &mut rand::rng())
}

pub fn register_with<R: Rng>(
    state: &AppStateInner,
    req: &RegisterRequest,
    rng: &mut R,
) -> Result<Session, ApiError> {
    let username = required_text(&req.username, "username")?;
    let email = required_text(&req.email, "email")?;
    required_text(&req.password, "password")?;
    let avatar = req
        .avatar
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_AVATAR);

    // Fast path only; the UNIQUE constraint on email is what actually holds.
    if state.db.email_registered(email)? {
        return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let password_hash = state.credentials.derive(&req.password)?;
    let candidate = NewUser {
        username,
        discriminator: "",
        email,
        password_hash: &password_hash,
        avatar,
    };
    let user = insert_account(&state.db, candidate, || {
        Ok(allocate_discriminator(&state.db, username, &mut *rng)?)
    })?;

    info!(
        "Registered user {} as {}#{}",
        user.id, user.username, user.discriminator
    );

    let token = state.credentials.issue_token(user.id, &user.email)?;
    Ok(Session {
        account: account_from_row(&user),
        token,
    })
}

/// Insert `user` under a discriminator from `next_discriminator`, drawing a
/// new one whenever the store reports the pair as taken.
pub(crate) fn insert_account<F>(
    db: &Database,
    user: NewUser<'_>,
    mut next_discriminator: F,
) -> Result<UserRow, ApiError>
where
    F: FnMut() -> Result<String, ApiError>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let discriminator = next_discriminator()?;

        let attempted = NewUser {
            discriminator: &discriminator,
            ..user
        };
        let err = match db.create_user(&attempted) {
            Ok(row) => return Ok(row),
            Err(err) => err,
        };

        match err.constraint() {
            Some(c) if c.involves("users.email") => {
                return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
            }
            Some(c) if c.involves("users.discriminator") => {
                if attempt >= MAX_INSERT_ATTEMPTS {
                    return Err(ApiError::Conflict(format!(
                        "No free discriminator left for '{}'",
                        user.username
                    )));
                }
                warn!(
                    "{}#{} taken concurrently, retrying ({}/{})",
                    user.username, discriminator, attempt, MAX_INSERT_ATTEMPTS
                );
            }
            Some(Constraint::Check) => {
                return Err(ApiError::validation("Invalid discriminator"));
            }
            _ => return Err(err.into()),
        }
    }
}

pub fn login(state: &AppStateInner, req: &LoginRequest) -> Result<Session, ApiError> {
    let email = required_text(&req.email, "email")?;
    required_text(&req.password, "password")?;

    let user = state.db.get_user_by_email(email)?.ok_or(ApiError::Auth)?;
    if !state.credentials.verify(&req.password, &user.password_hash) {
        return Err(ApiError::Auth);
    }

    let user = state.db.mark_online(user.id)?.ok_or(ApiError::Auth)?;
    info!("User {} logged in", user.id);

    let token = state.credentials.issue_token(user.id, &user.email)?;
    Ok(Session {
        account: account_from_row(&user),
        token,
    })
}

pub fn lookup(db: &Database, user_id: i64) -> Result<UserProfile, ApiError> {
    db.get_user_by_id(user_id)?
        .map(|row| profile_from_row(&row))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

// -- Handlers --

pub async fn post_action(
    State(state): State<AppState>,
    body: Result<Json<AuthAction>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(action) = body?;

    let session = match action {
        AuthAction::Register(req) => blocking(&state, move |s| register(s, &req)).await?,
        AuthAction::Login(req) => blocking(&state, move |s| login(s, &req)).await?,
        AuthAction::Unsupported => return Err(ApiError::UnsupportedOperation),
    };

    Ok(Json(AuthResponse {
        success: true,
        user: session.account,
        token: session.token,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Query(query) = query?;
    let user_id = required_id(query.user_id, "user_id")?;

    let user = blocking(&state, move |s| lookup(&s.db, user_id)).await?;
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}
