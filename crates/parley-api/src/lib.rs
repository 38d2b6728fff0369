pub mod auth;
pub mod credentials;
pub mod discriminator;
pub mod error;
pub mod friends;
pub mod messages;
pub mod reactions;
pub mod routes;

mod convert;

use std::sync::Arc;

use tracing::error;

use parley_db::Database;

use crate::credentials::CredentialScheme;
use crate::error::ApiError;

pub use routes::router;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub credentials: Box<dyn CredentialScheme>,
}

impl AppStateInner {
    pub fn new(db: Database, credentials: impl CredentialScheme + 'static) -> Self {
        Self {
            db,
            credentials: Box::new(credentials),
        }
    }
}

/// Run blocking store work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
}
