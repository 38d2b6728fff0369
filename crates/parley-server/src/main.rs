mod config;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use parley_api::credentials::{CredentialScheme, HardenedCredentials, LegacyCredentials};
use parley_api::{AppState, AppStateInner};
use parley_db::Database;

use crate::config::{CredentialMode, ServerConfig};

/// Placeholder token secrets that must not sign real tokens.
const PLACEHOLDER_SECRETS: &[&str] = &["", "dev-secret-change-me"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,parley_db=info,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let credentials: Box<dyn CredentialScheme> = match config.credentials {
        CredentialMode::Legacy => {
            warn!("Using legacy credentials: unsalted password hashes and forgeable tokens");
            Box::new(LegacyCredentials)
        }
        CredentialMode::Hardened => {
            if PLACEHOLDER_SECRETS.contains(&config.token_secret.as_str()) {
                anyhow::bail!("PARLEY_TOKEN_SECRET is unset or still a placeholder");
            }
            Box::new(HardenedCredentials::new(config.token_secret.clone()))
        }
    };

    // Init database
    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner { db, credentials });

    let app = app(state);

    info!("Parley server listening on {}", config.http_addr);

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The API with browser CORS (including `OPTIONS` preflight) and request tracing.
fn app(state: AppState) -> Router {
    parley_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let state = Arc::new(AppStateInner::new(
            Database::open_in_memory().unwrap(),
            LegacyCredentials,
        ));
        app(state)
    }

    #[tokio::test]
    async fn preflight_is_answered_by_cors() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/messages")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[tokio::test]
    async fn simple_requests_carry_cors_headers() {
        let request = Request::builder()
            .uri("/auth?user_id=1")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
