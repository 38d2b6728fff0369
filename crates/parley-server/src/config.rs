//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so the server starts with zero configuration
//! for local development.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which credential scheme new passwords and tokens go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Unsalted SHA-256, compatible with existing accounts.
    Legacy,
    /// Argon2id + signed tokens.
    Hardened,
}

impl FromStr for CredentialMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(CredentialMode::Legacy),
            "hardened" => Ok(CredentialMode::Hardened),
            _ => Err("expected 'legacy' or 'hardened'".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite database file.
    /// Env: `PARLEY_DB_PATH`
    /// Default: `parley.db`
    pub db_path: PathBuf,

    /// Env: `PARLEY_HOST` + `PARLEY_PORT`
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// Env: `PARLEY_CREDENTIALS` (`legacy` | `hardened`)
    /// Default: `legacy`
    pub credentials: CredentialMode,

    /// Signing secret for hardened tokens.
    /// Env: `PARLEY_TOKEN_SECRET`
    pub token_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("parley.db"),
            http_addr: ([0, 0, 0, 0], 3000).into(),
            credentials: CredentialMode::Legacy,
            token_secret: "dev-secret-change-me".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("PARLEY_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let host: IpAddr = parse_var(&lookup, "PARLEY_HOST")?.unwrap_or(defaults.http_addr.ip());
        let port: u16 = parse_var(&lookup, "PARLEY_PORT")?.unwrap_or(defaults.http_addr.port());
        let http_addr = SocketAddr::new(host, port);

        let credentials =
            parse_var(&lookup, "PARLEY_CREDENTIALS")?.unwrap_or(defaults.credentials);
        let token_secret = lookup("PARLEY_TOKEN_SECRET").unwrap_or(defaults.token_secret);

        Ok(Self {
            db_path,
            http_addr,
            credentials,
            token_secret,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|value| {
            value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}
