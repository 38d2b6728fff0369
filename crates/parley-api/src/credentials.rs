use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use sha2::{Digest, Sha256};

use parley_types::api::TokenClaims;

use crate::error::ApiError;

/// How passwords become stored credentials and how session tokens are minted.
pub trait CredentialScheme: Send + Sync {
    /// Derive the value stored in `users.password_hash`.
    fn derive(&self, password: &str) -> Result<String, ApiError>;

    /// Check a login attempt against the stored value.
    fn verify(&self, password: &str, stored: &str) -> bool;

    fn issue_token(&self, user_id: i64, email: &str) -> Result<String, ApiError>;
}

/// Unsalted SHA-256 credentials and an unkeyed token.
///
/// Kept for compatibility with accounts created by earlier deployments.
/// Weak on both counts: identical passwords share a stored value, and the
/// token is just `sha256("{id}{email}")`, so anyone who knows a user's id and
/// email can forge it. Prefer [`HardenedCredentials`] for new deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyCredentials;

impl CredentialScheme for LegacyCredentials {
    fn derive(&self, password: &str) -> Result<String, ApiError> {
        Ok(sha256_hex(password))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        sha256_hex(password) == stored
    }

    fn issue_token(&self, user_id: i64, email: &str) -> Result<String, ApiError> {
        Ok(sha256_hex(&format!("{}{}", user_id, email)))
    }
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Argon2id password hashes and HS256 tokens signed with a server secret.
pub struct HardenedCredentials {
    secret: String,
}

impl HardenedCredentials {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl CredentialScheme for HardenedCredentials {
    fn derive(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        // A legacy hex digest is not a PHC string and simply fails to parse.
        PasswordHash::new(stored)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    fn issue_token(&self, user_id: i64, email: &str) -> Result<String, ApiError> {
        let claims = TokenClaims {
            sub: user_id,
            email: email.to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn legacy_derivation_is_plain_sha256() {
        let scheme = LegacyCredentials;
        assert_eq!(
            scheme.derive("password").unwrap(),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
        assert!(scheme.verify("password", &scheme.derive("password").unwrap()));
        assert!(!scheme.verify("Password", &scheme.derive("password").unwrap()));
    }

    #[test]
    fn legacy_token_is_reproducible_from_id_and_email() {
        let scheme = LegacyCredentials;
        let token = scheme.issue_token(7, "a@x.com").unwrap();
        assert_eq!(token, sha256_hex("7a@x.com"));
        assert_eq!(token.len(), 64);
    }

    #[test]
    fn hardened_hashes_are_salted() {
        let scheme = HardenedCredentials::new("secret");
        let first = scheme.derive("pw1").unwrap();
        let second = scheme.derive("pw1").unwrap();

        assert_ne!(first, second);
        assert!(scheme.verify("pw1", &first));
        assert!(scheme.verify("pw1", &second));
        assert!(!scheme.verify("pw2", &first));
        assert!(!scheme.verify("pw1", &sha256_hex("pw1")));
    }

    #[test]
    fn hardened_token_requires_the_secret() {
        let scheme = HardenedCredentials::new("server-secret");
        let token = scheme.issue_token(42, "b@x.com").unwrap();

        let claims = decode::<TokenClaims>(
            &token,
            &DecodingKey::from_secret(b"server-secret"),
            &Validation::default(),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "b@x.com");

        assert!(
            decode::<TokenClaims>(
                &token,
                &DecodingKey::from_secret(b"guess"),
                &Validation::default(),
            )
            .is_err()
        );
    }
}
