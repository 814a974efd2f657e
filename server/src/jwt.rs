use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, RestError};

/// Name of the session cookie carrying the token
pub const TOKEN_COOKIE: &str = "jwt";

/// Bearer tokens expire after 24 hours; there is no refresh mechanism, an
/// expired token forces a full re-login.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Canonical token payload: the user id plus issue/expiry timestamps.
/// Session, verification and reset tokens all share this shape and are
/// signed with the one application secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed token for a user, valid for 24 hours
pub fn issue_token(user_id: i64, secret: &str) -> Result<String, RestError> {
    issue_token_with_lifetime(user_id, secret, TOKEN_LIFETIME_HOURS)
}

pub(crate) fn issue_token_with_lifetime(
    user_id: i64,
    secret: &str,
    hours: i64,
) -> Result<String, RestError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        id: user_id,
        iat: now,
        exp: now + hours * 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| RestError::Internal(format!("failed to sign token: {e}")))
}

/// Validate and decode a token, distinguishing expiry from malformed input
/// and bad signatures.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::TokenMalformed,
    })
}

/// Pull the token from the session cookie or the Authorization header.
/// The "Bearer" prefix is matched case-sensitively.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer").unwrap_or(header).trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Hash a raw password with argon2 and a fresh random salt
pub fn hash_password(raw: &str) -> Result<String, RestError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RestError::Internal(format!("failed to hash password: {e}")))
}

/// Constant-time password verification against a stored PHC hash
pub fn verify_password(raw: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(raw.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_roundtrip() {
        let token = issue_token(42, SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        assert_eq!(claims.id, 42);
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_HOURS * 3600);
    }

    #[test]
    fn test_token_accepted_before_expiry() {
        // A 24h token checked 23 hours in still has an hour left; model that
        // with a one hour lifetime, which must validate now.
        let token = issue_token_with_lifetime(42, SECRET, 1).unwrap();
        assert!(validate_token(&token, SECRET).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token_with_lifetime(42, SECRET, -1).unwrap();
        assert_eq!(
            validate_token(&token, SECRET).unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(42, SECRET).unwrap();
        assert_eq!(
            validate_token(&token, "other-secret").unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        assert_eq!(
            validate_token("not-a-token", SECRET).unwrap_err(),
            AuthError::TokenMalformed
        );
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();

        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_bearer_prefix_is_case_sensitive() {
        let jar = CookieJar::new();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(extract_token(&jar, &headers).unwrap(), "abc123");

        // Lowercase "bearer" is not a recognized prefix; the raw value is
        // kept as-is (and will fail validation downstream).
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "bearer abc123".parse().unwrap());
        assert_eq!(extract_token(&jar, &headers).unwrap(), "bearer abc123");
    }
}
