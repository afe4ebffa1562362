//! Passwords and session tokens.
//!
//! Passwords are bcrypt-hashed with a per-call random salt and stored in the
//! record files' `password_hash` column; verification is one-way and
//! constant-time-safe. Logins are exchanged for an HS256 JWT carrying the
//! user's identity claims, valid for seven days.

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::records::{RecordStore, StoreError};

/// Session token lifetime.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// bcrypt work factor. Matches the hashes already present in stored files.
const HASH_COST: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

// ─── User identity ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    Scorer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "admin",
            UserType::Scorer => "scorer",
        }
    }
}

/// A record that passed password verification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub scout_name: String,
    pub real_name: String,
    pub scout_group: String,
    pub user_type: UserType,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub scout_name: String,
    pub real_name: String,
    pub scout_group: String,
    pub user_type: UserType,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

// ─── Passwords ────────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, HASH_COST)?)
}

/// Compare a plaintext candidate against a stored hash. A malformed stored
/// hash counts as a failed match, never an error.
pub fn verify_password(candidate: &str, hash: &str) -> bool {
    bcrypt::verify(candidate, hash).unwrap_or(false)
}

// ─── Session tokens ───────────────────────────────────────────────────────────

pub fn issue_token(secret: &str, user: &AuthenticatedUser) -> Result<String, AuthError> {
    let claims = Claims {
        scout_name: user.scout_name.clone(),
        real_name: user.real_name.clone(),
        scout_group: user.scout_group.clone(),
        user_type: user.user_type,
        exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };
    Ok(jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Decode and validate a session token. Returns `None` for anything invalid:
/// bad signature, expired, malformed.
pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

// ─── Login lookup ─────────────────────────────────────────────────────────────

/// Find the user the credentials belong to.
///
/// The admin list is checked before the scorer list, so a name present in
/// both logs in as an admin. Matching is case-insensitive on scout name;
/// records with no password set never match; a failed password comparison
/// keeps scanning rather than short-circuiting, mirroring the lookup the
/// stored files were written against.
pub async fn find_user(
    admins: &RecordStore,
    scorers: &RecordStore,
    scout_name: &str,
    password: &str,
) -> Result<Option<AuthenticatedUser>, StoreError> {
    let wanted = scout_name.to_lowercase();

    for (store, user_type) in [(admins, UserType::Admin), (scorers, UserType::Scorer)] {
        for record in store.records().await? {
            if record.scout_name.to_lowercase() != wanted || record.password_hash.is_empty() {
                continue;
            }
            if verify_password(password, &record.password_hash) {
                return Ok(Some(AuthenticatedUser {
                    scout_name: record.scout_name,
                    real_name: record.real_name,
                    scout_group: record.scout_group,
                    user_type,
                }));
            }
        }
    }
    Ok(None)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    fn test_user() -> AuthenticatedUser {
        AuthenticatedUser {
            scout_name: "Chip".to_string(),
            real_name: "James Robinson".to_string(),
            scout_group: "1st Blackheath".to_string(),
            user_type: UserType::Admin,
        }
    }

    #[test]
    fn token_round_trip() {
        let token = issue_token("secret", &test_user()).unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.scout_name, "Chip");
        assert_eq!(claims.user_type, UserType::Admin);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn token_rejects_wrong_secret_and_garbage() {
        let token = issue_token("secret", &test_user()).unwrap();
        assert!(verify_token("other-secret", &token).is_none());
        assert!(verify_token("secret", "garbage").is_none());
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }
}
