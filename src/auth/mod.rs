use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::user::{self, Entity as User},
    errors::ServiceError,
};

/// Identity of the authenticated caller, resolved per request.
/// Handlers take this as an extractor argument; no ambient user state exists.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug, Clone)]
struct Session {
    user_id: i32,
    username: String,
    expires_at: DateTime<Utc>,
}

/// Issued to a client on login; the token is the only session credential.
#[derive(Debug, serde::Serialize)]
pub struct SessionToken {
    pub token: String,
    pub user_id: i32,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Account registry plus the process-wide session store.
///
/// Sessions are opaque uuid tokens mapped to user identity in a concurrent
/// map; logout revokes by removal and expiry is enforced lazily on resolve.
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    sessions: DashMap<String, Session>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, session_ttl_secs: u64) -> Self {
        Self {
            db,
            sessions: DashMap::new(),
            session_ttl: Duration::seconds(session_ttl_secs as i64),
        }
    }

    /// Registers a new account. The username must not already exist
    /// (exact, case-sensitive match).
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::ValidationError(
                "username must not be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(ServiceError::ValidationError(
                "password must not be empty".to_string(),
            ));
        }

        let existing = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateUsername(username.to_string()));
        }

        let password_hash = hash_password(password)?;

        let created = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = created.id, "User registered: {}", created.username);
        Ok(created)
    }

    /// Verifies credentials and opens a session. Unknown usernames and wrong
    /// passwords produce the same error.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionToken, ServiceError> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.session_ttl;
        self.sessions.insert(
            token.clone(),
            Session {
                user_id: user.id,
                username: user.username.clone(),
                expires_at,
            },
        );

        info!(user_id = user.id, "User logged in: {}", user.username);
        Ok(SessionToken {
            token,
            user_id: user.id,
            username: user.username,
            expires_at,
        })
    }

    /// Revokes a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) {
        if self.sessions.remove(token).is_some() {
            info!("Session revoked");
        }
    }

    /// Resolves a bearer token to an identity, dropping it if expired.
    pub fn resolve_session(&self, token: &str) -> Option<CurrentUser> {
        let session = self.sessions.get(token)?;
        if session.expires_at < Utc::now() {
            drop(session);
            self.sessions.remove(token);
            return None;
        }
        Some(CurrentUser {
            user_id: session.user_id,
            username: session.username.clone(),
        })
    }

}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::InternalError(format!("failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ServiceError::InternalError(format!("invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthService>::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(unauthorized)?;

        auth.resolve_session(token).ok_or_else(unauthorized)
    }
}

fn unauthorized() -> ServiceError {
    ServiceError::Unauthorized(
        "authentication required; obtain a session via POST /auth/login".to_string(),
    )
}
