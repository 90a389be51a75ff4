use std::{fmt::Debug, sync::Arc};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;
use mockable::{Clock, DefaultClock};

use crate::{
    db_types::{NewUser, UserAccount},
    traits::{AuthApiError, AuthManagement},
};

/// A user whose password has just been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub login: String,
}

/// Registration and password login.
///
/// Passwords are stored as argon2 PHC strings. Hashing is CPU-bound, so it runs on tokio's blocking pool.
pub struct AuthApi<B> {
    db: B,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, clock: Arc::new(DefaultClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub async fn register(&self, login: &str, password: &str) -> Result<AuthenticatedUser, AuthApiError> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(AuthApiError::MissingCredentials);
        }
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))??;
        let user = NewUser { login: login.to_string(), password_hash, created_at: self.clock.utc() };
        let UserAccount { id, login, .. } = self.db.create_user(user).await?;
        info!("🔑️ New user '{login}' registered as #{id}");
        Ok(AuthenticatedUser { user_id: id, login })
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<AuthenticatedUser, AuthApiError> {
        let creds = self.db.fetch_credentials(login.trim()).await?.ok_or_else(|| {
            debug!("🔑️ Login attempt for unknown user '{login}'");
            AuthApiError::InvalidCredentials
        })?;
        let password = password.to_string();
        let hash = creds.password_hash;
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?;
        if !verified {
            debug!("🔑️ Wrong password for user '{}'", creds.login);
            return Err(AuthApiError::InvalidCredentials);
        }
        trace!("🔑️ User '{}' logged in", creds.login);
        Ok(AuthenticatedUser { user_id: creds.id, login: creds.login })
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!("🔑️ Stored password hash could not be parsed. {e}");
            false
        },
    }
}
