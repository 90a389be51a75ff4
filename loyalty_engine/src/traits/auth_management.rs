use thiserror::Error;

use crate::db_types::{NewUser, UserAccount, UserCredentials};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("Login and password must not be empty")]
    MissingCredentials,
    #[error("Could not hash password. {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Behaviour for creating users and looking up their credentials.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Creates a new user with a zero balance. Fails with [`AuthApiError::LoginTaken`] if the login exists.
    async fn create_user(&self, user: NewUser) -> Result<UserAccount, AuthApiError>;

    /// Fetches the stored credentials for `login`, if the user exists.
    async fn fetch_credentials(&self, login: &str) -> Result<Option<UserCredentials>, AuthApiError>;
}
