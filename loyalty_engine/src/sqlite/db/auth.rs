//! Sqlite database operations for user registration and login.
//!
//! Generally clients should never call these methods directly, and prefer to use the [`AuthManagement`] trait methods
//! that are implemented on the [`SqliteDatabase`] struct instead.
//!
//! [`AuthManagement`]: crate::traits::AuthManagement
//! [`SqliteDatabase`]: crate::SqliteDatabase
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, UserAccount, UserCredentials},
    traits::AuthApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<UserAccount, AuthApiError> {
    let login = user.login.clone();
    let result = sqlx::query_as::<_, UserAccount>(
        r#"
            INSERT INTO users (login, password_hash, current_balance, total_withdrawn, created_at, updated_at)
            VALUES ($1, $2, 0, 0, $3, $4)
            RETURNING id, login, current_balance, total_withdrawn, created_at, updated_at;
        "#,
    )
    .bind(user.login)
    .bind(user.password_hash)
    .bind(user.created_at)
    .bind(user.created_at)
    .fetch_all(conn)
    .await
    .and_then(|rows| rows.into_iter().next().ok_or(sqlx::Error::RowNotFound));
    match result {
        Ok(account) => {
            debug!("🗃️ User '{}' registered with id {}", account.login, account.id);
            Ok(account)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AuthApiError::LoginTaken(login)),
        Err(e) => Err(e.into()),
    }
}

pub async fn credentials_for_login(
    login: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    let creds: Vec<UserCredentials> = sqlx::query_as("SELECT id, login, password_hash FROM users WHERE login = $1")
        .bind(login)
        .fetch_all(conn)
        .await?;
    Ok(creds.into_iter().next())
}
