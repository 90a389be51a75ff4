use thiserror::Error;

use crate::db_types::{Order, UserAccount, Withdrawal};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait provides read-only queries over user accounts and their history.
///
/// Mutations go through [`crate::traits::LedgerDatabase`].
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Fetches the user account with the given id. If no account exists, `None` is returned.
    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError>;

    /// All orders submitted by the user, in ascending order of submission time.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError>;

    /// All withdrawals made by the user, in ascending order of processing time.
    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError>;
}
