//! Unifies API for accessing accounts.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{Order, UserAccount, Withdrawal},
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` provides a unified API for reading balances and account history.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the account for the given user. It is an error if the user does not exist.
    pub async fn balance(&self, user_id: i64) -> Result<UserAccount, AccountApiError> {
        trace!("🧑️ Fetching balance for user #{user_id}");
        self.db.fetch_user_account(user_id).await?.ok_or(AccountApiError::UserNotFound(user_id))
    }

    /// The user's orders, oldest submission first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    /// The user's withdrawals, oldest first.
    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        self.db.fetch_withdrawals_for_user(user_id).await
    }
}
