use std::{fmt::Debug, sync::Arc};

use log::*;
use lpg_common::Amount;
use mockable::{Clock, DefaultClock};

use crate::{
    db_types::{NewWithdrawal, OrderNumber, Withdrawal},
    ledger_api::errors::WithdrawalError,
    traits::{AccountManagement, LedgerDatabase},
};

/// Spends loyalty points from a user's balance against a reference number.
pub struct WithdrawalApi<B> {
    db: B,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<B: Debug> Debug for WithdrawalApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawalApi ({:?})", self.db)
    }
}

impl<B> WithdrawalApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, clock: Arc::new(DefaultClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }
}

impl<B> WithdrawalApi<B>
where B: LedgerDatabase + AccountManagement
{
    /// Withdraws `amount` from the user's balance against `reference`.
    ///
    /// The reference must pass the Luhn check, but need not match any order. Requests that exceed the current balance
    /// are refused up front. The debit itself is guarded again in the database, so a concurrent withdrawal that
    /// drains the balance in between is also reported as [`WithdrawalError::InsufficientFunds`].
    pub async fn withdraw(&self, user_id: i64, reference: &str, amount: Amount) -> Result<Withdrawal, WithdrawalError> {
        let reference = reference.parse::<OrderNumber>()?;
        if !amount.is_positive() {
            return Err(WithdrawalError::InvalidAmount(amount));
        }
        let account = self
            .db
            .fetch_user_account(user_id)
            .await
            .map_err(|e| WithdrawalError::DatabaseError(e.to_string()))?
            .ok_or(WithdrawalError::UserNotFound(user_id))?;
        if amount > account.current_balance {
            debug!("💸️ User #{user_id} asked for {amount} but has {}", account.current_balance);
            return Err(WithdrawalError::InsufficientFunds { requested: amount, available: account.current_balance });
        }
        let withdrawal = NewWithdrawal { user_id, reference, amount, processed_at: self.clock.utc() };
        let withdrawal = self.db.debit_for_withdrawal(withdrawal).await?;
        info!("💸️ User #{user_id} withdrew {amount} against [{}]", withdrawal.reference);
        Ok(withdrawal)
    }
}
