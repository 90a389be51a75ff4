//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use lpg_common::Amount;
use sqlx::{migrate::Migrator, SqlitePool};

use super::db::{auth, db_url, new_pool, orders, user_accounts, withdrawals};
use crate::{
    db_types::{
        NewOrder,
        NewUser,
        NewWithdrawal,
        Order,
        OrderNumber,
        OrderStatusType,
        UserAccount,
        UserCredentials,
        Withdrawal,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        AuthApiError,
        AuthManagement,
        InsertOrderResult,
        LedgerDatabase,
        LedgerError,
    },
};

static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_orders_by_status(&self, status: OrderStatusType) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_by_status(status, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, LedgerError> {
        if matches!(status, OrderStatusType::New | OrderStatusType::Processed) {
            return Err(LedgerError::IllegalTransition(status));
        }
        let from = OrderStatusType::predecessors(status);
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_status_from(number, &from, status, at, &mut tx).await?;
        if updated.is_none() {
            let existing = orders::fetch_order_by_number(number, &mut tx).await?;
            match existing {
                None => return Err(LedgerError::OrderNotFound(number.clone())),
                Some(o) => trace!("🗃️ Order [{number}] is {} and cannot move to {status}. No change", o.status),
            }
        }
        tx.commit().await?;
        Ok(updated)
    }

    /// Completes an order and credits its owner, in a single atomic transaction:
    /// * the order is moved to `PROCESSED` and its accrual recorded, but only if it is still `NEW` or `PROCESSING`;
    /// * the owner's balance is incremented by the accrual.
    ///
    /// If the order was already terminal, the transaction is rolled back and `None` is returned.
    async fn credit_processed_order(
        &self,
        number: &OrderNumber,
        accrual: Amount,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, LedgerError> {
        if accrual.is_negative() {
            return Err(LedgerError::InvalidAmount(accrual));
        }
        let mut tx = self.pool.begin().await?;
        let order = match orders::mark_processed(number, accrual, at, &mut tx).await? {
            Some(order) => order,
            None => {
                let existing = orders::fetch_order_by_number(number, &mut tx).await?;
                tx.rollback().await?;
                return match existing {
                    None => Err(LedgerError::OrderNotFound(number.clone())),
                    Some(o) => {
                        debug!("🗃️ Order [{number}] is already {}. It will not be credited again", o.status);
                        Ok(None)
                    },
                };
            },
        };
        if !user_accounts::credit_balance(order.user_id, accrual, at, &mut tx).await? {
            tx.rollback().await?;
            return Err(LedgerError::UserNotFound(order.user_id));
        }
        tx.commit().await?;
        debug!("🗃️ Order [{number}] is PROCESSED. User #{} has been credited {accrual}", order.user_id);
        Ok(Some(order))
    }

    /// Debits the user and records the withdrawal, in a single atomic transaction.
    async fn debit_for_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let amount = withdrawal.amount;
        let user_id = withdrawal.user_id;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut tx = self.pool.begin().await?;
        if !user_accounts::debit_balance(user_id, amount, withdrawal.processed_at, &mut tx).await? {
            let account = user_accounts::user_account_by_id(user_id, &mut tx).await?;
            tx.rollback().await?;
            return match account {
                None => Err(LedgerError::UserNotFound(user_id)),
                Some(acc) => {
                    debug!("🗃️ User #{user_id} cannot withdraw {amount}. Balance is {}", acc.current_balance);
                    Err(LedgerError::InsufficientFunds { requested: amount, available: acc.current_balance })
                },
            };
        }
        let withdrawal = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
        tx.commit().await?;
        Ok(withdrawal)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = user_accounts::user_account_by_id(user_id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<UserAccount, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        let account = auth::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn fetch_credentials(&self, login: &str) -> Result<Option<UserCredentials>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let creds = auth::credentials_for_login(login, &mut conn).await?;
        Ok(creds)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `LPG_DATABASE_URL`, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
