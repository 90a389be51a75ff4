use chrono::{DateTime, Utc};
use lpg_common::Amount;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, NewWithdrawal, Order, OrderNumber, OrderStatusType, Withdrawal},
    traits::data_objects::InsertOrderResult,
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A record with the same unique key already exists. {0}")]
    UniqueViolation(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { requested: Amount, available: Amount },
    #[error("Orders cannot be moved to {0} with this operation")]
    IllegalTransition(OrderStatusType),
    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                LedgerError::UniqueViolation(db_err.message().to_string())
            },
            e => LedgerError::DatabaseError(e.to_string()),
        }
    }
}

/// This trait defines the highest level of behaviour for backends supporting the loyalty engine.
///
/// Every method that mutates state runs in its own transaction. None of them keep a transaction open across calls,
/// and none of them perform network I/O.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the order with the given number, regardless of who owns it.
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError>;

    /// Inserts a new order with status `NEW`.
    ///
    /// The uniqueness of the order number is the final arbiter of ownership. If another insert for the same number
    /// won a race, the existing row is returned as [`InsertOrderResult::AlreadyExists`] rather than an error.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, LedgerError>;

    /// Fetches every order in the given status, oldest submission first.
    async fn fetch_orders_by_status(&self, status: OrderStatusType) -> Result<Vec<Order>, LedgerError>;

    /// Moves an order to a non-crediting status (`PROCESSING` or `INVALID`).
    ///
    /// The update only applies if the current status may legally transition to `status`. Returns the updated order,
    /// or `None` if the order was not in a state that allowed the transition (e.g. it is already terminal, or already
    /// in `status`). Asking for `PROCESSED` or `NEW` is an [`LedgerError::IllegalTransition`]; use
    /// [`Self::credit_processed_order`] to complete an order.
    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, LedgerError>;

    /// Marks the order as `PROCESSED` with the given accrual and credits the owner's balance by the same amount, in a
    /// single transaction.
    ///
    /// The status change is guarded on the order still being `NEW` or `PROCESSING`. If it is already terminal, nothing
    /// changes and `None` is returned, so a repeated resolver answer can never credit twice.
    async fn credit_processed_order(
        &self,
        number: &OrderNumber,
        accrual: Amount,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, LedgerError>;

    /// Debits the user's balance and records the withdrawal in a single transaction.
    ///
    /// The balance check and the decrement are the same statement, so concurrent withdrawals cannot overdraw the
    /// account. Fails with [`LedgerError::InsufficientFunds`] and changes nothing if the balance is too low.
    async fn debit_for_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;
}
