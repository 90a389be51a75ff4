use lpg_common::Amount;
use thiserror::Error;

use crate::{
    db_types::{OrderNumber, OrderNumberError},
    traits::LedgerError,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),
    #[error("Order {0} has already been submitted by another user")]
    OwnedByAnotherUser(OrderNumber),
    #[error("The accrual report for {0} is not usable. {1}")]
    InvalidAccrualReport(OrderNumber, String),
    #[error("Ledger error. {0}")]
    LedgerError(#[from] LedgerError),
}

#[derive(Debug, Clone, Error)]
pub enum WithdrawalError {
    #[error("Invalid withdrawal reference. {0}")]
    InvalidReference(#[from] OrderNumberError),
    #[error("Withdrawal amounts must be positive, but got {0}")]
    InvalidAmount(Amount),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { requested: Amount, available: Amount },
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<LedgerError> for WithdrawalError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds { requested, available } => Self::InsufficientFunds { requested, available },
            LedgerError::UserNotFound(id) => Self::UserNotFound(id),
            LedgerError::InvalidAmount(a) => Self::InvalidAmount(a),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
