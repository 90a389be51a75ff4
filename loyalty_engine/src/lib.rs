//! Loyalty Engine
//!
//! The loyalty engine credits users with loyalty points for the orders they submit, by asking an external accrual
//! resolver how much each order earned, and maintains a balance ledger that users can spend from.
//!
//! The library is divided into these main sections:
//! 1. Database management and control ([`mod@traits`] and, for the SQLite backend, [`SqliteDatabase`]). You should
//!    never need to access the database directly. Instead, use the public API provided by the engine. The exception
//!    is the data types used in the database. These are defined in the [`mod@db_types`] module and are public.
//! 2. The engine's public API ([`OrderFlowApi`], [`WithdrawalApi`], [`AccountApi`], [`AuthApi`]). This is where order
//!    submission, the order lifecycle and withdrawals are decided.
//! 3. The accrual resolver client ([`mod@accrual`]) and the [`AccrualReconciler`], which together move pending orders
//!    towards a terminal state. The reconciler is meant to be run periodically by a single background task.
//!
//! ## Guarantees
//! * An order number belongs to whoever submitted it first.
//! * An order's accrual is credited to its owner at most once, in the same transaction as its move to `PROCESSED`.
//! * A balance never goes negative. Withdrawals are checked and debited in one guarded statement.
pub mod accrual;
pub mod db_types;
pub mod helpers;
mod ledger_api;
pub mod reconciler;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ledger_api::{
    accounts_api::AccountApi,
    auth_api::{hash_password, verify_password, AuthApi, AuthenticatedUser},
    errors::{OrderFlowError, WithdrawalError},
    order_flow_api::{AccrualOutcome, OrderFlowApi, SubmitOrderResult},
    withdrawal_api::WithdrawalApi,
};
pub use reconciler::{AccrualReconciler, TickSummary};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{AccountApiError, AccountManagement, AuthApiError, AuthManagement, LedgerDatabase, LedgerError};
