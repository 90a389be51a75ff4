//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the loyalty engine database *backends*.
//!
//! ## Traits
//! * [`LedgerDatabase`] owns every mutation of orders and balances: order submission, status transitions, and the two
//!   atomic ledger operations (crediting a processed order, debiting a withdrawal). Each method is a single
//!   transaction in the backend.
//! * [`AccountManagement`] provides read-only queries for balances, orders and withdrawals.
//! * [`AuthManagement`] creates users and looks up their credentials.
//!
//! Backends classify driver failures (e.g. uniqueness violations) into the error enums defined here, so that callers
//! never have to inspect vendor error codes.
mod account_management;
mod auth_management;
mod data_objects;
mod ledger_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use auth_management::{AuthApiError, AuthManagement};
pub use data_objects::InsertOrderResult;
pub use ledger_database::{LedgerDatabase, LedgerError};
