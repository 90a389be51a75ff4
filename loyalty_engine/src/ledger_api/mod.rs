//! The public API of the loyalty engine.
//!
//! Each API wraps a backend that implements the relevant traits from [`crate::traits`] and adds the business rules
//! that sit on top of storage: order number validation, ownership decisions, mapping of accrual resolver answers onto
//! the order lifecycle, and withdrawal checks.
pub mod accounts_api;
pub mod auth_api;
pub mod errors;
pub mod order_flow_api;
pub mod withdrawal_api;
