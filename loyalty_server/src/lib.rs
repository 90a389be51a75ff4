//! # Loyalty points gateway server
//! This crate hosts the HTTP front end of the loyalty points gateway and the background worker that reconciles orders
//! with the accrual resolver. It is responsible for:
//! * Registering users and issuing session tokens.
//! * Accepting order numbers from authenticated users and listing their orders.
//! * Reporting balances, and accepting and listing withdrawals.
//! * Periodically asking the accrual resolver about pending orders and crediting users for processed ones.
//!
//! ## Configuration
//! The server is configured via environment variables, which can be overridden on the command line. See
//! [config](config/index.html) and [cli](cli/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/register`, `/api/user/login`: Account creation and login.
//! * `/api/user/orders`: Submit (POST) and list (GET) orders.
//! * `/api/user/balance`: The current balance and the total withdrawn.
//! * `/api/user/balance/withdraw`: Spend points. Also served at `/api/user/withdraw`.
//! * `/api/user/withdrawals`: List withdrawals.
pub mod accrual_worker;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
