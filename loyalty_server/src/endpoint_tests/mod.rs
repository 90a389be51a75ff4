mod auth;
mod balance;
mod mocks;
mod orders;
